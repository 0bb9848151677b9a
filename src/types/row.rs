use std::str::FromStr;
use std::sync::Arc;

use crate::error::{DbalError, Result};

/// Driver-agnostic raw result from a statement.
/// All values are converted to text by the connection; `None` is SQL NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawQueryResult {
    /// Column names in order
    pub columns: Vec<String>,
    /// Rows, where each row is a vector of values in column order
    pub rows: Vec<Vec<Option<String>>>,
    /// Rows changed by an INSERT/UPDATE/DELETE
    pub rows_affected: u64,
    /// Auto-generated id reported by the connection (MySQL family)
    pub last_insert_id: Option<u64>,
}

impl RawQueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self {
            columns,
            rows,
            rows_affected: 0,
            last_insert_id: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Result of a statement that returns no rows.
    pub fn affected(rows_affected: u64, last_insert_id: Option<u64>) -> Self {
        Self {
            rows_affected,
            last_insert_id,
            ..Self::default()
        }
    }
}

/// A single immutable record.
/// Values are accessed by column name in the order the database returned them.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Option<String>>,
}

impl Row {
    pub(crate) fn new(columns: Arc<[String]>, values: Vec<Option<String>>) -> Self {
        Self { columns, values }
    }

    fn index_of(&self, column: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| DbalError::ColumnNotFound(column.to_string()))
    }

    /// Gets a value by column name. `Ok(None)` means the value is NULL.
    pub fn get(&self, column: &str) -> Result<Option<&str>> {
        let index = self.index_of(column)?;
        Ok(self.values.get(index).and_then(|v| v.as_deref()))
    }

    /// Gets a value by column name and parses it.
    pub fn get_as<T: FromStr>(&self, column: &str) -> Result<Option<T>> {
        match self.get(column)? {
            None => Ok(None),
            Some(raw) => raw
                .parse::<T>()
                .map(Some)
                .map_err(|_| DbalError::InvalidValue {
                    column: column.to_string(),
                    value: raw.to_string(),
                }),
        }
    }

    /// Returns true if the column holds NULL.
    pub fn is_null(&self, column: &str) -> Result<bool> {
        Ok(self.get(column)?.is_none())
    }

    /// Returns all column names in this row.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the number of columns in this row.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this row has no columns.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result cursor of a query execution, containing zero or more rows.
///
/// The cursor is finite and can only be restarted by running the query again.
#[derive(Debug, Clone)]
pub struct QueryResult {
    columns: Arc<[String]>,
    rows: Vec<Row>,
    rows_affected: u64,
    last_insert_id: Option<u64>,
}

impl QueryResult {
    /// Creates a QueryResult from a RawQueryResult.
    pub fn from_raw(raw: RawQueryResult) -> Self {
        let columns: Arc<[String]> = raw.columns.into();
        let rows = raw
            .rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&columns), values))
            .collect();
        Self {
            columns,
            rows,
            rows_affected: raw.rows_affected,
            last_insert_id: raw.last_insert_id,
        }
    }

    /// Returns the first record, if any.
    pub fn row(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Returns all records. Empty when nothing matched.
    pub fn result(self) -> Vec<Row> {
        self.rows
    }

    /// Extracts a single row from the result.
    /// Returns an error if the result contains zero or more than one row.
    pub fn single_row(self) -> Result<Row> {
        let actual = self.rows.len();
        match <[Row; 1]>::try_from(self.rows) {
            Ok([row]) => Ok(row),
            Err(_) => Err(DbalError::UnexpectedRowCount {
                expected: 1,
                actual,
            }),
        }
    }

    /// Iterates over the records without consuming the result.
    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Returns the column names from this result.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows changed by the statement.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    /// Auto-generated id reported by the connection, if the backend tracks one.
    pub fn last_insert_id(&self) -> Option<u64> {
        self.last_insert_id
    }

    /// Returns the number of rows in this result.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if this result contains no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl IntoIterator for QueryResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
