//! Per-database SQL generation.
//!
//! A [`Dialect`] supplies the seams where MySQL and Postgres disagree: literal
//! forms, LIMIT/OFFSET syntax, how an inserted id comes back, and the mapping
//! of abstract field types to column definitions. Everything else (statement
//! assembly, table DDL layout) is shared through provided methods.

mod mysql;
mod postgres;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;

use crate::error::{DbalError, Result};
use crate::escape;
use crate::schema::{FieldDescriptor, ForeignKey, IndexKind, TableDescriptor};
use crate::types::SqlValue;

/// How a dialect reports the id generated by an INSERT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertIdStrategy {
    /// The connection tracks the last auto-generated id.
    LastInsertId,
    /// The statement must return the id column itself.
    Returning,
}

/// Trait for dialect-specific SQL generation.
pub trait Dialect: Send + Sync {
    /// Returns the dialect name.
    fn name(&self) -> &'static str;

    /// Boolean literal form.
    fn escape_bool(&self, value: bool) -> &'static str;

    /// Converts a bind value to SQL literal text.
    fn escape(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => "NULL".to_string(),
            SqlValue::Bool(b) => self.escape_bool(*b).to_string(),
            SqlValue::Int(i) => i.to_string(),
            SqlValue::UInt(u) => u.to_string(),
            SqlValue::Float(f) if f.is_nan() => self.quote_string("NaN"),
            SqlValue::Float(f) if f.is_infinite() => {
                self.quote_string(if *f > 0.0 { "Infinity" } else { "-Infinity" })
            }
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Text(s) => self.quote_string(s),
            SqlValue::List(items) => {
                let escaped: Vec<String> = items.iter().map(|v| self.escape(v)).collect();
                format!("({})", escaped.join(","))
            }
        }
    }

    /// Escapes string contents without quoting them.
    fn escape_string(&self, value: &str, like: bool) -> String {
        escape::escape_string(value, like)
    }

    /// Escapes and quotes a string as a literal.
    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", self.escape_string(value, false))
    }

    /// The trailing LIMIT/OFFSET clause, with a leading space, or an empty
    /// string when there is no limit. An offset alone is ignored.
    fn limit_clause(&self, limit: Option<u64>, offset: Option<u64>) -> String;

    /// Suffix appended to INSERT statements that must hand back `id_column`.
    fn returning_clause(&self, id_column: &str) -> Option<String>;

    fn insert_id_strategy(&self) -> InsertIdStrategy;

    /// Maps one abstract field to a column definition.
    fn field_definition(&self, name: &str, field: &FieldDescriptor) -> Result<String>;

    /// Builds a CREATE TABLE statement.
    ///
    /// Fails with [`DbalError::Schema`] when the table has no fields, declares
    /// more than one primary key, or carries an incomplete foreign key.
    fn create_table_sql(&self, table: &str, description: &TableDescriptor) -> Result<String> {
        if table.is_empty() {
            return Err(DbalError::Schema("table name not specified".to_string()));
        }
        if description.fields.is_empty() {
            return Err(DbalError::Schema(format!("no fields defined for table {table}")));
        }

        let field_keys = description
            .fields
            .iter()
            .filter(|(_, f)| f.primary_key)
            .count();
        let table_key = usize::from(!description.primary_key.is_empty());
        if field_keys + table_key > 1 {
            return Err(DbalError::Schema(format!(
                "table {table} declares more than one primary key"
            )));
        }

        let mut definitions = Vec::with_capacity(description.fields.len() + 1);
        for (name, field) in &description.fields {
            if field.field_type.name().trim().is_empty() {
                return Err(DbalError::Schema(format!("type of field {name} not specified")));
            }
            definitions.push(self.field_definition(name, field)?);
        }
        if !description.primary_key.is_empty() {
            definitions.push(format!(
                "PRIMARY KEY ({})",
                description.primary_key.join(",")
            ));
        }
        for columns in &description.unique_indexes {
            if columns.is_empty() {
                return Err(DbalError::Schema("unique index without columns".to_string()));
            }
            definitions.push(format!("UNIQUE ({})", columns.join(",")));
        }
        for foreign_key in &description.foreign_keys {
            definitions.push(self.foreign_key_sql(foreign_key)?);
        }

        let mut sql = format!("CREATE TABLE {table} ({})", definitions.join(", "));
        if let Some(options) = description.options.as_deref().filter(|o| !o.is_empty()) {
            sql.push(' ');
            sql.push_str(options);
        }
        Ok(sql)
    }

    /// Builds a FOREIGN KEY table constraint.
    fn foreign_key_sql(&self, foreign_key: &ForeignKey) -> Result<String> {
        if foreign_key.columns.is_empty() {
            return Err(DbalError::Schema(
                "columns of foreign key not specified".to_string(),
            ));
        }
        if foreign_key.ref_table.is_empty() {
            return Err(DbalError::Schema(
                "referenced table for foreign key not specified".to_string(),
            ));
        }
        if foreign_key.ref_columns.is_empty() {
            return Err(DbalError::Schema(
                "referenced columns for foreign key not specified".to_string(),
            ));
        }
        Ok(format!(
            "FOREIGN KEY ({}) REFERENCES {} ({}) ON UPDATE {} ON DELETE {}",
            foreign_key.columns.join(","),
            foreign_key.ref_table,
            foreign_key.ref_columns.join(","),
            foreign_key.on_update.as_sql(),
            foreign_key.on_delete.as_sql(),
        ))
    }

    fn drop_table_sql(&self, table: &str) -> Result<String> {
        if table.is_empty() {
            return Err(DbalError::Schema("table name not specified".to_string()));
        }
        Ok(format!("DROP TABLE {table} CASCADE"))
    }

    /// Builds a CREATE INDEX statement. The index is named after the table
    /// (dots replaced by underscores) followed by the field names.
    fn create_index_sql(&self, table: &str, fields: &[String], kind: IndexKind) -> Result<String> {
        if table.is_empty() {
            return Err(DbalError::Schema("table name not specified".to_string()));
        }
        if fields.is_empty() {
            return Err(DbalError::Schema(format!(
                "no fields given for index on {table}"
            )));
        }
        Ok(format!(
            "CREATE {} {}_{} ON {} ({})",
            kind.as_sql(),
            table.replace('.', "_"),
            fields.join("_"),
            table,
            fields.join(", ")
        ))
    }
}

/// Appends the key, NOT NULL and DEFAULT modifiers shared by every dialect.
pub(crate) fn push_constraints(definition: &mut String, field: &FieldDescriptor) {
    if field.primary_key {
        definition.push_str(" PRIMARY KEY");
    } else if field.unique {
        definition.push_str(" UNIQUE");
    }
    if field.not_null {
        definition.push_str(" NOT NULL");
    }
    if let Some(default) = field.default.as_deref().filter(|d| !d.is_empty()) {
        definition.push_str(" DEFAULT ");
        definition.push_str(default);
    }
}
