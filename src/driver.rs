use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::builders::QueryBuilder;
use crate::config::{ConnectionConfig, DriverKind};
use crate::dialect::{Dialect, InsertIdStrategy, MySqlDialect, PostgresDialect};
use crate::drivers::{MySqlConnection, PostgresConnection};
use crate::error::{DbalError, Result};
use crate::schema::{IndexKind, TableDescriptor};
use crate::traits::Connection;
use crate::types::{IntoBinds, QueryResult, SqlValue};

/// Handle to one database connection plus the dialect used to talk to it.
///
/// Cloning is cheap; clones share the same connection. The connection is
/// opened lazily by the first statement.
#[derive(Clone)]
pub struct Driver {
    connection: Arc<dyn Connection>,
    dialect: Arc<dyn Dialect>,
    table_prefix: Option<String>,
}

impl Driver {
    pub fn new(connection: Arc<dyn Connection>, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            connection,
            dialect,
            table_prefix: None,
        }
    }

    /// Sets the schema (or database) name used by [`table_name`](Self::table_name).
    pub fn with_table_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.table_prefix = (!prefix.is_empty()).then_some(prefix);
        self
    }

    /// An unconnected Postgres driver.
    pub fn postgres(config: &ConnectionConfig) -> Self {
        Self::new(
            Arc::new(PostgresConnection::from_config(config)),
            Arc::new(PostgresDialect::new()),
        )
    }

    /// An unconnected MySQL driver.
    pub fn mysql(config: &ConnectionConfig) -> Self {
        Self::new(
            Arc::new(MySqlConnection::from_config(config)),
            Arc::new(MySqlDialect::new()),
        )
    }

    /// An unconnected driver of the configured kind, with its table prefix.
    pub fn from_config(config: &ConnectionConfig) -> Self {
        let driver = match config.driver {
            DriverKind::Mysql => Self::mysql(config),
            DriverKind::Postgres => Self::postgres(config),
        };
        match config.table_prefix.as_deref() {
            Some(prefix) => driver.with_table_prefix(prefix),
            None => driver,
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub(crate) fn dialect_handle(&self) -> Arc<dyn Dialect> {
        Arc::clone(&self.dialect)
    }

    /// Opens the connection if it is not open yet.
    pub async fn connect(&self) -> Result<()> {
        self.connection.connect().await
    }

    /// Closes the connection; returns whether a live one was closed.
    pub async fn disconnect(&self) -> bool {
        self.connection.disconnect().await
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Qualifies `table` with the table prefix, if any.
    pub fn table_name(&self, table: &str) -> String {
        match &self.table_prefix {
            Some(prefix) => format!("{prefix}.{table}"),
            None => table.to_string(),
        }
    }

    /// A fresh query builder bound to this driver.
    pub fn builder(&self) -> QueryBuilder {
        QueryBuilder::for_driver(self.clone())
    }

    pub fn select<I>(&self, columns: I) -> QueryBuilder
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut builder = self.builder();
        builder.select(columns);
        builder
    }

    pub fn update<I, K, V>(&self, table: impl Into<String>, data: I) -> QueryBuilder
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        let mut builder = self.builder();
        builder.update(table, data);
        builder
    }

    pub fn delete(&self, table: impl Into<String>) -> QueryBuilder {
        let mut builder = self.builder();
        builder.delete(table);
        builder
    }

    /// Executes `sql`.
    ///
    /// With binds, the statement goes through placeholder substitution. Without
    /// binds the text is sent as is, so it must not contain untrusted data.
    pub async fn query(&self, sql: &str, binds: impl IntoBinds) -> Result<QueryResult> {
        let binds = binds.into_binds();
        if binds.is_empty() {
            return self.execute(sql).await;
        }
        self.builder().custom(sql, binds).run().await
    }

    /// Sends finished SQL text, connecting first when needed.
    pub(crate) async fn execute(&self, sql: &str) -> Result<QueryResult> {
        if !self.connection.is_connected() {
            self.connection.connect().await?;
        }
        debug!(dialect = self.dialect.name(), sql = %sql, "executing statement");
        let raw = self.connection.execute(sql).await?;
        Ok(QueryResult::from_raw(raw))
    }

    /// Inserts one row and returns the generated value of `id_column`.
    ///
    /// MySQL reports the id through the connection; Postgres reads it back
    /// with RETURNING, so `id_column` must be given there.
    pub async fn insert<I, K, V>(&self, table: &str, data: I, id_column: &str) -> Result<String>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        let mut builder = self.builder();
        builder.insert(table, data);

        match self.dialect.insert_id_strategy() {
            InsertIdStrategy::LastInsertId => {
                let result = builder.run().await?;
                if result.rows_affected() == 0 {
                    return Err(DbalError::Insert(format!("no rows inserted into {table}")));
                }
                result
                    .last_insert_id()
                    .map(|id| id.to_string())
                    .ok_or_else(|| DbalError::Insert(format!("no id reported for {table}")))
            }
            InsertIdStrategy::Returning => {
                if id_column.is_empty() {
                    return Err(DbalError::Insert(format!(
                        "id column required to insert into {table}"
                    )));
                }
                let result = builder.returning(id_column).run().await?;
                let row = result
                    .row()
                    .ok_or_else(|| DbalError::Insert(format!("no rows inserted into {table}")))?;
                row.get(id_column)?
                    .map(str::to_string)
                    .ok_or_else(|| DbalError::Insert(format!("{id_column} is NULL in {table}")))
            }
        }
    }

    pub async fn create_table(&self, table: &str, description: &TableDescriptor) -> Result<QueryResult> {
        let sql = self.dialect.create_table_sql(table, description)?;
        self.execute(&sql).await
    }

    pub async fn drop_table(&self, table: &str) -> Result<QueryResult> {
        let sql = self.dialect.drop_table_sql(table)?;
        self.execute(&sql).await
    }

    pub async fn create_index<I>(&self, table: &str, fields: I, kind: IndexKind) -> Result<QueryResult>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        let sql = self.dialect.create_index_sql(table, &fields, kind)?;
        self.execute(&sql).await
    }

    // Nesting is not tracked; each call sends exactly one statement.

    pub async fn begin_transaction(&self) -> Result<()> {
        self.execute("BEGIN").await.map(|_| ())
    }

    pub async fn commit_transaction(&self) -> Result<()> {
        self.execute("COMMIT").await.map(|_| ())
    }

    pub async fn rollback_transaction(&self) -> Result<()> {
        self.execute("ROLLBACK").await.map(|_| ())
    }
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("dialect", &self.dialect.name())
            .field("connected", &self.is_connected())
            .field("table_prefix", &self.table_prefix)
            .finish()
    }
}
