use std::sync::Arc;

use super::template::SqlTemplate;
use super::where_clause::{build_where, Conjunction, WhereClause};
use crate::dialect::Dialect;
use crate::driver::Driver;
use crate::error::{DbalError, Result};
use crate::types::{IntoBinds, QueryResult, SqlValue};

/// Join flavour for [`QueryBuilder::join`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    LeftOuter,
    RightOuter,
}

impl JoinKind {
    pub fn as_sql(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::LeftOuter => "LEFT OUTER",
            JoinKind::RightOuter => "RIGHT OUTER",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryKind {
    Select,
    Insert,
    Update,
    Delete,
    Custom,
}

#[derive(Debug, Clone)]
struct Join {
    table: String,
    predicate: String,
    kind: JoinKind,
}

/// Everything accumulated for one statement.
#[derive(Debug, Clone, Default)]
struct QueryState {
    kind: Option<QueryKind>,
    tables: Vec<String>,
    columns: Vec<String>,
    joins: Vec<Join>,
    wheres: Vec<WhereClause>,
    order_by: Vec<String>,
    limit: Option<u64>,
    offset: Option<u64>,
    data: Vec<(String, SqlValue)>,
    returning: Option<String>,
    custom_sql: String,
    custom_binds: Vec<SqlValue>,
}

impl QueryState {
    fn set_data<I, K, V>(&mut self, data: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        self.data.clear();
        for (column, value) in data {
            let column = column.into();
            let value = value.into();
            match self.data.iter_mut().find(|(c, _)| *c == column) {
                Some(slot) => slot.1 = value,
                None => self.data.push((column, value)),
            }
        }
    }

    fn table(&self) -> Result<&str> {
        match self.tables.first() {
            Some(table) if !table.is_empty() => Ok(table.as_str()),
            _ => Err(DbalError::MissingTable),
        }
    }

    fn assemble(&self, dialect: &dyn Dialect) -> Result<(SqlTemplate, Vec<SqlValue>)> {
        let kind = self.kind.ok_or(DbalError::EmptyQuery)?;
        let mut template = SqlTemplate::new();
        let mut binds = Vec::new();

        match kind {
            QueryKind::Select => {
                if self.tables.is_empty() {
                    return Err(DbalError::MissingTable);
                }
                template.push_text("SELECT ");
                if self.columns.is_empty() {
                    template.push_text("*");
                } else {
                    template.push_sql(&self.columns.join(","));
                }
                template
                    .push_text(" FROM ")
                    .push_sql(&self.tables.join(","));
                for join in &self.joins {
                    template
                        .push_text(" ")
                        .push_text(join.kind.as_sql())
                        .push_text(" JOIN ")
                        .push_sql(&join.table)
                        .push_text(" ON ")
                        .push_sql(&join.predicate);
                }
                build_where(&self.wheres, &mut template, &mut binds);
                if !self.order_by.is_empty() {
                    template
                        .push_text(" ORDER BY ")
                        .push_sql(&self.order_by.join(", "));
                }
                template.push_text(&dialect.limit_clause(self.limit, self.offset));
            }
            QueryKind::Insert => {
                let table = self.table()?;
                if self.data.is_empty() {
                    return Err(DbalError::EmptyQuery);
                }
                let columns: Vec<&str> = self.data.iter().map(|(c, _)| c.as_str()).collect();
                template
                    .push_text("INSERT INTO ")
                    .push_sql(table)
                    .push_text(" (")
                    .push_sql(&columns.join(","))
                    .push_text(") VALUES (")
                    .push_markers(self.data.len(), ",")
                    .push_text(")");
                if let Some(clause) = self
                    .returning
                    .as_deref()
                    .and_then(|id| dialect.returning_clause(id))
                {
                    template.push_sql(&clause);
                }
                binds.extend(self.data.iter().map(|(_, v)| v.clone()));
            }
            QueryKind::Update => {
                let table = self.table()?;
                if self.data.is_empty() {
                    return Err(DbalError::EmptyQuery);
                }
                template
                    .push_text("UPDATE ")
                    .push_sql(table)
                    .push_text(" SET ");
                for (i, (column, value)) in self.data.iter().enumerate() {
                    if i > 0 {
                        template.push_text(",");
                    }
                    template.push_sql(column).push_text(" = ").push_marker();
                    binds.push(value.clone());
                }
                build_where(&self.wheres, &mut template, &mut binds);
            }
            QueryKind::Delete => {
                let table = self.table()?;
                template.push_text("DELETE FROM ").push_sql(table);
                build_where(&self.wheres, &mut template, &mut binds);
            }
            QueryKind::Custom => {
                if self.custom_sql.trim().is_empty() {
                    return Err(DbalError::EmptyQuery);
                }
                template.push_sql(&self.custom_sql);
                binds.extend(self.custom_binds.iter().cloned());
            }
        }

        Ok((template, binds))
    }
}

/// Fluent builder for a single SQL statement.
///
/// A builder describes one query at a time: [`compile`](Self::compile) and
/// [`run`](Self::run) consume the accumulated state, so the next query must
/// start again with `select`, `insert`, `update`, `delete` or `custom`.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use dbal::builders::QueryBuilder;
/// use dbal::dialect::MySqlDialect;
///
/// let mut query = QueryBuilder::new(Arc::new(MySqlDialect::new()));
/// let sql = query
///     .select(["id", "name"])
///     .from(["users"])
///     .where_("age > ?", 18)
///     .limit(10)
///     .compile()
///     .unwrap();
/// assert_eq!(sql, "SELECT id,name FROM users WHERE (age > 18) LIMIT 10");
/// ```
#[derive(Clone)]
pub struct QueryBuilder {
    dialect: Arc<dyn Dialect>,
    driver: Option<Driver>,
    state: QueryState,
}

impl QueryBuilder {
    /// A detached builder; it can compile but not run.
    pub fn new(dialect: Arc<dyn Dialect>) -> Self {
        Self {
            dialect,
            driver: None,
            state: QueryState::default(),
        }
    }

    /// A builder that runs its queries on `driver`.
    pub fn for_driver(driver: Driver) -> Self {
        Self {
            dialect: driver.dialect_handle(),
            driver: Some(driver),
            state: QueryState::default(),
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    /// Starts a SELECT. No columns selects `*`.
    pub fn select<I>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.state.kind = Some(QueryKind::Select);
        self.state
            .columns
            .extend(columns.into_iter().map(Into::into));
        self
    }

    pub fn from<I>(&mut self, tables: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.state.tables.extend(tables.into_iter().map(Into::into));
        self
    }

    pub fn join(
        &mut self,
        table: impl Into<String>,
        predicate: impl Into<String>,
        kind: JoinKind,
    ) -> &mut Self {
        self.state.joins.push(Join {
            table: table.into(),
            predicate: predicate.into(),
            kind,
        });
        self
    }

    /// Adds a condition joined to the previous ones with AND.
    pub fn where_(&mut self, expr: &str, binds: impl IntoBinds) -> &mut Self {
        self.where_op(expr, binds, Conjunction::And)
    }

    /// Adds a condition joined to the previous ones with OR.
    pub fn or_where(&mut self, expr: &str, binds: impl IntoBinds) -> &mut Self {
        self.where_op(expr, binds, Conjunction::Or)
    }

    pub fn where_op(
        &mut self,
        expr: &str,
        binds: impl IntoBinds,
        conjunction: Conjunction,
    ) -> &mut Self {
        self.state
            .wheres
            .push(WhereClause::new(expr, binds.into_binds(), conjunction));
        self
    }

    /// Adds `expr IN (...)` with one placeholder per value.
    pub fn where_in(&mut self, expr: &str, values: impl IntoBinds) -> &mut Self {
        self.where_in_op(expr, values, Conjunction::And)
    }

    pub fn or_where_in(&mut self, expr: &str, values: impl IntoBinds) -> &mut Self {
        self.where_in_op(expr, values, Conjunction::Or)
    }

    pub fn where_in_op(
        &mut self,
        expr: &str,
        values: impl IntoBinds,
        conjunction: Conjunction,
    ) -> &mut Self {
        self.state
            .wheres
            .push(WhereClause::in_list(expr, values.into_binds(), conjunction));
        self
    }

    pub fn order_by<I>(&mut self, fields: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.state
            .order_by
            .extend(fields.into_iter().map(Into::into));
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.state.limit = Some(limit);
        self
    }

    /// Rows to skip. Only used together with [`limit`](Self::limit).
    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.state.offset = Some(offset);
        self
    }

    /// Starts an INSERT. Column order follows `data`; a repeated column keeps
    /// its first position and its last value.
    pub fn insert<I, K, V>(&mut self, table: impl Into<String>, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        self.state.kind = Some(QueryKind::Insert);
        self.state.tables = vec![table.into()];
        self.state.set_data(data);
        self
    }

    /// Asks the dialect to hand back `id_column` from an INSERT.
    pub fn returning(&mut self, id_column: impl Into<String>) -> &mut Self {
        self.state.returning = Some(id_column.into());
        self
    }

    pub fn update<I, K, V>(&mut self, table: impl Into<String>, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<SqlValue>,
    {
        self.state.kind = Some(QueryKind::Update);
        self.state.tables = vec![table.into()];
        self.state.set_data(data);
        self
    }

    pub fn delete(&mut self, table: impl Into<String>) -> &mut Self {
        self.state.kind = Some(QueryKind::Delete);
        self.state.tables = vec![table.into()];
        self
    }

    /// A hand-written statement with its own binds.
    pub fn custom(&mut self, sql: impl Into<String>, binds: impl IntoBinds) -> &mut Self {
        self.state.kind = Some(QueryKind::Custom);
        self.state.custom_sql = sql.into();
        self.state.custom_binds = binds.into_binds();
        self
    }

    /// The statement with placeholders left in place, and its binds in order.
    /// Does not reset the builder.
    pub fn build_sql(&self) -> Result<(String, Vec<SqlValue>)> {
        let (template, binds) = self.state.assemble(self.dialect.as_ref())?;
        Ok((template.sql(), binds))
    }

    /// Compiles the statement and substitutes every bind.
    ///
    /// The accumulated state is cleared whether or not compilation succeeds.
    pub fn compile(&mut self) -> Result<String> {
        let state = std::mem::take(&mut self.state);
        let (template, binds) = state.assemble(self.dialect.as_ref())?;
        template.render(&binds, self.dialect.as_ref())
    }

    /// Compiles the statement and executes it on the attached driver.
    ///
    /// The accumulated state is consumed even when no driver is attached.
    pub async fn run(&mut self) -> Result<QueryResult> {
        let sql = self.compile()?;
        let driver = self.driver.as_ref().ok_or(DbalError::NoDriver)?;
        driver.execute(&sql).await
    }

    pub fn escape(&self, value: &SqlValue) -> String {
        self.dialect.escape(value)
    }

    pub fn escape_string(&self, value: &str, like: bool) -> String {
        self.dialect.escape_string(value, like)
    }
}

impl std::fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("dialect", &self.dialect.name())
            .field("attached", &self.driver.is_some())
            .field("state", &self.state)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};

    fn mysql() -> QueryBuilder {
        QueryBuilder::new(Arc::new(MySqlDialect::new()))
    }

    fn postgres() -> QueryBuilder {
        QueryBuilder::new(Arc::new(PostgresDialect::new()))
    }

    #[test]
    fn test_insert_column_value_alignment() {
        let mut query = mysql();
        query.insert("t", [("a", SqlValue::Int(1)), ("b", SqlValue::from("x"))]);

        let (sql, binds) = query.build_sql().unwrap();
        assert_eq!(sql, "INSERT INTO t (a,b) VALUES (?,?)");
        assert_eq!(binds, vec![SqlValue::Int(1), SqlValue::from("x")]);
        assert_eq!(query.compile().unwrap(), "INSERT INTO t (a,b) VALUES (1,'x')");
    }

    #[test]
    fn test_insert_repeated_column_keeps_position() {
        let mut query = mysql();
        query.insert("t", [("a", 1), ("b", 2), ("a", 3)]);
        assert_eq!(query.compile().unwrap(), "INSERT INTO t (a,b) VALUES (3,2)");
    }

    #[test]
    fn test_insert_returning_only_on_postgres() {
        let mut pg = postgres();
        pg.insert("t", [("a", 1)]).returning("id");
        assert_eq!(pg.compile().unwrap(), "INSERT INTO t (a) VALUES (1) RETURNING id");

        let mut my = mysql();
        my.insert("t", [("a", 1)]).returning("id");
        assert_eq!(my.compile().unwrap(), "INSERT INTO t (a) VALUES (1)");
    }

    #[test]
    fn test_update_binds_precede_where_binds() {
        let mut query = mysql();
        query.update("t", [("a", 1)]).where_("id = ?", 5);

        let (sql, binds) = query.build_sql().unwrap();
        assert_eq!(sql, "UPDATE t SET a = ? WHERE (id = ?)");
        assert_eq!(binds, vec![SqlValue::Int(1), SqlValue::Int(5)]);
        assert_eq!(query.compile().unwrap(), "UPDATE t SET a = 1 WHERE (id = 5)");
    }

    #[test]
    fn test_where_chaining() {
        let mut query = mysql();
        query
            .select(Vec::<String>::new())
            .from(["t"])
            .where_("a=?", 1)
            .or_where("b=?", 2);

        let (sql, binds) = query.build_sql().unwrap();
        assert_eq!(sql, "SELECT * FROM t WHERE (a=?) OR (b=?)");
        assert_eq!(binds, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn test_compile_resets_state() {
        let mut query = mysql();
        query.select(["id"]).from(["t"]);
        query.compile().unwrap();
        assert!(matches!(query.compile(), Err(DbalError::EmptyQuery)));
    }

    #[test]
    fn test_failed_compile_also_resets() {
        let mut query = mysql();
        query.select(["id"]).from(["t"]).where_("a = ? AND b = ?", 1);
        assert!(matches!(
            query.compile(),
            Err(DbalError::PlaceholderMismatch {
                markers: 2,
                binds: 1
            })
        ));
        assert!(matches!(query.compile(), Err(DbalError::EmptyQuery)));
    }

    #[test]
    fn test_empty_query() {
        assert!(matches!(mysql().compile(), Err(DbalError::EmptyQuery)));

        let mut query = mysql();
        query.custom("   ", ());
        assert!(matches!(query.compile(), Err(DbalError::EmptyQuery)));
    }

    #[test]
    fn test_select_without_from() {
        let mut query = mysql();
        query.select(["1"]);
        assert!(matches!(query.compile(), Err(DbalError::MissingTable)));
    }

    #[test]
    fn test_full_select() {
        let mut query = postgres();
        query
            .select(["u.id", "u.name", "c.name AS city"])
            .from(["users u"])
            .join("cities c", "c.id = u.city_id", JoinKind::Left)
            .where_("u.active = ?", true)
            .where_in("u.role", ["admin", "editor"])
            .order_by(["u.name", "u.id DESC"])
            .limit(20)
            .offset(40);

        assert_eq!(
            query.compile().unwrap(),
            "SELECT u.id,u.name,c.name AS city FROM users u \
             LEFT JOIN cities c ON c.id = u.city_id \
             WHERE (u.active = TRUE) AND (u.role IN ('admin','editor')) \
             ORDER BY u.name, u.id DESC LIMIT 20 OFFSET 40"
        );
    }

    #[test]
    fn test_mysql_limit_offset() {
        let mut query = mysql();
        query.select(["id"]).from(["t"]).limit(5).offset(10);
        assert_eq!(query.compile().unwrap(), "SELECT id FROM t LIMIT 10, 5");

        query.select(["id"]).from(["t"]).offset(10);
        assert_eq!(query.compile().unwrap(), "SELECT id FROM t");
    }

    #[test]
    fn test_multiple_tables() {
        let mut query = mysql();
        query.select(["a.x", "b.y"]).from(["a", "b"]);
        assert_eq!(query.compile().unwrap(), "SELECT a.x,b.y FROM a,b");
    }

    #[test]
    fn test_delete() {
        let mut query = postgres();
        query.delete("sessions").where_("expires < ?", 1000);
        assert_eq!(
            query.compile().unwrap(),
            "DELETE FROM sessions WHERE (expires < 1000)"
        );
    }

    #[test]
    fn test_custom_with_quoted_marker() {
        let mut query = mysql();
        query.custom("SELECT * FROM t WHERE name = 'a?b' AND id = ?", 5);
        assert_eq!(
            query.compile().unwrap(),
            "SELECT * FROM t WHERE name = 'a?b' AND id = 5"
        );
    }

    #[test]
    fn test_bound_value_cannot_inject() {
        let mut query = mysql();
        query
            .select(["id"])
            .from(["users"])
            .where_("name = ?", "x' OR '1'='1");
        assert_eq!(
            query.compile().unwrap(),
            "SELECT id FROM users WHERE (name = 'x'' OR ''1''=''1')"
        );
    }

    #[test]
    fn test_escape_helpers() {
        let query = postgres();
        assert_eq!(query.escape(&SqlValue::Null), "NULL");
        assert_eq!(query.escape(&SqlValue::Bool(true)), "TRUE");
        assert_eq!(query.escape_string("50%_it's", true), "50!%!_it''s");
        assert_eq!(mysql().escape(&SqlValue::Bool(true)), "1");
    }

    #[tokio::test]
    async fn test_run_without_driver() {
        let mut query = mysql();
        query.select(["id"]).from(["t"]);
        assert!(matches!(query.run().await, Err(DbalError::NoDriver)));
        assert!(matches!(query.compile(), Err(DbalError::EmptyQuery)));
    }

    #[test]
    fn test_mysql_backslash_cannot_inject() {
        let mut query = mysql();
        query
            .select(["id"])
            .from(["users"])
            .where_("name = ?", r"\' OR 1=1 -- ");
        assert_eq!(
            query.compile().unwrap(),
            r"SELECT id FROM users WHERE (name = '\\'' OR 1=1 -- ')"
        );
    }

    #[test]
    fn test_where_in_flattens_list_bind() {
        let mut query = postgres();
        query
            .select(["id"])
            .from(["t"])
            .where_in("id", SqlValue::from(vec![1_i64, 2]));
        assert_eq!(query.compile().unwrap(), "SELECT id FROM t WHERE (id IN (1,2))");
    }
}
