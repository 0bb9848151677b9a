use std::sync::Arc;

use dbal::drivers::{InMemoryTestConnection, InMemoryTestResponseBuilder};
use dbal::traits::Connection;
use dbal::{
    DbalError, Dialect, Driver, FieldDescriptor, FieldType, ForeignKey, ForeignKeyAction,
    IndexKind, MySqlDialect, PostgresDialect, TableDescriptor,
};

fn driver_with(connection: &Arc<InMemoryTestConnection>, dialect: Arc<dyn Dialect>) -> Driver {
    let connection: Arc<dyn Connection> = Arc::clone(connection) as Arc<dyn Connection>;
    Driver::new(connection, dialect)
}

fn accounts() -> TableDescriptor {
    TableDescriptor::new()
        .field(
            "id",
            FieldDescriptor::new(FieldType::BigInt)
                .unsigned()
                .auto_increment()
                .primary_key(),
        )
        .field("owner_id", FieldDescriptor::new(FieldType::Int).not_null())
        .field("active", FieldDescriptor::new(FieldType::Bool))
        .field(
            "created",
            FieldDescriptor::new(FieldType::Timestamp).default_value("CURRENT_TIMESTAMP"),
        )
        .foreign_key(ForeignKey::new(["owner_id"], "owners", ["id"]).on_delete(ForeignKeyAction::Cascade))
}

#[tokio::test]
async fn test_connects_lazily_once() {
    let connection = Arc::new(InMemoryTestConnection::new());
    let db = driver_with(&connection, Arc::new(MySqlDialect::new()));

    assert!(!db.is_connected());
    db.query("SELECT 1", ()).await.unwrap();
    db.query("SELECT 2", ()).await.unwrap();

    assert!(db.is_connected());
    assert_eq!(connection.connect_count(), 1);
    assert!(db.disconnect().await);
    assert!(!db.disconnect().await);
}

#[tokio::test]
async fn test_connection_failure_surfaces() {
    let connection = Arc::new(InMemoryTestConnection::new().refusing_connections("Access denied for user"));
    let db = driver_with(&connection, Arc::new(PostgresDialect::new()));

    let err = db.query("SELECT 1", ()).await.unwrap_err();
    assert!(matches!(err, DbalError::ConnectionFailed(m) if m.contains("Access denied")));
    connection.assert_query_count(0);
}

#[tokio::test]
async fn test_query_with_and_without_binds() {
    let connection = Arc::new(InMemoryTestConnection::new());
    let db = driver_with(&connection, Arc::new(MySqlDialect::new()));

    db.query("SELECT * FROM t WHERE name = 'a?b' AND id = ?", 5).await.unwrap();
    connection.assert_last_query("SELECT * FROM t WHERE name = 'a?b' AND id = 5");

    // Raw text is passed through untouched.
    db.query("SELECT '?' AS mark", ()).await.unwrap();
    connection.assert_last_query("SELECT '?' AS mark");

    let err = db.query("SELECT 1", 5).await.unwrap_err();
    assert!(matches!(err, DbalError::PlaceholderMismatch { markers: 0, binds: 1 }));
}

#[tokio::test]
async fn test_mysql_insert_returns_last_insert_id() {
    let connection = Arc::new(
        InMemoryTestConnection::new().with_response(
            InMemoryTestResponseBuilder::new()
                .rows_affected(1)
                .last_insert_id(42)
                .build(),
        ),
    );
    let db = driver_with(&connection, Arc::new(MySqlDialect::new()));

    let id = db.insert("users", [("name", "Ann"), ("email", "ann@example.com")], "id").await.unwrap();

    assert_eq!(id, "42");
    connection.assert_last_query("INSERT INTO users (name,email) VALUES ('Ann','ann@example.com')");
}

#[tokio::test]
async fn test_mysql_insert_without_affected_rows_fails() {
    let connection = Arc::new(InMemoryTestConnection::new());
    let db = driver_with(&connection, Arc::new(MySqlDialect::new()));

    let err = db.insert("users", [("name", "Ann")], "id").await.unwrap_err();
    assert!(matches!(err, DbalError::Insert(_)));
}

#[tokio::test]
async fn test_postgres_insert_reads_returning() {
    let connection = Arc::new(
        InMemoryTestConnection::new().with_response(
            InMemoryTestResponseBuilder::new()
                .columns(&["id"])
                .row(&["17"])
                .rows_affected(1)
                .build(),
        ),
    );
    let db = driver_with(&connection, Arc::new(PostgresDialect::new()));

    let id = db.insert("users", [("name", "Ann")], "id").await.unwrap();

    assert_eq!(id, "17");
    connection.assert_last_query("INSERT INTO users (name) VALUES ('Ann') RETURNING id");
}

#[tokio::test]
async fn test_postgres_insert_failures() {
    let connection = Arc::new(InMemoryTestConnection::new());
    let db = driver_with(&connection, Arc::new(PostgresDialect::new()));

    let err = db.insert("users", [("name", "Ann")], "").await.unwrap_err();
    assert!(matches!(err, DbalError::Insert(_)));
    connection.assert_query_count(0);

    let err = db.insert("users", [("name", "Ann")], "id").await.unwrap_err();
    assert!(matches!(err, DbalError::Insert(_)));
}

#[tokio::test]
async fn test_create_table_diverges_by_dialect() {
    let connection = Arc::new(InMemoryTestConnection::new());

    let mysql = driver_with(&connection, Arc::new(MySqlDialect::new()));
    mysql.create_table("accounts", &accounts()).await.unwrap();
    connection.assert_last_query(
        "CREATE TABLE accounts (id BIGINT UNSIGNED AUTO_INCREMENT PRIMARY KEY, owner_id INT NOT NULL, \
         active TINYINT(1), created TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
         FOREIGN KEY (owner_id) REFERENCES owners (id) ON UPDATE RESTRICT ON DELETE CASCADE)",
    );

    let postgres = driver_with(&connection, Arc::new(PostgresDialect::new()));
    postgres.create_table("accounts", &accounts()).await.unwrap();
    connection.assert_last_query(
        "CREATE TABLE accounts (id BIGSERIAL PRIMARY KEY, owner_id INT NOT NULL, \
         active BOOLEAN, created TIMESTAMP DEFAULT CURRENT_TIMESTAMP, \
         FOREIGN KEY (owner_id) REFERENCES owners (id) ON UPDATE RESTRICT ON DELETE CASCADE)",
    );
}

#[tokio::test]
async fn test_schema_error_is_raised_before_sending() {
    let connection = Arc::new(InMemoryTestConnection::new());
    let db = driver_with(&connection, Arc::new(PostgresDialect::new()));

    let table = accounts().primary_key(["owner_id"]).unwrap();
    let err = db.create_table("accounts", &table).await.unwrap_err();

    assert!(matches!(err, DbalError::Schema(_)));
    connection.assert_query_count(0);
}

#[tokio::test]
async fn test_drop_table_and_create_index() {
    let connection = Arc::new(InMemoryTestConnection::new());
    let db = driver_with(&connection, Arc::new(PostgresDialect::new())).with_table_prefix("app");

    let table = db.table_name("accounts");
    db.drop_table(&table).await.unwrap();
    connection.assert_last_query("DROP TABLE app.accounts CASCADE");

    db.create_index(&table, ["owner_id", "active"], IndexKind::Index).await.unwrap();
    connection.assert_last_query("CREATE INDEX app_accounts_owner_id_active ON app.accounts (owner_id, active)");
}

#[tokio::test]
async fn test_transaction_statements() {
    let connection = Arc::new(InMemoryTestConnection::new());
    let db = driver_with(&connection, Arc::new(MySqlDialect::new()));

    db.begin_transaction().await.unwrap();
    db.begin_transaction().await.unwrap();
    db.commit_transaction().await.unwrap();
    db.rollback_transaction().await.unwrap();

    let sql: Vec<String> = connection.recorded_queries().into_iter().map(|q| q.sql).collect();
    assert_eq!(sql, vec!["BEGIN", "BEGIN", "COMMIT", "ROLLBACK"]);
}
