use thiserror::Error;

/// Error type for dbal operations
#[derive(Debug, Error)]
pub enum DbalError {
    #[error("Query string is empty: no query type set or custom query text is empty")]
    EmptyQuery,

    #[error("Table name not specified")]
    MissingTable,

    #[error("Placeholder mismatch: {markers} marker(s) in query, {binds} bind value(s)")]
    PlaceholderMismatch { markers: usize, binds: usize },

    #[error("Query builder has no driver attached")]
    NoDriver,

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Can't execute query {sql}: {message}")]
    QueryFailed { sql: String, message: String },

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Default connection not defined")]
    NoDefaultDriver,

    #[error("Unknown database alias: {0}")]
    UnknownDriver(String),

    #[error("Can't create entry: {0}")]
    Insert(String),

    #[error("Expected {expected} row(s), got {actual}")]
    UnexpectedRowCount { expected: usize, actual: usize },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid value in column {column}: {value}")]
    InvalidValue { column: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for dbal operations
pub type Result<T> = std::result::Result<T, DbalError>;
