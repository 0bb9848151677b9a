mod mysql;
mod postgres;

pub use self::in_memory_test::{InMemoryTestConnection, InMemoryTestResponseBuilder, RecordedQuery};
pub use self::mysql::MySqlConnection;
pub use self::postgres::PostgresConnection;
