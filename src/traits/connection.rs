use async_trait::async_trait;

use crate::error::Result;
use crate::types::RawQueryResult;

/// Transport seam owned by a [`Driver`](crate::Driver).
///
/// Implementations are responsible for:
/// - Opening and closing the physical connection
/// - Sending fully substituted SQL text
/// - Converting result rows to [`RawQueryResult`] text values
#[async_trait]
pub trait Connection: Send + Sync {
    /// Opens the connection. Calling it on a live connection does nothing.
    async fn connect(&self) -> Result<()>;

    /// Closes the connection, returning whether a live one was closed.
    async fn disconnect(&self) -> bool;

    fn is_connected(&self) -> bool;

    /// Executes one SQL statement.
    async fn execute(&self, sql: &str) -> Result<RawQueryResult>;
}
