use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{debug, error, info};

use crate::config::{redact_password, ConnectionConfig};
use crate::error::{DbalError, Result};
use crate::traits::Connection;
use crate::types::RawQueryResult;

/// PostgreSQL connection using tokio-postgres.
///
/// Statements go through the simple query protocol, which returns every
/// value as text.
pub struct PostgresConnection {
    connection_string: String,
    redacted: String,
    client: Mutex<Option<Arc<Client>>>,
}

impl PostgresConnection {
    pub fn new(connection_string: impl Into<String>) -> Self {
        let connection_string = connection_string.into();
        Self {
            redacted: redact_password(&connection_string),
            connection_string,
            client: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        Self {
            connection_string: config.postgres_connection_string(),
            redacted: config.redacted_connection_string(),
            client: Mutex::new(None),
        }
    }

    fn client(&self) -> Option<Arc<Client>> {
        self.client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Connection for PostgresConnection {
    async fn connect(&self) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        let (client, connection) = tokio_postgres::connect(&self.connection_string, NoTls)
            .await
            .map_err(|e| DbalError::ConnectionFailed(format!("{}: {e}", self.redacted)))?;

        let target = self.redacted.clone();
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!(connection = %target, error = %e, "postgres connection error");
            }
        });

        *self.client.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(client));
        info!(connection = %self.redacted, "connected to postgres");
        Ok(())
    }

    async fn disconnect(&self) -> bool {
        let closed = self
            .client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();
        if closed {
            debug!(connection = %self.redacted, "disconnected from postgres");
        }
        closed
    }

    fn is_connected(&self) -> bool {
        self.client().is_some_and(|c| !c.is_closed())
    }

    async fn execute(&self, sql: &str) -> Result<RawQueryResult> {
        let client = self
            .client()
            .ok_or_else(|| DbalError::ConnectionFailed("not connected".to_string()))?;

        let messages = client
            .simple_query(sql)
            .await
            .map_err(|e| DbalError::QueryFailed {
                sql: sql.to_string(),
                message: e.to_string(),
            })?;

        let mut result = RawQueryResult::empty();
        for message in messages {
            match message {
                SimpleQueryMessage::Row(row) => {
                    if result.columns.is_empty() {
                        result.columns = row
                            .columns()
                            .iter()
                            .map(|c| c.name().to_string())
                            .collect();
                    }
                    let values = (0..row.len())
                        .map(|i| row.get(i).map(str::to_string))
                        .collect();
                    result.rows.push(values);
                }
                SimpleQueryMessage::CommandComplete(affected) => {
                    result.rows_affected += affected;
                }
                _ => {}
            }
        }
        Ok(result)
    }
}
