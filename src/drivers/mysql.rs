use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection as SqlxMySqlConnection, MySqlRow};
use sqlx::{Column as _, Connection as _, Either, Row as _, ValueRef as _};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::error::{DbalError, Result};
use crate::traits::Connection;
use crate::types::RawQueryResult;

/// MySQL / MariaDB connection using sqlx.
///
/// Statements are sent as raw text, so result values arrive in the text
/// protocol and are handed back unchanged.
pub struct MySqlConnection {
    options: MySqlConnectOptions,
    target: String,
    conn: Mutex<Option<SqlxMySqlConnection>>,
    connected: AtomicBool,
}

impl MySqlConnection {
    pub fn new(options: MySqlConnectOptions, target: impl Into<String>) -> Self {
        Self {
            options,
            target: target.into(),
            conn: Mutex::new(None),
            connected: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &ConnectionConfig) -> Self {
        let mut options = MySqlConnectOptions::new().port(config.mysql_port());
        if let Some(host) = config.host.as_deref() {
            options = options.host(host);
        }
        if let Some(username) = config.username.as_deref() {
            options = options.username(username);
        }
        if let Some(password) = config.password.as_deref() {
            options = options.password(password);
        }
        if let Some(database) = config.database.as_deref() {
            options = options.database(database);
        }
        if let Some(socket) = config.socket.as_deref() {
            options = options.socket(socket);
        }

        let location = match config.socket.as_deref() {
            Some(socket) => socket.to_string(),
            None => format!(
                "{}:{}",
                config.host.as_deref().unwrap_or("localhost"),
                config.mysql_port()
            ),
        };
        let target = format!(
            "mysql://{}@{}/{}",
            config.username.as_deref().unwrap_or_default(),
            location,
            config.database.as_deref().unwrap_or_default()
        );
        Self::new(options, target)
    }
}

fn query_failed(sql: &str, e: sqlx::Error) -> DbalError {
    DbalError::QueryFailed {
        sql: sql.to_string(),
        message: e.to_string(),
    }
}

fn row_values(sql: &str, row: &MySqlRow) -> Result<Vec<Option<String>>> {
    (0..row.len())
        .map(|i| {
            let raw = row.try_get_raw(i).map_err(|e| query_failed(sql, e))?;
            if raw.is_null() {
                return Ok(None);
            }
            row.try_get_unchecked::<String, _>(i)
                .map(Some)
                .map_err(|e| query_failed(sql, e))
        })
        .collect()
}

#[async_trait]
impl Connection for MySqlConnection {
    async fn connect(&self) -> Result<()> {
        let mut slot = self.conn.lock().await;
        if slot.is_some() {
            return Ok(());
        }
        let conn = SqlxMySqlConnection::connect_with(&self.options)
            .await
            .map_err(|e| DbalError::ConnectionFailed(format!("{}: {e}", self.target)))?;
        *slot = Some(conn);
        self.connected.store(true, Ordering::SeqCst);
        info!(connection = %self.target, "connected to mysql");
        Ok(())
    }

    async fn disconnect(&self) -> bool {
        let conn = self.conn.lock().await.take();
        self.connected.store(false, Ordering::SeqCst);
        let Some(conn) = conn else {
            return false;
        };
        if let Err(e) = conn.close().await {
            warn!(connection = %self.target, error = %e, "mysql connection closed uncleanly");
        }
        debug!(connection = %self.target, "disconnected from mysql");
        true
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn execute(&self, sql: &str) -> Result<RawQueryResult> {
        let mut slot = self.conn.lock().await;
        let conn = slot
            .as_mut()
            .ok_or_else(|| DbalError::ConnectionFailed("not connected".to_string()))?;

        let mut result = RawQueryResult::empty();
        // Rows and per-statement summaries come back on one stream.
        #[allow(deprecated)]
        let mut stream = sqlx::raw_sql(sql).fetch_many(&mut *conn);
        while let Some(item) = stream.try_next().await.map_err(|e| query_failed(sql, e))? {
            match item {
                Either::Left(done) => {
                    result.rows_affected += done.rows_affected();
                    result.last_insert_id = Some(done.last_insert_id());
                }
                Either::Right(row) => {
                    if result.columns.is_empty() {
                        result.columns = row
                            .columns()
                            .iter()
                            .map(|c| c.name().to_string())
                            .collect();
                    }
                    result.rows.push(row_values(sql, &row)?);
                }
            }
        }
        Ok(result)
    }
}
