//! Typed connection configuration.
//!
//! Connections are declared as named TOML sections:
//!
//! ```toml
//! [db.main]
//! driver = "postgres"
//! host = "localhost"
//! database = "app"
//! default = true
//! ```
//!
//! Unknown keys are rejected when the file is parsed.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{DbalError, Result};

pub const MYSQL_DEFAULT_PORT: u16 = 3306;

/// Database family a connection talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriverKind {
    #[serde(alias = "mysqli")]
    Mysql,
    #[serde(alias = "postgre", alias = "postgresql", alias = "pgsql")]
    Postgres,
}

/// Parameters of one named connection.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    pub driver: DriverKind,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    /// Unix socket path (MySQL only).
    pub socket: Option<String>,
    /// Schema or database name prepended to table names.
    pub table_prefix: Option<String>,
    /// Complete libpq-style connection string (Postgres only).
    pub connection_string: Option<String>,
    /// Extra server options (Postgres only).
    pub options: Option<String>,
    #[serde(default)]
    pub auto_connect: bool,
    #[serde(default)]
    pub default: bool,
}

impl ConnectionConfig {
    pub fn new(driver: DriverKind) -> Self {
        Self {
            driver,
            host: None,
            port: None,
            username: None,
            password: None,
            database: None,
            socket: None,
            table_prefix: None,
            connection_string: None,
            options: None,
            auto_connect: false,
            default: false,
        }
    }

    /// The Postgres connection string: `connection_string` verbatim when
    /// set, otherwise assembled from the non-empty individual parameters.
    pub fn postgres_connection_string(&self) -> String {
        if let Some(conn) = self.connection_string.as_deref().filter(|c| !c.is_empty()) {
            return conn.to_string();
        }
        let port = self.port.map(|p| p.to_string());
        let parts = [
            ("host", self.host.as_deref()),
            ("port", port.as_deref()),
            ("dbname", self.database.as_deref()),
            ("user", self.username.as_deref()),
            ("password", self.password.as_deref()),
            ("options", self.options.as_deref()),
        ];
        parts
            .iter()
            .filter_map(|(key, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("{key}={}", quote_conninfo_value(v)))
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The Postgres connection string with the password value masked.
    pub fn redacted_connection_string(&self) -> String {
        redact_password(&self.postgres_connection_string())
    }

    pub fn mysql_port(&self) -> u16 {
        self.port.unwrap_or(MYSQL_DEFAULT_PORT)
    }

    fn validate(&self, alias: &str) -> Result<()> {
        match self.driver {
            DriverKind::Mysql => {
                if self.connection_string.is_some() || self.options.is_some() {
                    return Err(DbalError::Config(format!(
                        "db.{alias}: connection_string and options are only valid for postgres"
                    )));
                }
            }
            DriverKind::Postgres => {
                if self.socket.is_some() {
                    return Err(DbalError::Config(format!(
                        "db.{alias}: socket is only valid for mysql"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Quotes a libpq connection string value when it contains whitespace,
/// quotes or backslashes.
fn quote_conninfo_value(value: &str) -> String {
    if !value
        .chars()
        .any(|c| c.is_whitespace() || c == '\'' || c == '\\')
    {
        return value.to_string();
    }
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

/// Masks the `password=` value of a libpq-style connection string for logging.
///
/// The string is read as `key = value` pairs, so quoted values containing
/// spaces are masked whole. Everything else is copied unchanged.
pub fn redact_password(connection_string: &str) -> String {
    let bytes = connection_string.as_bytes();
    let mut redacted = String::with_capacity(connection_string.len());
    let mut pos = 0;
    while pos < bytes.len() {
        // Copy the separator and the key up to and including `=`.
        let key_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        let Some(eq) = connection_string[pos..].find('=').map(|i| pos + i) else {
            redacted.push_str(&connection_string[key_start..]);
            break;
        };
        let key = connection_string[pos..eq].trim();
        pos = eq + 1;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        redacted.push_str(&connection_string[key_start..pos]);

        let value_start = pos;
        if bytes.get(pos) == Some(&b'\'') {
            pos += 1;
            while pos < bytes.len() && bytes[pos] != b'\'' {
                pos += if bytes[pos] == b'\\' { 2 } else { 1 };
            }
            pos = (pos + 1).min(bytes.len());
        } else {
            while pos < bytes.len() && !bytes[pos].is_ascii_whitespace() {
                pos += 1;
            }
        }
        if key.eq_ignore_ascii_case("password") {
            redacted.push_str("****");
        } else {
            redacted.push_str(&connection_string[value_start..pos]);
        }
    }
    redacted
}

/// All configured connections, keyed by alias.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub db: BTreeMap<String, ConnectionConfig>,
}

impl Config {
    /// Parses and validates TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Config = toml::from_str(raw)
            .map_err(|e| DbalError::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw).map_err(|e| match e {
            DbalError::Config(message) => {
                DbalError::Config(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    pub fn validate(&self) -> Result<()> {
        let defaults: Vec<&str> = self
            .db
            .iter()
            .filter(|(_, c)| c.default)
            .map(|(alias, _)| alias.as_str())
            .collect();
        if defaults.len() > 1 {
            return Err(DbalError::Config(format!(
                "more than one default connection: {}",
                defaults.join(", ")
            )));
        }
        for (alias, connection) in &self.db {
            if alias.is_empty() {
                return Err(DbalError::Config("empty connection alias".to_string()));
            }
            connection.validate(alias)?;
        }
        Ok(())
    }
}
