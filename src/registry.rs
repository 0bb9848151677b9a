use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::Config;
use crate::driver::Driver;
use crate::error::{DbalError, Result};

/// Named drivers with one optional default.
///
/// Built once at startup, typically with [`Registry::from_config`], and then
/// shared read-only.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    drivers: HashMap<String, Driver>,
    default: Option<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a driver per configured section, connecting the ones flagged
    /// `auto_connect`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let mut registry = Self::new();
        for (alias, connection) in &config.db {
            let driver = Driver::from_config(connection);
            if connection.auto_connect {
                driver.connect().await?;
            }
            registry.add(alias.clone(), driver, connection.default);
        }
        info!(connections = registry.len(), "database registry ready");
        Ok(registry)
    }

    /// Registers or replaces the driver under `alias`.
    pub fn add(&mut self, alias: impl Into<String>, driver: Driver, is_default: bool) {
        let alias = alias.into();
        debug!(alias = %alias, dialect = driver.dialect().name(), is_default, "registering driver");
        if is_default {
            self.default = Some(alias.clone());
        }
        self.drivers.insert(alias, driver);
    }

    /// Looks up a driver. An empty alias means the default: the one marked
    /// as such, or else the only registered driver.
    pub fn get(&self, alias: &str) -> Result<&Driver> {
        if !alias.is_empty() {
            return self
                .drivers
                .get(alias)
                .ok_or_else(|| DbalError::UnknownDriver(alias.to_string()));
        }
        if let Some(default) = &self.default {
            return self
                .drivers
                .get(default)
                .ok_or_else(|| DbalError::UnknownDriver(default.clone()));
        }
        let mut drivers = self.drivers.values();
        match (drivers.next(), drivers.next()) {
            (Some(only), None) => Ok(only),
            _ => Err(DbalError::NoDefaultDriver),
        }
    }

    pub fn default_alias(&self) -> Option<&str> {
        self.default.as_deref()
    }

    /// Registered aliases, sorted.
    pub fn aliases(&self) -> Vec<&str> {
        let mut aliases: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        aliases.sort_unstable();
        aliases
    }

    pub fn len(&self) -> usize {
        self.drivers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drivers.is_empty()
    }

    /// Disconnects every driver; returns how many live connections were closed.
    pub async fn disconnect_all(&self) -> usize {
        let mut closed = 0;
        for driver in self.drivers.values() {
            if driver.disconnect().await {
                closed += 1;
            }
        }
        closed
    }
}
