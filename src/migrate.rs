//! Numbered schema migrations applied through a [`Driver`].
//!
//! Applied migration ids are stored in a bookkeeping table (`migrations`
//! by default, qualified with the driver's table prefix).

use std::collections::BTreeSet;

use async_trait::async_trait;
use tracing::info;

use crate::driver::Driver;
use crate::error::Result;
use crate::schema::{FieldDescriptor, FieldType, TableDescriptor};

pub const MIGRATION_TABLE: &str = "migrations";

/// One reversible schema change.
#[async_trait]
pub trait Migration: Send + Sync {
    /// Position in the migration sequence. Ids are unique.
    fn id(&self) -> u32;

    async fn up(&self, driver: &Driver) -> Result<()>;

    async fn down(&self, driver: &Driver) -> Result<()>;
}

/// Applies and rolls back an ordered set of migrations.
pub struct Migrator {
    driver: Driver,
    table: String,
    migrations: Vec<Box<dyn Migration>>,
}

impl Migrator {
    pub fn new(driver: Driver) -> Self {
        let table = driver.table_name(MIGRATION_TABLE);
        Self {
            driver,
            table,
            migrations: Vec::new(),
        }
    }

    /// Registers a migration. A later migration with the same id replaces
    /// the earlier one.
    pub fn add(mut self, migration: impl Migration + 'static) -> Self {
        self.migrations.retain(|m| m.id() != migration.id());
        self.migrations.push(Box::new(migration));
        self.migrations.sort_by_key(|m| m.id());
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Creates the bookkeeping table.
    pub async fn init(&self) -> Result<()> {
        let description = TableDescriptor::new()
            .field(
                "id",
                FieldDescriptor::new(FieldType::Integer)
                    .unsigned()
                    .not_null()
                    .primary_key(),
            )
            .field(
                "date",
                FieldDescriptor::new(FieldType::Timestamp)
                    .not_null()
                    .default_value("CURRENT_TIMESTAMP"),
            );
        self.driver.create_table(&self.table, &description).await?;
        info!(table = %self.table, "migration table created");
        Ok(())
    }

    /// Ids of the applied migrations.
    pub async fn applied(&self) -> Result<BTreeSet<u32>> {
        let mut query = self.driver.select(["id"]);
        query.from([self.table.as_str()]);
        let result = query.run().await?;
        let mut ids = BTreeSet::new();
        for row in &result {
            if let Some(id) = row.get_as::<u32>("id")? {
                ids.insert(id);
            }
        }
        Ok(ids)
    }

    /// Highest applied id, if any migration has been applied.
    pub async fn last_applied(&self) -> Result<Option<u32>> {
        let mut query = self.driver.select(["MAX(id) AS max_id"]);
        query.from([self.table.as_str()]);
        let result = query.run().await?;
        match result.row() {
            Some(row) => row.get_as::<u32>("max_id"),
            None => Ok(None),
        }
    }

    /// Applies, in ascending order, every unapplied migration with an id up
    /// to `bound` (all of them when `None`). Returns the applied ids.
    pub async fn up(&self, bound: Option<u32>) -> Result<Vec<u32>> {
        let applied = self.applied().await?;
        let mut done = Vec::new();
        for migration in &self.migrations {
            let id = migration.id();
            if bound.is_some_and(|b| id > b) || applied.contains(&id) {
                continue;
            }
            info!(id, "applying migration");
            migration.up(&self.driver).await?;
            let mut record = self.driver.builder();
            record.insert(self.table.as_str(), [("id", id)]);
            record.run().await?;
            done.push(id);
        }
        if done.is_empty() {
            info!("no migrations to apply");
        }
        Ok(done)
    }

    /// Rolls back, in descending order, every applied migration with an id
    /// of at least `bound`. Without a bound only the last applied one is
    /// rolled back. Returns the rolled back ids.
    pub async fn down(&self, bound: Option<u32>) -> Result<Vec<u32>> {
        let bound = match bound {
            Some(bound) => bound,
            None => match self.last_applied().await? {
                Some(last) => last,
                None => {
                    info!("no migrations to roll back");
                    return Ok(Vec::new());
                }
            },
        };
        let applied = self.applied().await?;
        let mut done = Vec::new();
        for migration in self.migrations.iter().rev() {
            let id = migration.id();
            if id < bound || !applied.contains(&id) {
                continue;
            }
            info!(id, "rolling back migration");
            migration.down(&self.driver).await?;
            let mut record = self.driver.delete(self.table.as_str());
            record.where_("id = ?", id);
            record.run().await?;
            done.push(id);
        }
        if done.is_empty() {
            info!("no migrations to roll back");
        }
        Ok(done)
    }
}
