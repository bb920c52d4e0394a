//! Database client combining pools, store, and inspector

use anyhow::Result;

use crate::capability;
use crate::catalog::PgSchemaInspector;
use crate::migration::Migration;
use crate::models::CapabilityReport;
use crate::pool_manager::{PoolConfig, PoolManager};
use crate::runner::MigrationRunner;
use crate::store::PgMigrationStore;
use supaops_config::{DatabaseConfig, MigrationConfig};

/// Database client combining pools, migration store, and schema inspector
pub struct DataClient {
    pools: PoolManager,
    store: PgMigrationStore,
    inspector: PgSchemaInspector,
}

impl DataClient {
    /// Initialize pools and wire up the store
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Database connection fails
    /// - Pool creation fails due to invalid configuration
    /// - The configured ledger table name is not a valid identifier
    pub async fn initialize(
        db_config: &DatabaseConfig,
        migration_config: &MigrationConfig,
    ) -> Result<Self> {
        let pools = PoolManager::new(db_config, PoolConfig::default()).await?;
        let store = PgMigrationStore::new(
            pools.clone(),
            migration_config.ledger_table.clone(),
            migration_config.lock_key,
            migration_config.ddl_timeout_seconds,
        )?;
        let inspector = PgSchemaInspector::new(pools.inspect_pool().clone());
        Ok(Self {
            pools,
            store,
            inspector,
        })
    }

    /// Get the migration store
    pub const fn store(&self) -> &PgMigrationStore {
        &self.store
    }

    /// Get the schema inspector
    pub const fn inspector(&self) -> &PgSchemaInspector {
        &self.inspector
    }

    /// Get the pool manager
    pub const fn pools(&self) -> &PoolManager {
        &self.pools
    }

    /// Build a runner over the given registry
    ///
    /// # Errors
    /// Returns an error if the registry is malformed
    pub fn runner(
        &self,
        registry: Vec<Migration>,
    ) -> Result<MigrationRunner<PgMigrationStore>, crate::DatabaseError> {
        let ledger_table = self.store.ledger_table().to_string();
        MigrationRunner::new(self.store.clone(), registry, ledger_table)
    }

    /// Run the capability probe sequence on the inspection pool
    ///
    /// # Errors
    /// Returns error if the probes cannot reach the server at all
    pub async fn doctor(&self) -> Result<CapabilityReport, crate::DatabaseError> {
        capability::run_checks(self.pools.inspect_pool()).await
    }

    /// Close all pools
    pub async fn close(&self) {
        self.pools.close().await;
    }
}
