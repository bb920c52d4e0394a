//! Trait abstractions for the migration engine
//!
//! The runner drives a [`MigrationStore`] and never talks to sqlx directly,
//! so engine properties (idempotence, atomicity, failure reporting) are
//! testable against the in-memory mock without a database.

use async_trait::async_trait;

use crate::error::DatabaseResult;
use crate::migration::{Migration, Probe};
use crate::models::AppliedMigration;

/// Persistence boundary for the migration engine
#[async_trait]
pub trait MigrationStore: Send + Sync {
    /// Create the ledger table if it does not exist
    async fn ensure_ledger(&self) -> DatabaseResult<()>;

    /// All ledger rows, ordered by id
    async fn applied_migrations(&self) -> DatabaseResult<Vec<AppliedMigration>>;

    /// Take the session advisory lock, failing immediately on contention
    async fn acquire_lock(&self) -> DatabaseResult<()>;

    /// Release the session advisory lock
    async fn release_lock(&self) -> DatabaseResult<()>;

    /// Apply one migration atomically: statements, verification probes, and
    /// the ledger insert all commit together or not at all. Requires the
    /// lock session from [`MigrationStore::acquire_lock`]
    async fn apply(&self, migration: &Migration) -> DatabaseResult<()>;

    /// Re-run a migration's verification probes outside any transaction
    async fn verify(&self, migration: &Migration) -> DatabaseResult<Vec<(Probe, bool)>>;
}

/// Read-only schema introspection
#[async_trait]
pub trait SchemaInspector: Send + Sync {
    /// Whether the probed object exists
    async fn exists(&self, probe: &Probe) -> DatabaseResult<bool>;
}
