//! Supaops data layer for `PostgreSQL` schema operations
//!
//! Connection pools, catalog probes, capability detection, and the
//! versioned migration engine with its ledger table.

// Module declarations
pub mod capability;
pub mod catalog;
pub mod client;
pub mod error;
pub mod migration;
pub mod models;
pub mod pool_manager;
pub mod remediation;
pub mod runner;
pub mod store;
pub mod traits;

pub mod mock;
pub use mock::{MockMigrationStore, MockSchemaInspector};

// Public exports
pub use capability::run_checks;
pub use catalog::{PgSchemaInspector, probe_exists};
pub use client::DataClient;
pub use error::{
    DatabaseError, DatabaseErrorExt, DatabaseOperation, DatabaseResult, DbErrorKind,
};
pub use migration::{Migration, Probe, registry_status, validate_registry};
pub use models::*;
pub use pool_manager::{PoolConfig, PoolManager};
pub use remediation::{render_drift_remedy, render_lock_remedy, render_remediation};
pub use runner::{MigrationRunner, RunOptions};
pub use store::PgMigrationStore;
pub use traits::{MigrationStore, SchemaInspector};
// Use unified DatabaseConfig from supaops-config
pub use supaops_config::DatabaseConfig;
