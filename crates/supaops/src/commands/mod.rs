//! Command handlers
//!
//! Every handler returns whether the command succeeded; main maps that to
//! the process exit code. Handlers print human-readable output to stdout
//! and leave structured logging to tracing.

pub mod check;
pub mod doctor;
pub mod function;
pub mod migrate;
pub mod user;

use anyhow::Result;
use supaops_config::ApplicationConfig;
use supaops_db::DataClient;

/// Open pools and wire up the database client from configuration
pub async fn connect(config: &ApplicationConfig) -> Result<DataClient> {
    DataClient::initialize(&config.database, &config.migration).await
}
