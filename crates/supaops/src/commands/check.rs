//! `supaops check` handlers

use anyhow::Result;
use supaops_config::ApplicationConfig;
use supaops_db::{Probe, SchemaInspector};

/// `supaops check table <name>` / `supaops check column <table> <column>`
///
/// Prints the finding and succeeds only when the object exists, so shell
/// pipelines can gate on the exit code.
pub async fn exists(config: &ApplicationConfig, probe: Probe) -> Result<bool> {
    let client = super::connect(config).await?;
    let found = client.inspector().exists(&probe).await?;

    if found {
        println!("{probe}: exists");
    } else {
        println!("{probe}: missing");
    }
    client.close().await;
    Ok(found)
}
