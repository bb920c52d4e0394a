//! `supaops fn` handlers

use anyhow::{Context, Result};
use supaops_config::ApplicationConfig;
use supaops_supabase::SupabaseAdminClient;

/// `supaops fn invoke <name> [--payload JSON]`
pub async fn invoke(
    config: &ApplicationConfig,
    name: &str,
    payload: Option<&str>,
) -> Result<bool> {
    let payload = match payload {
        Some(raw) => serde_json::from_str(raw).context("--payload is not valid JSON")?,
        None => serde_json::json!({}),
    };

    let client = SupabaseAdminClient::new(&config.supabase)?;
    let response = client.invoke_function(name, payload).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(true)
}
