//! `supaops doctor` handler

use anyhow::Result;
use supaops_config::ApplicationConfig;

/// Print the capability report and succeed only when migrations can run
pub async fn run(config: &ApplicationConfig) -> Result<bool> {
    println!("database: {}", config.database.safe_connection_string());
    println!("supabase: {}", config.supabase.credential_summary());
    println!();

    let client = super::connect(config).await?;
    let report = client.doctor().await?;

    println!("server version    {}", report.server_version);
    println!("current role      {}", report.current_role);
    println!("current database  {}", report.current_database);
    println!("CREATE on public  {}", report.can_create_in_public);

    let ready = report.can_migrate();
    println!();
    if ready {
        println!("ready: migrations can run with this role");
    } else {
        println!("not ready: fix the denied checks above before `migrate run`");
    }
    client.close().await;
    Ok(ready)
}
