//! `supaops migrate` handlers

use anyhow::Result;
use supaops_config::ApplicationConfig;
use supaops_db::{DatabaseError, RunOptions, render_drift_remedy, render_lock_remedy};

use crate::registry;

/// `supaops migrate status`
pub async fn status(config: &ApplicationConfig) -> Result<bool> {
    let client = super::connect(config).await?;
    let runner = client.runner(registry::migrations())?;

    let lines = runner.status().await?;
    for line in &lines {
        println!("{:04}  {:<40}  {}", line.id, line.name, line.status);
    }
    client.close().await;
    Ok(true)
}

/// `supaops migrate run [--dry-run] [--target N]`
pub async fn run(config: &ApplicationConfig, dry_run: bool, target: Option<u32>) -> Result<bool> {
    let client = super::connect(config).await?;
    let runner = client.runner(registry::migrations())?;

    let report = match runner.run(RunOptions { dry_run, target }).await {
        Ok(report) => report,
        Err(e) => {
            client.close().await;
            // Aborted runs get operator guidance too, not just an exit code
            match &e {
                DatabaseError::ChecksumMismatch {
                    id,
                    recorded,
                    computed,
                } => {
                    eprintln!("error: {e}");
                    eprintln!("{}", render_drift_remedy(*id, recorded, computed));
                    return Ok(false);
                }
                DatabaseError::LockUnavailable { lock_key } => {
                    eprintln!("error: {e}");
                    eprintln!("{}", render_lock_remedy(*lock_key));
                    return Ok(false);
                }
                _ => return Err(e.into()),
            }
        }
    };
    for (id, name, outcome) in &report.outcomes {
        println!("{id:04}  {name:<40}  {outcome}");
    }

    if let Some(remediation) = &report.remediation {
        eprintln!();
        eprintln!("{remediation}");
    }

    if report.succeeded() {
        println!(
            "done: {} applied, {} skipped",
            report.applied_count(),
            report.skipped_count()
        );
    }
    client.close().await;
    Ok(report.succeeded())
}

/// `supaops migrate verify`
pub async fn verify(config: &ApplicationConfig) -> Result<bool> {
    let client = super::connect(config).await?;
    let runner = client.runner(registry::migrations())?;

    let results = runner.verify().await?;
    let mut all_ok = true;
    for (id, probe, ok) in &results {
        let state = if *ok { "ok" } else { "MISSING" };
        println!("{id:04}  {probe:<50}  {state}");
        all_ok &= *ok;
    }
    if results.is_empty() {
        println!("nothing applied yet; run `supaops migrate run` first");
    }
    client.close().await;
    Ok(all_ok)
}
