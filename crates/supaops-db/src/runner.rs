//! The migration runner
//!
//! Drives a [`MigrationStore`] through the status / run / verify operations.
//! A run is: ensure ledger, take the advisory lock, refuse to proceed on
//! checksum drift, then walk the registry in id order applying whatever the
//! ledger does not already record. Running the same registry twice is a
//! no-op the second time.

use crate::error::{DatabaseError, DatabaseResult};
use crate::migration::{Migration, Probe, registry_status, validate_registry};
use crate::models::{MigrationReport, MigrationStatus, RunOutcome, StatusLine};
use crate::remediation::render_remediation;
use crate::traits::MigrationStore;

/// Options for a migration run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Plan only; take no lock and execute nothing
    pub dry_run: bool,
    /// Stop after this migration id (inclusive)
    pub target: Option<u32>,
}

/// Drives the registry against a [`MigrationStore`]
pub struct MigrationRunner<S> {
    store: S,
    registry: Vec<Migration>,
    ledger_table: String,
}

impl<S: MigrationStore> MigrationRunner<S> {
    /// Create a runner, validating the registry up front
    ///
    /// # Errors
    /// Returns `DatabaseError::InvalidRegistry` for duplicate or unordered
    /// ids, or migrations without statements or probes
    pub fn new(
        store: S,
        registry: Vec<Migration>,
        ledger_table: impl Into<String>,
    ) -> DatabaseResult<Self> {
        validate_registry(&registry)?;
        Ok(Self {
            store,
            registry,
            ledger_table: ledger_table.into(),
        })
    }

    /// Per-migration status against the ledger
    ///
    /// # Errors
    /// Returns database errors from ledger creation or reads
    pub async fn status(&self) -> DatabaseResult<Vec<StatusLine>> {
        self.store.ensure_ledger().await?;
        let applied = self.store.applied_migrations().await?;
        Ok(registry_status(&self.registry, &applied))
    }

    /// Apply pending migrations in id order
    ///
    /// On the first failure the run stops: the failed migration is reported
    /// with remediation SQL and later migrations are not attempted. The
    /// advisory lock is released on every exit path.
    ///
    /// # Errors
    /// Returns an error for lock contention, checksum drift, or ledger
    /// failures; individual apply failures are reported in the
    /// [`MigrationReport`] instead
    pub async fn run(&self, options: RunOptions) -> DatabaseResult<MigrationReport> {
        self.store.ensure_ledger().await?;

        if options.dry_run {
            return self.plan(options.target).await;
        }

        self.store.acquire_lock().await?;
        let result = self.run_locked(options.target).await;
        let unlock = self.store.release_lock().await;

        let report = result?;
        unlock?;
        Ok(report)
    }

    /// Re-run verification probes for every applied migration
    ///
    /// # Errors
    /// Returns database errors from ledger reads or probe queries
    pub async fn verify(&self) -> DatabaseResult<Vec<(u32, Probe, bool)>> {
        self.store.ensure_ledger().await?;
        let applied = self.store.applied_migrations().await?;

        let mut results = Vec::new();
        for migration in &self.registry {
            let in_ledger = applied.iter().any(|row| row.id == i64::from(migration.id));
            if !in_ledger {
                continue;
            }
            for (probe, ok) in self.store.verify(migration).await? {
                results.push((migration.id, probe, ok));
            }
        }
        Ok(results)
    }

    async fn plan(&self, target: Option<u32>) -> DatabaseResult<MigrationReport> {
        let applied = self.store.applied_migrations().await?;
        let status = registry_status(&self.registry, &applied);
        self.reject_drift(&status)?;

        let outcomes = status
            .into_iter()
            .filter(|line| target.is_none_or(|t| line.id <= t))
            .map(|line| {
                let outcome = match line.status {
                    MigrationStatus::Applied { .. } => RunOutcome::Skipped,
                    MigrationStatus::Pending => RunOutcome::Planned,
                    // Unreachable after reject_drift, kept total for safety
                    MigrationStatus::Drifted { .. } => RunOutcome::Failed {
                        reason: "checksum drift".to_string(),
                    },
                };
                (line.id, line.name, outcome)
            })
            .collect();

        Ok(MigrationReport {
            outcomes,
            remediation: None,
        })
    }

    async fn run_locked(&self, target: Option<u32>) -> DatabaseResult<MigrationReport> {
        let applied = self.store.applied_migrations().await?;
        let status = registry_status(&self.registry, &applied);
        self.reject_drift(&status)?;

        let mut outcomes = Vec::new();
        let mut remediation = None;

        for migration in &self.registry {
            if target.is_some_and(|t| migration.id > t) {
                break;
            }
            let already_applied = applied
                .iter()
                .any(|row| row.id == i64::from(migration.id));
            if already_applied {
                outcomes.push((migration.id, migration.name.clone(), RunOutcome::Skipped));
                continue;
            }

            match self.store.apply(migration).await {
                Ok(()) => {
                    outcomes.push((migration.id, migration.name.clone(), RunOutcome::Applied));
                }
                Err(e) => {
                    tracing::error!(
                        id = migration.id,
                        name = %migration.name,
                        error = %e,
                        "migration failed; stopping run"
                    );
                    outcomes.push((
                        migration.id,
                        migration.name.clone(),
                        RunOutcome::Failed {
                            reason: e.to_string(),
                        },
                    ));
                    remediation = Some(render_remediation(migration, &self.ledger_table));
                    break;
                }
            }
        }

        Ok(MigrationReport {
            outcomes,
            remediation,
        })
    }

    fn reject_drift(&self, status: &[StatusLine]) -> DatabaseResult<()> {
        for line in status {
            if let MigrationStatus::Drifted { recorded, computed } = &line.status {
                return Err(DatabaseError::ChecksumMismatch {
                    id: line.id,
                    recorded: recorded.clone(),
                    computed: computed.clone(),
                });
            }
        }
        Ok(())
    }
}
