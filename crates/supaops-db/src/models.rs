//! Domain models for the migration engine and capability checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A row from the migration ledger table
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AppliedMigration {
    /// Migration id (registry ids are u32; stored as bigint)
    pub id: i64,
    pub name: String,
    /// SHA-256 over the migration's statement list at apply time
    pub checksum: String,
    pub applied_at: DateTime<Utc>,
}

/// Status of one registered migration relative to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MigrationStatus {
    /// In the ledger with a matching checksum
    Applied { applied_at: DateTime<Utc> },
    /// Not in the ledger yet
    Pending,
    /// In the ledger, but the registry's statements have since changed
    Drifted { recorded: String, computed: String },
}

impl std::fmt::Display for MigrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied { applied_at } => {
                write!(f, "applied {}", applied_at.format("%Y-%m-%d %H:%M:%S UTC"))
            }
            Self::Pending => write!(f, "pending"),
            Self::Drifted { .. } => write!(f, "DRIFTED"),
        }
    }
}

/// One line of `migrate status` output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusLine {
    pub id: u32,
    pub name: String,
    pub status: MigrationStatus,
}

/// What happened to one migration during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunOutcome {
    /// Statements executed, probes passed, ledger row committed
    Applied,
    /// Already in the ledger - the run was a no-op for this migration
    Skipped,
    /// Would be applied (dry-run only)
    Planned,
    /// Apply or verification failed; nothing was committed
    Failed { reason: String },
}

impl std::fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::Skipped => write!(f, "skipped (already applied)"),
            Self::Planned => write!(f, "would apply (dry-run)"),
            Self::Failed { reason } => write!(f, "FAILED: {reason}"),
        }
    }
}

/// Full report of a `migrate run`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationReport {
    pub outcomes: Vec<(u32, String, RunOutcome)>,
    /// Remediation SQL for the operator, present exactly when a migration failed
    pub remediation: Option<String>,
}

impl MigrationReport {
    pub fn succeeded(&self) -> bool {
        !self
            .outcomes
            .iter()
            .any(|(_, _, outcome)| matches!(outcome, RunOutcome::Failed { .. }))
    }

    pub fn applied_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, _, outcome)| *outcome == RunOutcome::Applied)
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, _, outcome)| *outcome == RunOutcome::Skipped)
            .count()
    }
}

/// Result of one capability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Capability {
    Ok(String),
    Denied(String),
    Unknown(String),
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ok(detail) => write!(f, "ok ({detail})"),
            Self::Denied(reason) => write!(f, "DENIED ({reason})"),
            Self::Unknown(reason) => write!(f, "unknown ({reason})"),
        }
    }
}

/// Output of the `doctor` probe sequence
///
/// Replaces the corpus's try-RPC-then-REST-then-direct fallback chains:
/// capabilities are detected explicitly, before any mutation is attempted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityReport {
    pub server_version: Capability,
    pub current_role: Capability,
    pub current_database: Capability,
    pub can_create_in_public: Capability,
}

impl CapabilityReport {
    /// Whether a migration run can be expected to succeed
    pub fn can_migrate(&self) -> bool {
        matches!(self.server_version, Capability::Ok(_))
            && matches!(self.can_create_in_public, Capability::Ok(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_success_and_counts() {
        let report = MigrationReport {
            outcomes: vec![
                (1, "a".to_string(), RunOutcome::Skipped),
                (2, "b".to_string(), RunOutcome::Applied),
                (3, "c".to_string(), RunOutcome::Applied),
            ],
            remediation: None,
        };
        assert!(report.succeeded());
        assert_eq!(report.applied_count(), 2);
        assert_eq!(report.skipped_count(), 1);
    }

    #[test]
    fn report_failure_detection() {
        let report = MigrationReport {
            outcomes: vec![(
                1,
                "a".to_string(),
                RunOutcome::Failed {
                    reason: "permission denied".to_string(),
                },
            )],
            remediation: Some("-- sql".to_string()),
        };
        assert!(!report.succeeded());
    }

    #[test]
    fn capability_report_gates_on_create_privilege() {
        let report = CapabilityReport {
            server_version: Capability::Ok("PostgreSQL 15.1".to_string()),
            current_role: Capability::Ok("postgres".to_string()),
            current_database: Capability::Ok("postgres".to_string()),
            can_create_in_public: Capability::Denied("role lacks CREATE on public".to_string()),
        };
        assert!(!report.can_migrate());
    }
}
