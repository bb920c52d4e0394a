//! Declarative migration definitions
//!
//! A [`Migration`] is the unit the script corpus expressed as one ad-hoc
//! Node file: a fixed id, the DDL statements, and the catalog probes that
//! prove the change landed. Ids are append-only and strictly ordered;
//! checksums detect edits to statements that already shipped.

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};

use crate::error::{DatabaseError, DatabaseResult};
use crate::models::{AppliedMigration, MigrationStatus, StatusLine};

/// A catalog existence probe
///
/// All probes are parameterized, read-only queries against
/// `information_schema` / `pg_catalog`; see `catalog` for the SQL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Probe {
    Table { name: String },
    Column { table: String, column: String },
    Index { name: String },
    Constraint { table: String, constraint: String },
    Policy { table: String, policy: String },
    Trigger { table: String, trigger: String },
    Function { name: String },
}

impl Probe {
    pub fn table(name: impl Into<String>) -> Self {
        Self::Table { name: name.into() }
    }

    pub fn column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::Column {
            table: table.into(),
            column: column.into(),
        }
    }

    pub fn index(name: impl Into<String>) -> Self {
        Self::Index { name: name.into() }
    }

    pub fn constraint(table: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self::Constraint {
            table: table.into(),
            constraint: constraint.into(),
        }
    }

    pub fn policy(table: impl Into<String>, policy: impl Into<String>) -> Self {
        Self::Policy {
            table: table.into(),
            policy: policy.into(),
        }
    }

    pub fn trigger(table: impl Into<String>, trigger: impl Into<String>) -> Self {
        Self::Trigger {
            table: table.into(),
            trigger: trigger.into(),
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::Function { name: name.into() }
    }
}

impl std::fmt::Display for Probe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Table { name } => write!(f, "table \"{name}\""),
            Self::Column { table, column } => write!(f, "column \"{table}\".\"{column}\""),
            Self::Index { name } => write!(f, "index \"{name}\""),
            Self::Constraint { table, constraint } => {
                write!(f, "constraint \"{constraint}\" on \"{table}\"")
            }
            Self::Policy { table, policy } => write!(f, "policy \"{policy}\" on \"{table}\""),
            Self::Trigger { table, trigger } => write!(f, "trigger \"{trigger}\" on \"{table}\""),
            Self::Function { name } => write!(f, "function \"{name}\""),
        }
    }
}

/// One versioned, verifiable schema change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Migration {
    /// Unique, strictly increasing id
    pub id: u32,
    /// Short snake_case summary, e.g. `add_users_role_column`
    pub name: String,
    /// DDL/DML statements, applied in order inside one transaction
    pub statements: Vec<String>,
    /// Probes that must all come back true after the statements run
    pub checks: Vec<Probe>,
}

impl Migration {
    /// Start a new migration definition
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            statements: Vec::new(),
            checks: Vec::new(),
        }
    }

    /// Append a statement
    #[must_use]
    pub fn statement(mut self, sql: impl Into<String>) -> Self {
        self.statements.push(sql.into());
        self
    }

    /// Append a verification probe
    #[must_use]
    pub fn check(mut self, probe: Probe) -> Self {
        self.checks.push(probe);
        self
    }

    /// SHA-256 over the statement list
    ///
    /// Recorded in the ledger at apply time; a later mismatch means the
    /// registry was edited after this migration shipped.
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        for statement in &self.statements {
            hasher.update(statement.as_bytes());
            hasher.update(b"\n");
        }
        format!("{:x}", hasher.finalize())
    }
}

/// Validate registry invariants: non-empty names, unique and strictly
/// increasing ids, at least one statement and one probe per migration
///
/// # Errors
/// Returns `DatabaseError::InvalidRegistry` naming the first violation
pub fn validate_registry(registry: &[Migration]) -> DatabaseResult<()> {
    let mut previous: Option<u32> = None;
    for migration in registry {
        if migration.name.trim().is_empty() {
            return Err(DatabaseError::InvalidRegistry {
                message: format!("migration {:04} has an empty name", migration.id),
            });
        }
        if migration.statements.is_empty() {
            return Err(DatabaseError::InvalidRegistry {
                message: format!("migration {:04} has no statements", migration.id),
            });
        }
        if migration.checks.is_empty() {
            return Err(DatabaseError::InvalidRegistry {
                message: format!("migration {:04} has no verification probes", migration.id),
            });
        }
        if let Some(prev) = previous
            && migration.id <= prev
        {
            return Err(DatabaseError::InvalidRegistry {
                message: format!(
                    "migration ids must be strictly increasing ({} follows {prev})",
                    migration.id
                ),
            });
        }
        previous = Some(migration.id);
    }
    Ok(())
}

/// Compute per-migration status against ledger rows
///
/// Ledger rows with ids the registry no longer contains are logged and
/// otherwise ignored (the ledger is the source of truth for what ran; the
/// registry is the source of truth for what should exist).
pub fn registry_status(registry: &[Migration], applied: &[AppliedMigration]) -> Vec<StatusLine> {
    for row in applied {
        if !registry
            .iter()
            .any(|m| i64::from(m.id) == row.id)
        {
            tracing::warn!(
                id = row.id,
                name = %row.name,
                "ledger contains a migration the registry no longer defines"
            );
        }
    }

    registry
        .iter()
        .map(|migration| {
            let status = applied
                .iter()
                .find(|row| row.id == i64::from(migration.id))
                .map_or(MigrationStatus::Pending, |row| {
                    let computed = migration.checksum();
                    if row.checksum == computed {
                        MigrationStatus::Applied {
                            applied_at: row.applied_at,
                        }
                    } else {
                        MigrationStatus::Drifted {
                            recorded: row.checksum.clone(),
                            computed,
                        }
                    }
                });
            StatusLine {
                id: migration.id,
                name: migration.name.clone(),
                status,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(id: u32, name: &str) -> Migration {
        Migration::new(id, name)
            .statement("ALTER TABLE users ADD COLUMN IF NOT EXISTS role TEXT DEFAULT 'student'")
            .check(Probe::column("users", "role"))
    }

    #[test]
    fn checksum_is_stable_and_statement_sensitive() {
        let a = sample(1, "add_role");
        let b = sample(1, "add_role");
        assert_eq!(a.checksum(), b.checksum());

        let c = a.clone().statement("CREATE INDEX idx ON users(role)");
        assert_ne!(a.checksum(), c.checksum());
    }

    #[test]
    fn registry_rejects_out_of_order_ids() {
        let registry = vec![sample(2, "a"), sample(1, "b")];
        assert!(validate_registry(&registry).is_err());
    }

    #[test]
    fn registry_rejects_duplicate_ids() {
        let registry = vec![sample(1, "a"), sample(1, "b")];
        assert!(validate_registry(&registry).is_err());
    }

    #[test]
    fn registry_rejects_unverifiable_migrations() {
        let no_checks = Migration::new(1, "no_checks").statement("SELECT 1");
        assert!(validate_registry(&[no_checks]).is_err());
    }

    #[test]
    fn status_distinguishes_applied_pending_drifted() {
        let registry = vec![sample(1, "a"), sample(2, "b"), sample(3, "c")];
        let applied = vec![
            AppliedMigration {
                id: 1,
                name: "a".to_string(),
                checksum: registry[0].checksum(),
                applied_at: Utc::now(),
            },
            AppliedMigration {
                id: 2,
                name: "b".to_string(),
                checksum: "different".to_string(),
                applied_at: Utc::now(),
            },
        ];

        let status = registry_status(&registry, &applied);
        assert!(matches!(status[0].status, MigrationStatus::Applied { .. }));
        assert!(matches!(status[1].status, MigrationStatus::Drifted { .. }));
        assert_eq!(status[2].status, MigrationStatus::Pending);
    }
}
