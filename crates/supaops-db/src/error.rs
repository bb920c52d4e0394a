//! Database error taxonomy
//!
//! The script corpus classified failures by substring-matching error text
//! ("column does not exist", "ECONNREFUSED", ...). Here every sqlx error is
//! classified once, from its SQLSTATE code, into [`DbErrorKind`]; callers
//! branch on the kind, never on message text. Messages are scrubbed of
//! credentials before they are stored.

use supaops_common::{CorrelationId, scrub_secrets};
use thiserror::Error;

/// What a database failure actually was, derived from SQLSTATE
///
/// Distinguishes the three cases the corpus's fallback chains conflated:
/// insufficient privilege, network failure, and already-satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// Authentication failed (SQLSTATE 28xxx)
    Auth,
    /// The role lacks privilege for the operation (42501)
    InsufficientPrivilege,
    /// Target database does not exist (3D000)
    UnknownDatabase,
    /// Referenced table/column/object does not exist (42P01, 42703, 42704)
    MissingObject,
    /// Object already exists (42P07, 42701, 42710, 42723)
    AlreadyExists,
    /// Constraint violation (23xxx)
    Constraint,
    /// Statement or lock timeout (57014, 55P03)
    Timeout,
    /// Could not reach the server at all
    Connection,
    /// Anything else
    Other,
}

impl DbErrorKind {
    /// Classify a SQLSTATE code
    pub fn from_sqlstate(code: &str) -> Self {
        match code {
            "42501" => Self::InsufficientPrivilege,
            "3D000" => Self::UnknownDatabase,
            "42P01" | "42703" | "42704" => Self::MissingObject,
            "42P07" | "42701" | "42710" | "42723" => Self::AlreadyExists,
            "57014" | "55P03" => Self::Timeout,
            _ if code.starts_with("28") => Self::Auth,
            _ if code.starts_with("23") => Self::Constraint,
            _ if code.starts_with("08") => Self::Connection,
            _ => Self::Other,
        }
    }

    /// Whether this failure could succeed on retry without operator action
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::Timeout | Self::Connection)
    }
}

impl std::fmt::Display for DbErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Auth => "authentication failure",
            Self::InsufficientPrivilege => "insufficient privilege",
            Self::UnknownDatabase => "unknown database",
            Self::MissingObject => "missing object",
            Self::AlreadyExists => "already exists",
            Self::Constraint => "constraint violation",
            Self::Timeout => "timeout",
            Self::Connection => "connection failure",
            Self::Other => "database error",
        };
        write!(f, "{name}")
    }
}

/// The operation that was in flight when a database error occurred
#[derive(Debug, Clone)]
pub enum DatabaseOperation {
    /// Opening a connection pool
    Connect,
    /// Taking or releasing the migration advisory lock
    AdvisoryLock,
    /// Creating or reading the migration ledger
    Ledger,
    /// Probing the system catalogs for an object
    Probe { object: String },
    /// Applying a registered migration
    ApplyMigration { id: u32, name: String },
    /// Re-running a migration's verification probes
    VerifyMigration { id: u32 },
    /// Running a capability check
    Capability { check: String },
    /// Anything else
    Query { description: String },
}

impl std::fmt::Display for DatabaseOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::AdvisoryLock => write!(f, "advisory lock"),
            Self::Ledger => write!(f, "migration ledger"),
            Self::Probe { object } => write!(f, "probe {object}"),
            Self::ApplyMigration { id, name } => write!(f, "apply migration {id:04} ({name})"),
            Self::VerifyMigration { id } => write!(f, "verify migration {id:04}"),
            Self::Capability { check } => write!(f, "capability check ({check})"),
            Self::Query { description } => write!(f, "query ({description})"),
        }
    }
}

/// Errors from the supaops database layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A classified failure from the database driver
    #[error("{kind} during {operation}: {message}")]
    Classified {
        operation: Box<DatabaseOperation>,
        kind: DbErrorKind,
        message: String,
        correlation_id: Option<CorrelationId>,
    },

    /// Another supaops process holds the migration lock
    #[error("another migration run holds the advisory lock (key {lock_key})")]
    LockUnavailable { lock_key: i64 },

    /// The registry's statements no longer match what the ledger recorded
    #[error(
        "migration {id:04} checksum mismatch: ledger has {recorded}, registry computes {computed} - the registry drifted after this migration was applied"
    )]
    ChecksumMismatch {
        id: u32,
        recorded: String,
        computed: String,
    },

    /// Post-DDL verification probe came back false
    #[error("migration {id:04} verification failed: {probe} not found after apply")]
    VerificationFailed { id: u32, probe: String },

    /// The registry itself is malformed (duplicate or unordered ids)
    #[error("invalid migration registry: {message}")]
    InvalidRegistry { message: String },

    /// Invariant violation that is not attributable to the driver
    #[error("unexpected state during {operation}: {message}")]
    UnexpectedState {
        operation: Box<DatabaseOperation>,
        message: String,
        correlation_id: Option<CorrelationId>,
    },
}

impl DatabaseError {
    /// The classified kind, when one applies
    pub fn kind(&self) -> Option<DbErrorKind> {
        match self {
            Self::Classified { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

/// Result type for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Extension trait mapping sqlx errors into classified [`DatabaseError`]s
pub trait DatabaseErrorExt<T> {
    /// Attach the in-flight operation and classify the failure
    fn map_db_err(
        self,
        operation: DatabaseOperation,
        correlation_id: Option<CorrelationId>,
    ) -> DatabaseResult<T>;
}

impl<T> DatabaseErrorExt<T> for Result<T, sqlx::Error> {
    fn map_db_err(
        self,
        operation: DatabaseOperation,
        correlation_id: Option<CorrelationId>,
    ) -> DatabaseResult<T> {
        self.map_err(|e| classify_sqlx_error(e, operation, correlation_id))
    }
}

/// Classify a sqlx error into a [`DatabaseError::Classified`]
fn classify_sqlx_error(
    error: sqlx::Error,
    operation: DatabaseOperation,
    correlation_id: Option<CorrelationId>,
) -> DatabaseError {
    let kind = match &error {
        sqlx::Error::Database(db) => db
            .code()
            .map_or(DbErrorKind::Other, |code| DbErrorKind::from_sqlstate(&code)),
        sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::Configuration(_) => {
            DbErrorKind::Connection
        }
        sqlx::Error::PoolTimedOut => DbErrorKind::Timeout,
        _ => DbErrorKind::Other,
    };

    let message = scrub_secrets(&error.to_string());
    tracing::error!(
        kind = %kind,
        operation = %operation,
        error = %message,
        "database operation failed"
    );

    DatabaseError::Classified {
        operation: Box::new(operation),
        kind,
        message,
        correlation_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlstate_classification_table() {
        assert_eq!(
            DbErrorKind::from_sqlstate("28P01"),
            DbErrorKind::Auth,
            "bad password"
        );
        assert_eq!(
            DbErrorKind::from_sqlstate("42501"),
            DbErrorKind::InsufficientPrivilege
        );
        assert_eq!(
            DbErrorKind::from_sqlstate("3D000"),
            DbErrorKind::UnknownDatabase
        );
        assert_eq!(
            DbErrorKind::from_sqlstate("42P01"),
            DbErrorKind::MissingObject,
            "undefined table"
        );
        assert_eq!(
            DbErrorKind::from_sqlstate("42703"),
            DbErrorKind::MissingObject,
            "undefined column"
        );
        assert_eq!(
            DbErrorKind::from_sqlstate("42P07"),
            DbErrorKind::AlreadyExists,
            "duplicate table"
        );
        assert_eq!(
            DbErrorKind::from_sqlstate("42701"),
            DbErrorKind::AlreadyExists,
            "duplicate column"
        );
        assert_eq!(
            DbErrorKind::from_sqlstate("23505"),
            DbErrorKind::Constraint,
            "unique violation"
        );
        assert_eq!(DbErrorKind::from_sqlstate("57014"), DbErrorKind::Timeout);
        assert_eq!(
            DbErrorKind::from_sqlstate("08006"),
            DbErrorKind::Connection,
            "connection failure class"
        );
        assert_eq!(DbErrorKind::from_sqlstate("XX000"), DbErrorKind::Other);
    }

    #[test]
    fn transient_kinds() {
        assert!(DbErrorKind::Timeout.is_transient());
        assert!(DbErrorKind::Connection.is_transient());
        assert!(!DbErrorKind::InsufficientPrivilege.is_transient());
        assert!(!DbErrorKind::Auth.is_transient());
    }

    #[test]
    fn error_display_includes_operation() {
        let err = DatabaseError::Classified {
            operation: Box::new(DatabaseOperation::ApplyMigration {
                id: 3,
                name: "add_users_role_column".to_string(),
            }),
            kind: DbErrorKind::InsufficientPrivilege,
            message: "permission denied for table users".to_string(),
            correlation_id: None,
        };
        let text = err.to_string();
        assert!(text.contains("insufficient privilege"));
        assert!(text.contains("0003"));
        assert!(text.contains("add_users_role_column"));
    }
}
