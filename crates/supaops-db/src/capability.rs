//! Explicit capability detection
//!
//! Runs before anything mutates: server version, connected role and
//! database, and whether that role can CREATE in the public schema. Each
//! check degrades independently so one denied privilege still yields a
//! complete report.

use sqlx::PgPool;

use crate::error::{DatabaseErrorExt, DatabaseOperation, DatabaseResult, DbErrorKind};
use crate::models::{Capability, CapabilityReport};

/// Run the full capability probe sequence
///
/// # Errors
/// Never fails on a denied check; only infrastructure-level errors (the
/// probes themselves erroring unexpectedly) are still reported per check
/// as `Capability::Unknown`, so this returns `Ok` in practice
pub async fn run_checks(pool: &PgPool) -> DatabaseResult<CapabilityReport> {
    let server_version = scalar_check(pool, "SELECT version()", "server version").await;
    let current_role = scalar_check(pool, "SELECT current_user::text", "current role").await;
    let current_database =
        scalar_check(pool, "SELECT current_database()", "current database").await;
    let can_create_in_public = create_privilege_check(pool).await;

    Ok(CapabilityReport {
        server_version,
        current_role,
        current_database,
        can_create_in_public,
    })
}

async fn scalar_check(pool: &PgPool, sql: &str, check: &str) -> Capability {
    let result = sqlx::query_scalar::<_, String>(sql)
        .fetch_one(pool)
        .await
        .map_db_err(
            DatabaseOperation::Capability {
                check: check.to_string(),
            },
            None,
        );

    match result {
        Ok(value) => Capability::Ok(value),
        Err(e) => classify_failure(&e),
    }
}

async fn create_privilege_check(pool: &PgPool) -> Capability {
    let result = sqlx::query_scalar::<_, bool>(
        "SELECT has_schema_privilege(current_user, 'public', 'CREATE')",
    )
    .fetch_one(pool)
    .await
    .map_db_err(
        DatabaseOperation::Capability {
            check: "CREATE on schema public".to_string(),
        },
        None,
    );

    match result {
        Ok(true) => Capability::Ok("role can CREATE in schema public".to_string()),
        Ok(false) => Capability::Denied("role lacks CREATE on schema public".to_string()),
        Err(e) => classify_failure(&e),
    }
}

fn classify_failure(error: &crate::error::DatabaseError) -> Capability {
    match error.kind() {
        Some(DbErrorKind::Auth | DbErrorKind::InsufficientPrivilege) => {
            Capability::Denied(error.to_string())
        }
        _ => Capability::Unknown(error.to_string()),
    }
}
