//! Catalog existence probes
//!
//! Every probe is a single parameterized `SELECT EXISTS` against
//! `information_schema` or `pg_catalog`, scoped to the `public` schema.
//! Probes are generic over the executor so the migration engine can run
//! them on an open transaction, where just-executed DDL is visible before
//! commit.

use async_trait::async_trait;
use sqlx::{Executor, PgPool, Postgres};

use crate::error::{DatabaseErrorExt, DatabaseOperation, DatabaseResult};
use crate::migration::Probe;
use crate::traits::SchemaInspector;

/// Run one probe on any Postgres executor
///
/// # Errors
/// Returns a classified database error when the probe query itself fails
pub async fn probe_exists<'e, E>(executor: E, probe: &Probe) -> DatabaseResult<bool>
where
    E: Executor<'e, Database = Postgres>,
{
    let operation = DatabaseOperation::Probe {
        object: probe.to_string(),
    };

    let exists = match probe {
        Probe::Table { name } => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (
                    SELECT 1 FROM information_schema.tables
                    WHERE table_schema = 'public' AND table_name = $1
                )",
            )
            .bind(name)
            .fetch_one(executor)
            .await
        }
        Probe::Column { table, column } => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (
                    SELECT 1 FROM information_schema.columns
                    WHERE table_schema = 'public' AND table_name = $1 AND column_name = $2
                )",
            )
            .bind(table)
            .bind(column)
            .fetch_one(executor)
            .await
        }
        Probe::Index { name } => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (
                    SELECT 1 FROM pg_indexes
                    WHERE schemaname = 'public' AND indexname = $1
                )",
            )
            .bind(name)
            .fetch_one(executor)
            .await
        }
        Probe::Constraint { table, constraint } => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (
                    SELECT 1 FROM pg_constraint c
                    JOIN pg_class t ON c.conrelid = t.oid
                    JOIN pg_namespace n ON t.relnamespace = n.oid
                    WHERE n.nspname = 'public' AND t.relname = $1 AND c.conname = $2
                )",
            )
            .bind(table)
            .bind(constraint)
            .fetch_one(executor)
            .await
        }
        Probe::Policy { table, policy } => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (
                    SELECT 1 FROM pg_policies
                    WHERE schemaname = 'public' AND tablename = $1 AND policyname = $2
                )",
            )
            .bind(table)
            .bind(policy)
            .fetch_one(executor)
            .await
        }
        Probe::Trigger { table, trigger } => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (
                    SELECT 1 FROM information_schema.triggers
                    WHERE trigger_schema = 'public'
                      AND event_object_table = $1
                      AND trigger_name = $2
                )",
            )
            .bind(table)
            .bind(trigger)
            .fetch_one(executor)
            .await
        }
        Probe::Function { name } => {
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (
                    SELECT 1 FROM pg_proc p
                    JOIN pg_namespace n ON p.pronamespace = n.oid
                    WHERE n.nspname = 'public' AND p.proname = $1
                )",
            )
            .bind(name)
            .fetch_one(executor)
            .await
        }
    };

    exists.map_db_err(operation, None)
}

/// [`SchemaInspector`] backed by a read-only pool
#[derive(Debug, Clone)]
pub struct PgSchemaInspector {
    pool: PgPool,
}

impl PgSchemaInspector {
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SchemaInspector for PgSchemaInspector {
    async fn exists(&self, probe: &Probe) -> DatabaseResult<bool> {
        probe_exists(&self.pool, probe).await
    }
}
