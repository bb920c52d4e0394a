//! Postgres-backed migration store
//!
//! Owns the ledger table, the run-level advisory lock, and the transactional
//! apply path. The ledger table name is interpolated into DDL, so it is
//! re-validated here against the identifier grammar even though configuration
//! loading already enforced it.

use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Connection, Postgres};
use std::sync::Arc;
use supaops_common::CorrelationId;
use supaops_config::validation::validate_identifier;
use tokio::sync::Mutex;

use crate::catalog::probe_exists;
use crate::error::{
    DatabaseError, DatabaseErrorExt, DatabaseOperation, DatabaseResult,
};
use crate::migration::{Migration, Probe};
use crate::models::AppliedMigration;
use crate::pool_manager::PoolManager;
use crate::traits::MigrationStore;

/// The connection holding the advisory lock, pinned for the whole run.
/// `pg_advisory_lock` is session-scoped, so every apply must go through
/// this exact connection; returning it to the pool between migrations
/// would let idle-timeout or max-lifetime recycling drop the lock silently.
type LockSession = Arc<Mutex<Option<PoolConnection<Postgres>>>>;

/// [`MigrationStore`] backed by the pool manager's DDL and inspection pools
#[derive(Clone)]
pub struct PgMigrationStore {
    pools: PoolManager,
    session: LockSession,
    ledger_table: String,
    lock_key: i64,
    ddl_timeout_seconds: u64,
}

impl PgMigrationStore {
    /// Create a store for the given ledger table and lock key
    ///
    /// # Errors
    /// Returns an error if the ledger table name is not a plain lowercase
    /// identifier (it is interpolated into DDL, never bound)
    pub fn new(
        pools: PoolManager,
        ledger_table: impl Into<String>,
        lock_key: i64,
        ddl_timeout_seconds: u64,
    ) -> DatabaseResult<Self> {
        let ledger_table = ledger_table.into();
        validate_identifier(&ledger_table, "ledger_table").map_err(|e| {
            DatabaseError::UnexpectedState {
                operation: Box::new(DatabaseOperation::Ledger),
                message: e.to_string(),
                correlation_id: None,
            }
        })?;
        Ok(Self {
            pools,
            session: Arc::new(Mutex::new(None)),
            ledger_table,
            lock_key,
            ddl_timeout_seconds,
        })
    }

    /// The ledger table this store writes to
    pub fn ledger_table(&self) -> &str {
        &self.ledger_table
    }
}

#[async_trait]
impl MigrationStore for PgMigrationStore {
    async fn ensure_ledger(&self) -> DatabaseResult<()> {
        // Runs before the lock session is pinned; the single DDL
        // connection is still in the pool here.
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id BIGINT PRIMARY KEY,
                name TEXT NOT NULL,
                checksum TEXT NOT NULL,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
            self.ledger_table
        );
        sqlx::query(&ddl)
            .execute(self.pools.ddl_pool())
            .await
            .map_db_err(DatabaseOperation::Ledger, None)?;
        Ok(())
    }

    async fn applied_migrations(&self) -> DatabaseResult<Vec<AppliedMigration>> {
        let sql = format!(
            "SELECT id, name, checksum, applied_at FROM {} ORDER BY id",
            self.ledger_table
        );
        sqlx::query_as::<_, AppliedMigration>(&sql)
            .fetch_all(self.pools.inspect_pool())
            .await
            .map_db_err(DatabaseOperation::Ledger, None)
    }

    async fn acquire_lock(&self) -> DatabaseResult<()> {
        let mut conn = self
            .pools
            .ddl_pool()
            .acquire()
            .await
            .map_db_err(DatabaseOperation::Connect, None)?;

        let acquired = sqlx::query_scalar::<_, bool>("SELECT pg_try_advisory_lock($1)")
            .bind(self.lock_key)
            .fetch_one(&mut *conn)
            .await
            .map_db_err(DatabaseOperation::AdvisoryLock, None)?;

        if acquired {
            tracing::debug!(lock_key = self.lock_key, "advisory lock acquired");
            // Pin the connection until release_lock: the lock lives and
            // dies with this session, so it must never return to the pool
            // while migrations are still running.
            *self.session.lock().await = Some(conn);
            Ok(())
        } else {
            Err(DatabaseError::LockUnavailable {
                lock_key: self.lock_key,
            })
        }
    }

    async fn release_lock(&self) -> DatabaseResult<()> {
        let Some(mut conn) = self.session.lock().await.take() else {
            tracing::warn!(
                lock_key = self.lock_key,
                "release_lock called without a held lock session"
            );
            return Ok(());
        };

        let released = sqlx::query_scalar::<_, bool>("SELECT pg_advisory_unlock($1)")
            .bind(self.lock_key)
            .fetch_one(&mut *conn)
            .await
            .map_db_err(DatabaseOperation::AdvisoryLock, None)?;

        if !released {
            tracing::warn!(
                lock_key = self.lock_key,
                "advisory unlock returned false; lock was not held by this session"
            );
        }
        Ok(())
    }

    async fn apply(&self, migration: &Migration) -> DatabaseResult<()> {
        let correlation_id = CorrelationId::new();
        let operation = DatabaseOperation::ApplyMigration {
            id: migration.id,
            name: migration.name.clone(),
        };

        let mut session = self.session.lock().await;
        let conn = session
            .as_mut()
            .ok_or_else(|| DatabaseError::UnexpectedState {
                operation: Box::new(operation.clone()),
                message: "no lock session; acquire_lock must precede apply".to_string(),
                correlation_id: Some(correlation_id),
            })?;

        let mut tx = conn
            .begin()
            .await
            .map_db_err(operation.clone(), Some(correlation_id))?;

        // SET LOCAL cannot take a bind parameter; the value is a validated u64
        let timeout = format!(
            "SET LOCAL statement_timeout = '{}s'",
            self.ddl_timeout_seconds
        );
        sqlx::query(&timeout)
            .execute(&mut *tx)
            .await
            .map_db_err(operation.clone(), Some(correlation_id))?;

        for statement in &migration.statements {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .map_db_err(operation.clone(), Some(correlation_id))?;
        }

        // Probes run on the open transaction, where the DDL above is already
        // visible. A false probe aborts the whole transaction: nothing about
        // a failed migration reaches the database or the ledger.
        for probe in &migration.checks {
            let exists = probe_exists(&mut *tx, probe).await?;
            if !exists {
                return Err(DatabaseError::VerificationFailed {
                    id: migration.id,
                    probe: probe.to_string(),
                });
            }
        }

        let insert = format!(
            "INSERT INTO {} (id, name, checksum) VALUES ($1, $2, $3)",
            self.ledger_table
        );
        sqlx::query(&insert)
            .bind(i64::from(migration.id))
            .bind(&migration.name)
            .bind(migration.checksum())
            .execute(&mut *tx)
            .await
            .map_db_err(DatabaseOperation::Ledger, Some(correlation_id))?;

        tx.commit()
            .await
            .map_db_err(operation.clone(), Some(correlation_id))?;

        tracing::info!(
            id = migration.id,
            name = %migration.name,
            correlation_id = %correlation_id,
            "migration applied"
        );
        Ok(())
    }

    async fn verify(&self, migration: &Migration) -> DatabaseResult<Vec<(Probe, bool)>> {
        let mut results = Vec::with_capacity(migration.checks.len());
        for probe in &migration.checks {
            let exists = probe_exists(self.pools.inspect_pool(), probe).await?;
            results.push((probe.clone(), exists));
        }
        Ok(results)
    }
}
