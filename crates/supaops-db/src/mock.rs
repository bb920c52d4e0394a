//! Mock implementations of the store and inspector traits for testing

// Allow test-specific patterns in mock implementation
#![allow(clippy::unwrap_used)] // Mocks can panic on lock poisoning
#![allow(clippy::expect_used)] // Test code can use expect
#![allow(clippy::significant_drop_tightening)] // Mock locks don't need optimization

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use crate::error::{DatabaseError, DatabaseOperation, DatabaseResult, DbErrorKind};
use crate::migration::{Migration, Probe};
use crate::models::AppliedMigration;
use crate::traits::{MigrationStore, SchemaInspector};

// Type aliases to simplify complex types
type Ledger = Arc<Mutex<Vec<AppliedMigration>>>;
type IdSet = Arc<Mutex<HashSet<u32>>>;

/// Mock migration store for testing the runner
#[derive(Clone, Default)]
pub struct MockMigrationStore {
    pub ledger: Ledger,
    pub apply_calls: Arc<Mutex<Vec<u32>>>,

    // Behavior controls for testing
    pub fail_apply_ids: IdSet,
    pub lock_contended: Arc<Mutex<bool>>,
    pub locked: Arc<Mutex<bool>>,
}

impl MockMigrationStore {
    /// Create a new mock store with an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the ledger as if the migration had been applied earlier
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned
    pub fn seed_applied(&self, migration: &Migration) {
        self.ledger.lock().unwrap().push(AppliedMigration {
            id: i64::from(migration.id),
            name: migration.name.clone(),
            checksum: migration.checksum(),
            applied_at: Utc::now(),
        });
    }

    /// Seed a ledger row whose checksum no longer matches the registry
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned
    pub fn seed_drifted(&self, migration: &Migration) {
        self.ledger.lock().unwrap().push(AppliedMigration {
            id: i64::from(migration.id),
            name: migration.name.clone(),
            checksum: "stale-checksum".to_string(),
            applied_at: Utc::now(),
        });
    }

    /// Configure apply of the given id to fail with insufficient privilege
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned
    pub fn fail_apply_of(&self, id: u32) {
        self.fail_apply_ids.lock().unwrap().insert(id);
    }

    /// Simulate another process holding the advisory lock
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned
    pub fn contend_lock(&self) {
        *self.lock_contended.lock().unwrap() = true;
    }

    /// Ids currently in the ledger, in insertion order
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned
    pub fn ledger_ids(&self) -> Vec<i64> {
        self.ledger.lock().unwrap().iter().map(|row| row.id).collect()
    }

    /// Whether the mock currently holds the lock
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned
    pub fn lock_held(&self) -> bool {
        *self.locked.lock().unwrap()
    }
}

#[async_trait]
impl MigrationStore for MockMigrationStore {
    async fn ensure_ledger(&self) -> DatabaseResult<()> {
        Ok(())
    }

    async fn applied_migrations(&self) -> DatabaseResult<Vec<AppliedMigration>> {
        Ok(self.ledger.lock().unwrap().clone())
    }

    async fn acquire_lock(&self) -> DatabaseResult<()> {
        if *self.lock_contended.lock().unwrap() {
            return Err(DatabaseError::LockUnavailable { lock_key: 0 });
        }
        *self.locked.lock().unwrap() = true;
        Ok(())
    }

    async fn release_lock(&self) -> DatabaseResult<()> {
        *self.locked.lock().unwrap() = false;
        Ok(())
    }

    async fn apply(&self, migration: &Migration) -> DatabaseResult<()> {
        // Same precondition as the Postgres store: applies only run on the
        // session that holds the advisory lock.
        if !*self.locked.lock().unwrap() {
            return Err(DatabaseError::UnexpectedState {
                operation: Box::new(DatabaseOperation::ApplyMigration {
                    id: migration.id,
                    name: migration.name.clone(),
                }),
                message: "no lock session; acquire_lock must precede apply".to_string(),
                correlation_id: None,
            });
        }

        self.apply_calls.lock().unwrap().push(migration.id);

        if self.fail_apply_ids.lock().unwrap().contains(&migration.id) {
            return Err(DatabaseError::Classified {
                operation: Box::new(DatabaseOperation::ApplyMigration {
                    id: migration.id,
                    name: migration.name.clone(),
                }),
                kind: DbErrorKind::InsufficientPrivilege,
                message: "permission denied for schema public".to_string(),
                correlation_id: None,
            });
        }

        self.ledger.lock().unwrap().push(AppliedMigration {
            id: i64::from(migration.id),
            name: migration.name.clone(),
            checksum: migration.checksum(),
            applied_at: Utc::now(),
        });
        Ok(())
    }

    async fn verify(&self, migration: &Migration) -> DatabaseResult<Vec<(Probe, bool)>> {
        Ok(migration
            .checks
            .iter()
            .map(|probe| (probe.clone(), true))
            .collect())
    }
}

/// Mock schema inspector backed by a set of known objects
#[derive(Clone, Default)]
pub struct MockSchemaInspector {
    pub objects: Arc<Mutex<HashSet<String>>>,
}

impl MockSchemaInspector {
    /// Create an inspector that knows no objects
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object so its probe reports existence
    ///
    /// # Panics
    /// Panics if the internal mutex is poisoned
    pub fn add_object(&self, probe: &Probe) {
        self.objects.lock().unwrap().insert(probe.to_string());
    }
}

#[async_trait]
impl SchemaInspector for MockSchemaInspector {
    async fn exists(&self, probe: &Probe) -> DatabaseResult<bool> {
        Ok(self.objects.lock().unwrap().contains(&probe.to_string()))
    }
}
