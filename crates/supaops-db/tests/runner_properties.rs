//! Behavioral tests for the migration runner against the mock store

use supaops_db::mock::MockMigrationStore;
use supaops_db::{
    DatabaseError, Migration, MigrationRunner, MigrationStatus, MigrationStore, Probe, RunOptions,
    RunOutcome,
};

fn registry() -> Vec<Migration> {
    vec![
        Migration::new(1, "create_notifications_table")
            .statement(
                "CREATE TABLE IF NOT EXISTS notifications (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    user_id UUID NOT NULL,
                    message TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )",
            )
            .check(Probe::table("notifications")),
        Migration::new(2, "index_notifications_user_id")
            .statement(
                "CREATE INDEX IF NOT EXISTS idx_notifications_user_id
                 ON notifications (user_id)",
            )
            .check(Probe::index("idx_notifications_user_id")),
        Migration::new(3, "add_users_role_column")
            .statement("ALTER TABLE users ADD COLUMN IF NOT EXISTS role TEXT DEFAULT 'student'")
            .check(Probe::column("users", "role")),
    ]
}

fn runner(store: MockMigrationStore) -> MigrationRunner<MockMigrationStore> {
    MigrationRunner::new(store, registry(), "supaops_migrations").expect("valid registry")
}

#[tokio::test]
async fn fresh_run_applies_everything_in_order() {
    let store = MockMigrationStore::new();
    let run = runner(store.clone());

    let report = run.run(RunOptions::default()).await.expect("run succeeds");
    assert!(report.succeeded());
    assert_eq!(report.applied_count(), 3);
    assert_eq!(store.ledger_ids(), vec![1, 2, 3]);
    assert_eq!(*store.apply_calls.lock().unwrap(), vec![1, 2, 3]);
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let store = MockMigrationStore::new();
    let run = runner(store.clone());

    run.run(RunOptions::default()).await.expect("first run");
    let report = run.run(RunOptions::default()).await.expect("second run");

    assert!(report.succeeded());
    assert_eq!(report.applied_count(), 0);
    assert_eq!(report.skipped_count(), 3);
    // No migration was re-applied
    assert_eq!(store.apply_calls.lock().unwrap().len(), 3);
    assert_eq!(store.ledger_ids(), vec![1, 2, 3]);
}

#[tokio::test]
async fn failure_stops_the_run_and_renders_remediation() {
    let store = MockMigrationStore::new();
    store.fail_apply_of(2);
    let run = runner(store.clone());

    let report = run.run(RunOptions::default()).await.expect("run completes");

    assert!(!report.succeeded());
    assert_eq!(report.applied_count(), 1);
    assert!(matches!(
        report.outcomes[1].2,
        RunOutcome::Failed { .. }
    ));
    // Migration 3 was never attempted
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(*store.apply_calls.lock().unwrap(), vec![1, 2]);
    // The failed migration left no ledger row
    assert_eq!(store.ledger_ids(), vec![1]);

    let remediation = report.remediation.expect("remediation present on failure");
    assert!(remediation.contains("idx_notifications_user_id"));
    assert!(remediation.contains("INSERT INTO supaops_migrations"));
    // The lock was released despite the failure
    assert!(!store.lock_held());
}

#[tokio::test]
async fn dry_run_plans_without_mutating() {
    let store = MockMigrationStore::new();
    store.seed_applied(&registry()[0]);
    let run = runner(store.clone());

    let report = run
        .run(RunOptions {
            dry_run: true,
            target: None,
        })
        .await
        .expect("dry run succeeds");

    assert_eq!(report.outcomes[0].2, RunOutcome::Skipped);
    assert_eq!(report.outcomes[1].2, RunOutcome::Planned);
    assert_eq!(report.outcomes[2].2, RunOutcome::Planned);
    // Nothing executed, nothing locked
    assert!(store.apply_calls.lock().unwrap().is_empty());
    assert!(!store.lock_held());
    assert_eq!(store.ledger_ids(), vec![1]);
}

#[tokio::test]
async fn target_bounds_the_run() {
    let store = MockMigrationStore::new();
    let run = runner(store.clone());

    let report = run
        .run(RunOptions {
            dry_run: false,
            target: Some(2),
        })
        .await
        .expect("run succeeds");

    assert_eq!(report.applied_count(), 2);
    assert_eq!(store.ledger_ids(), vec![1, 2]);
}

#[tokio::test]
async fn drift_refuses_to_run() {
    let store = MockMigrationStore::new();
    store.seed_drifted(&registry()[0]);
    let run = runner(store.clone());

    let err = run
        .run(RunOptions::default())
        .await
        .expect_err("drift must abort the run");
    assert!(matches!(err, DatabaseError::ChecksumMismatch { id: 1, .. }));
    // Nothing was applied past the drift check
    assert!(store.apply_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn lock_contention_aborts_before_any_apply() {
    let store = MockMigrationStore::new();
    store.contend_lock();
    let run = runner(store.clone());

    let err = run
        .run(RunOptions::default())
        .await
        .expect_err("contended lock must abort");
    assert!(matches!(err, DatabaseError::LockUnavailable { .. }));
    assert!(store.apply_calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn apply_requires_the_lock_session() {
    let store = MockMigrationStore::new();
    let migrations = registry();

    let err = store
        .apply(&migrations[0])
        .await
        .expect_err("apply without the lock must be refused");
    assert!(err.to_string().contains("acquire_lock"));
    assert!(store.ledger_ids().is_empty());

    store.acquire_lock().await.expect("lock acquires");
    store
        .apply(&migrations[0])
        .await
        .expect("apply on the lock session");
    store.release_lock().await.expect("lock releases");
    assert_eq!(store.ledger_ids(), vec![1]);
}

#[tokio::test]
async fn status_reflects_ledger_state() {
    let store = MockMigrationStore::new();
    store.seed_applied(&registry()[0]);
    let run = runner(store);

    let status = run.status().await.expect("status succeeds");
    assert!(matches!(status[0].status, MigrationStatus::Applied { .. }));
    assert_eq!(status[1].status, MigrationStatus::Pending);
    assert_eq!(status[2].status, MigrationStatus::Pending);
}

#[tokio::test]
async fn verify_covers_only_applied_migrations() {
    let store = MockMigrationStore::new();
    store.seed_applied(&registry()[0]);
    store.seed_applied(&registry()[1]);
    let run = runner(store);

    let results = run.verify().await.expect("verify succeeds");
    // One probe per applied migration; migration 3 is pending and skipped
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|(_, _, ok)| *ok));
    assert!(results.iter().all(|(id, _, _)| *id != 3));
}
