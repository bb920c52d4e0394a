//! The built-in migration registry
//!
//! Each entry replaces a family of one-off admin scripts that used to be
//! run by hand against production. Ids are append-only: never renumber or
//! edit a shipped entry's statements (the ledger checksum will refuse to
//! run), add a new one instead.

use supaops_db::{Migration, Probe};

/// All registered migrations, in apply order
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration::new(1, "create_notifications_table")
            .statement(
                "CREATE TABLE IF NOT EXISTS notifications (
                    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                    user_id UUID NOT NULL REFERENCES auth.users (id) ON DELETE CASCADE,
                    type TEXT NOT NULL,
                    message TEXT NOT NULL,
                    data JSONB NOT NULL DEFAULT '{}'::jsonb,
                    read BOOLEAN NOT NULL DEFAULT false,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
                )",
            )
            .statement("ALTER TABLE notifications ENABLE ROW LEVEL SECURITY")
            .check(Probe::table("notifications"))
            .check(Probe::column("notifications", "data")),
        Migration::new(2, "index_notifications_user_id")
            .statement(
                "CREATE INDEX IF NOT EXISTS idx_notifications_user_id
                 ON notifications (user_id, created_at DESC)",
            )
            .check(Probe::index("idx_notifications_user_id")),
        Migration::new(3, "notifications_rls_policies")
            .statement(
                "DO $$ BEGIN
                    CREATE POLICY notifications_select_own ON notifications
                        FOR SELECT USING (auth.uid() = user_id);
                EXCEPTION WHEN duplicate_object THEN NULL;
                END $$",
            )
            .statement(
                "DO $$ BEGIN
                    CREATE POLICY notifications_update_own ON notifications
                        FOR UPDATE USING (auth.uid() = user_id);
                EXCEPTION WHEN duplicate_object THEN NULL;
                END $$",
            )
            .check(Probe::policy("notifications", "notifications_select_own"))
            .check(Probe::policy("notifications", "notifications_update_own")),
        Migration::new(4, "add_users_role_column")
            .statement(
                "ALTER TABLE users
                 ADD COLUMN IF NOT EXISTS role TEXT NOT NULL DEFAULT 'student'",
            )
            .check(Probe::column("users", "role")),
        Migration::new(5, "add_case_study_request_ratings")
            .statement(
                "ALTER TABLE case_study_requests
                 ADD COLUMN IF NOT EXISTS rating INTEGER,
                 ADD COLUMN IF NOT EXISTS rating_comment TEXT",
            )
            .statement(
                "DO $$ BEGIN
                    ALTER TABLE case_study_requests
                        ADD CONSTRAINT case_study_requests_rating_range
                        CHECK (rating BETWEEN 1 AND 5);
                EXCEPTION WHEN duplicate_object THEN NULL;
                END $$",
            )
            .check(Probe::column("case_study_requests", "rating"))
            .check(Probe::column("case_study_requests", "rating_comment"))
            .check(Probe::constraint(
                "case_study_requests",
                "case_study_requests_rating_range",
            )),
        Migration::new(6, "notify_instructor_on_submission")
            .statement(
                "CREATE OR REPLACE FUNCTION notify_instructor_on_submission()
                 RETURNS trigger
                 LANGUAGE plpgsql
                 SECURITY DEFINER
                 AS $$
                 BEGIN
                     INSERT INTO notifications (user_id, type, message, data)
                     SELECT cs.instructor_id,
                            'submission',
                            'A student submitted a case study response',
                            jsonb_build_object('submission_id', NEW.id)
                     FROM case_studies cs
                     WHERE cs.id = NEW.case_study_id;
                     RETURN NEW;
                 EXCEPTION WHEN OTHERS THEN
                     -- Notification failure must never block the submission
                     RAISE WARNING 'notify_instructor_on_submission failed: %', SQLERRM;
                     RETURN NEW;
                 END;
                 $$",
            )
            .statement("DROP TRIGGER IF EXISTS trg_notify_instructor ON submissions")
            .statement(
                "CREATE TRIGGER trg_notify_instructor
                 AFTER INSERT ON submissions
                 FOR EACH ROW EXECUTE FUNCTION notify_instructor_on_submission()",
            )
            .check(Probe::function("notify_instructor_on_submission"))
            .check(Probe::trigger("submissions", "trg_notify_instructor")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use supaops_db::validate_registry;

    #[test]
    fn builtin_registry_is_valid() {
        let registry = migrations();
        assert!(!registry.is_empty());
        validate_registry(&registry).expect("builtin registry must validate");
    }

    #[test]
    fn every_migration_verifies_what_it_creates() {
        for migration in migrations() {
            assert!(
                !migration.checks.is_empty(),
                "migration {:04} has no probes",
                migration.id
            );
        }
    }
}
