//! Manual remediation rendering
//!
//! When an apply fails (typically pooled roles lacking DDL privilege), the
//! run stops and prints the exact SQL an operator should paste into the
//! Supabase dashboard SQL editor, including the ledger insert so the next
//! run sees the migration as applied.

use crate::migration::Migration;

/// Render the operator SQL block for a failed migration
pub fn render_remediation(migration: &Migration, ledger_table: &str) -> String {
    let mut block = String::new();
    block.push_str(&format!(
        "-- supaops could not apply migration {:04} ({}).\n",
        migration.id, migration.name
    ));
    block.push_str(
        "-- Run the following in the Supabase dashboard SQL editor with an\n\
         -- admin role, then re-run `supaops migrate status` to confirm.\n",
    );
    block.push_str("BEGIN;\n");
    for statement in &migration.statements {
        block.push_str(statement.trim().trim_end_matches(';'));
        block.push_str(";\n");
    }
    block.push_str(&format!(
        "INSERT INTO {} (id, name, checksum) VALUES ({}, '{}', '{}');\n",
        ledger_table,
        migration.id,
        migration.name,
        migration.checksum()
    ));
    block.push_str("COMMIT;\n");
    block
}

/// Operator guidance when the registry no longer matches the ledger
pub fn render_drift_remedy(id: u32, recorded: &str, computed: &str) -> String {
    format!(
        "migration {id:04} was edited after it shipped: the ledger records checksum\n\
         {recorded} but the registry now computes {computed}.\n\
         Restore the shipped statements, or move the change into a new migration id;\n\
         applied migrations are immutable."
    )
}

/// Operator guidance when another run holds the advisory lock
pub fn render_lock_remedy(lock_key: i64) -> String {
    format!(
        "another supaops run (or a stuck session) holds advisory lock {lock_key}.\n\
         Wait for it to finish and retry, or inspect the holder with:\n\
         SELECT pid, query FROM pg_stat_activity WHERE pid IN\n\
             (SELECT pid FROM pg_locks WHERE locktype = 'advisory');"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::Probe;

    #[test]
    fn remediation_includes_statements_and_ledger_insert() {
        let migration = Migration::new(3, "add_users_role_column")
            .statement("ALTER TABLE users ADD COLUMN IF NOT EXISTS role TEXT DEFAULT 'student';")
            .check(Probe::column("users", "role"));

        let block = render_remediation(&migration, "supaops_migrations");
        assert!(block.starts_with("-- supaops could not apply migration 0003"));
        assert!(block.contains("BEGIN;"));
        assert!(block.contains("ALTER TABLE users ADD COLUMN IF NOT EXISTS role"));
        // The source statement's trailing semicolon is not doubled
        assert!(!block.contains(";;"));
        assert!(block.contains("INSERT INTO supaops_migrations (id, name, checksum) VALUES (3,"));
        assert!(block.contains(&migration.checksum()));
        assert!(block.trim_end().ends_with("COMMIT;"));
    }

    #[test]
    fn drift_remedy_names_both_checksums() {
        let remedy = render_drift_remedy(5, "abc123", "def456");
        assert!(remedy.contains("0005"));
        assert!(remedy.contains("abc123"));
        assert!(remedy.contains("def456"));
        assert!(remedy.contains("new migration id"));
    }

    #[test]
    fn lock_remedy_names_the_lock_key() {
        let remedy = render_lock_remedy(0x5355_5041);
        assert!(remedy.contains(&0x5355_5041_i64.to_string()));
        assert!(remedy.contains("pg_locks"));
    }
}
