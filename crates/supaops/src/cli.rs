//! Command-line surface

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// supaops - Supabase/PostgreSQL operations toolkit
///
/// Replaces the pile of one-off admin scripts with a small set of
/// idempotent, verifiable commands.
#[derive(Parser, Debug)]
#[command(name = "supaops", author, version, about, long_about = None)]
pub struct Args {
    /// Optional configuration file path (TOML format)
    #[arg(long, short = 'c', global = true)]
    pub config_file: Option<PathBuf>,

    /// Deployment profile (development, staging, production, test)
    ///
    /// Profiles select defaults only, never secrets: staging and
    /// production force SSL unless explicitly overridden.
    #[arg(long, short = 'p', global = true)]
    pub profile: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Schema migrations: status, run, verify
    Migrate {
        #[command(subcommand)]
        action: MigrateAction,
    },

    /// One-off existence checks against the live schema
    Check {
        #[command(subcommand)]
        target: CheckTarget,
    },

    /// Detect connectivity, role, and privileges before mutating anything
    Doctor,

    /// User administration through the Supabase admin API
    User {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Edge Function operations
    #[command(name = "fn")]
    Function {
        #[command(subcommand)]
        action: FunctionAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum MigrateAction {
    /// Show each registered migration's state against the ledger
    Status,

    /// Apply pending migrations in order
    Run {
        /// Plan only; execute nothing
        #[arg(long)]
        dry_run: bool,

        /// Stop after this migration id (inclusive)
        #[arg(long)]
        target: Option<u32>,
    },

    /// Re-run verification probes for applied migrations
    Verify,
}

#[derive(Subcommand, Debug)]
pub enum CheckTarget {
    /// Whether a table exists in the public schema
    Table { name: String },

    /// Whether a column exists on a table
    Column { table: String, column: String },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Look a user up by email and print their admin record
    Show { email: String },

    /// Set the role claim in the user's app metadata
    SetRole { email: String, role: String },

    /// Set a new password for the user
    ResetPassword {
        email: String,

        /// The new password (prefer piping from a secret manager)
        #[arg(long)]
        password: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum FunctionAction {
    /// Invoke an Edge Function and print its JSON response
    Invoke {
        name: String,

        /// JSON payload (defaults to `{}`)
        #[arg(long)]
        payload: Option<String>,
    },
}
