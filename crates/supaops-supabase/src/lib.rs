//! Supabase admin surfaces: GoTrue user administration and Edge Functions

// Module declarations
pub mod client;
pub mod error;
pub mod models;

// Public exports
pub use client::SupabaseAdminClient;
pub use error::{SupabaseError, SupabaseResult};
pub use models::{AdminUser, UserPage};
