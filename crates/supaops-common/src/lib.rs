//! Common utilities shared across supaops crates
//!
//! Credential redaction, correlation IDs, and environment bootstrap used by
//! the other workspace members.

pub mod correlation;
pub mod init;
pub mod redact;

pub use correlation::CorrelationId;
pub use init::initialize_environment;
pub use redact::{fingerprint_secret, scrub_secrets};
