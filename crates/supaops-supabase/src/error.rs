//! Supabase Admin API error taxonomy
//!
//! HTTP status codes are mapped once into variants callers can branch on;
//! response bodies and transport errors are scrubbed of credentials before
//! they are stored in messages.

use supaops_common::scrub_secrets;
use thiserror::Error;

/// Errors from the Supabase admin client
#[derive(Debug, Error)]
pub enum SupabaseError {
    /// The service-role key was rejected (HTTP 401/403)
    #[error("Supabase rejected the service-role credentials: {message}")]
    Auth { message: String },

    /// The addressed resource does not exist (HTTP 404)
    #[error("Supabase resource not found: {message}")]
    NotFound { message: String },

    /// Any other non-success API response
    #[error("Supabase API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never produced a response
    #[error("Supabase request failed: {message}")]
    Transport { message: String },

    /// The response body did not match the expected shape
    #[error("unexpected Supabase response: {message}")]
    InvalidResponse { message: String },

    /// Required configuration is missing
    #[error(transparent)]
    Configuration(#[from] supaops_config::ConfigError),
}

impl From<reqwest::Error> for SupabaseError {
    fn from(error: reqwest::Error) -> Self {
        // reqwest errors embed the full request URL; scrub before storing
        Self::Transport {
            message: scrub_secrets(&error.to_string()),
        }
    }
}

/// Result type for Supabase admin operations
pub type SupabaseResult<T> = Result<T, SupabaseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_display() {
        let err = SupabaseError::Auth {
            message: "invalid claim".to_string(),
        };
        assert!(err.to_string().contains("service-role credentials"));
    }
}
