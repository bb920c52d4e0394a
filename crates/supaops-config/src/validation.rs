//! Configuration validation framework

use crate::{ConfigError, ConfigResult};
use once_cell::sync::Lazy;
use regex::Regex;

/// URL validation regex; `None` if the pattern fails to compile
static URL_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#].[^\s]*$").ok());

/// SQL identifier regex; `None` if the pattern fails to compile
static IDENT_REGEX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").ok());

/// Trait for validating configuration values
pub trait Validate {
    /// Validate this configuration object
    ///
    /// # Errors
    /// Returns validation errors if the configuration is invalid
    fn validate(&self) -> ConfigResult<()>;
}

/// Validate a URL string
///
/// # Errors
/// Returns `ConfigError::InvalidUrl` if the URL format is invalid
pub fn validate_url(url: &str, _field_name: &str) -> ConfigResult<()> {
    URL_REGEX.as_ref().map_or_else(
        || {
            // If regex compilation failed, do basic validation
            if url.starts_with("http://") || url.starts_with("https://") {
                Ok(())
            } else {
                Err(ConfigError::InvalidUrl {
                    url: url.to_string(),
                })
            }
        },
        |regex| {
            if regex.is_match(url) {
                Ok(())
            } else {
                Err(ConfigError::InvalidUrl {
                    url: url.to_string(),
                })
            }
        },
    )
}

/// Validate a port number
///
/// # Errors
/// Returns `ConfigError::InvalidPort` if port is 0
pub const fn validate_port(port: u16, _field_name: &str) -> ConfigResult<()> {
    if port == 0 {
        Err(ConfigError::InvalidPort { port })
    } else {
        Ok(())
    }
}

/// Validate a value is within a range
///
/// # Errors
/// Returns `ConfigError::OutOfRange` if value is outside the specified range
pub fn validate_range(value: u64, min: u64, max: u64, field_name: &str) -> ConfigResult<()> {
    if value < min || value > max {
        Err(ConfigError::OutOfRange {
            field: field_name.to_string(),
            value,
            min,
            max,
        })
    } else {
        Ok(())
    }
}

/// Validate a string is not empty
///
/// # Errors
/// Returns `ConfigError::MissingField` if the string is empty or whitespace-only
pub fn validate_non_empty(value: &str, field_name: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        Err(ConfigError::MissingField {
            field: field_name.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Validate a string is a plain lowercase SQL identifier
///
/// Used for names that end up interpolated into DDL (the migration ledger
/// table); anything that is not a bare identifier is rejected up front.
///
/// # Errors
/// Returns `ConfigError::InvalidIdentifier` if the value is not a bare identifier
pub fn validate_identifier(value: &str, field_name: &str) -> ConfigResult<()> {
    let valid = IDENT_REGEX.as_ref().map_or_else(
        || {
            !value.is_empty()
                && value
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
                && !value.starts_with(|c: char| c.is_ascii_digit())
        },
        |regex| regex.is_match(value),
    );

    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            field: field_name.to_string(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_accepts_ledger_table_names() {
        assert!(validate_identifier("supaops_migrations", "ledger_table").is_ok());
        assert!(validate_identifier("_private", "ledger_table").is_ok());
    }

    #[test]
    fn identifier_rejects_injection_shapes() {
        assert!(validate_identifier("migrations; DROP TABLE users", "ledger_table").is_err());
        assert!(validate_identifier("Migrations", "ledger_table").is_err());
        assert!(validate_identifier("1st", "ledger_table").is_err());
        assert!(validate_identifier("", "ledger_table").is_err());
    }
}
