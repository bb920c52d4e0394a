//! Configuration profiles for different environments

/// Configuration profiles for different deployment environments
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Profile {
    /// Development environment - local Supabase stack, relaxed SSL
    #[serde(rename = "development")]
    Development,

    /// Staging environment - production-like but safe to experiment against
    #[serde(rename = "staging")]
    Staging,

    /// Production environment - SSL required, confirmation prompts upstream
    #[serde(rename = "production")]
    Production,

    /// Test environment - minimal setup for fast testing
    #[serde(rename = "test")]
    Test,
}

impl Default for Profile {
    fn default() -> Self {
        Self::Development
    }
}

impl Profile {
    /// Whether connections to this environment must use SSL
    pub const fn requires_ssl(self) -> bool {
        matches!(self, Self::Staging | Self::Production)
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
            Self::Test => "test",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for Profile {
    type Err = crate::ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" | "local" => Ok(Self::Development),
            "staging" => Ok(Self::Staging),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            _ => Err(crate::ConfigError::Generic {
                message: format!("Invalid profile: {s}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_legacy_aliases() {
        assert_eq!("prod".parse::<Profile>().ok(), Some(Profile::Production));
        assert_eq!("local".parse::<Profile>().ok(), Some(Profile::Development));
        assert!("qa".parse::<Profile>().is_err());
    }

    #[test]
    fn ssl_policy_follows_environment() {
        assert!(Profile::Production.requires_ssl());
        assert!(!Profile::Development.requires_ssl());
    }
}
