//! Configuration source loading and composition
//!
//! Sources produce partial overlays rather than whole configurations, so
//! merging is per-field: defaults first, then each source in priority order
//! overrides only the fields it actually sets. A config file therefore
//! survives under the environment source unless a variable is explicitly
//! exported.

use crate::validation::Validate;
use crate::{ApplicationConfig, ConfigResult};
use std::path::Path;

fn env_first(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| std::env::var(name).ok())
}

fn env_parsed<T: std::str::FromStr>(names: &[&str]) -> Option<T> {
    env_first(names).and_then(|s| s.parse().ok())
}

/// Partial database configuration; `None` means "not set by this source"
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DatabaseOverlay {
    pub url: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ssl_mode: Option<String>,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub timeout_seconds: Option<u64>,
    pub idle_timeout_seconds: Option<u64>,
}

impl DatabaseOverlay {
    /// Read only the variables that are actually exported
    ///
    /// Honors both the `SUPAOPS_DATABASE_*` names and the legacy names the
    /// script corpus used (`DATABASE_URL`, `DB_HOST`, ...).
    pub(crate) fn from_env() -> Self {
        Self {
            url: env_first(&["SUPAOPS_DATABASE_URL", "DATABASE_URL"]),
            host: env_first(&["SUPAOPS_DATABASE_HOST", "DB_HOST"]),
            port: env_parsed(&["SUPAOPS_DATABASE_PORT", "DB_PORT"]),
            database: env_first(&["SUPAOPS_DATABASE_NAME", "DB_NAME"]),
            username: env_first(&["SUPAOPS_DATABASE_USERNAME", "DB_USER"]),
            password: env_first(&["SUPAOPS_DATABASE_PASSWORD", "DB_PASSWORD"]),
            ssl_mode: env_first(&["SUPAOPS_DATABASE_SSL_MODE", "DB_SSLMODE"]),
            max_connections: env_parsed(&["SUPAOPS_DATABASE_MAX_CONNECTIONS"]),
            min_connections: env_parsed(&["SUPAOPS_DATABASE_MIN_CONNECTIONS"]),
            timeout_seconds: env_parsed(&["SUPAOPS_DATABASE_TIMEOUT_SECONDS"]),
            idle_timeout_seconds: env_parsed(&["SUPAOPS_DATABASE_IDLE_TIMEOUT_SECONDS"]),
        }
    }

    pub(crate) fn apply_to(self, config: &mut crate::DatabaseConfig) {
        if let Some(url) = self.url {
            config.url = Some(url);
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(database) = self.database {
            config.database = database;
        }
        if let Some(username) = self.username {
            config.username = username;
        }
        if let Some(password) = self.password {
            config.password = password;
        }
        if let Some(ssl_mode) = self.ssl_mode {
            config.ssl_mode = ssl_mode;
        }
        if let Some(max_connections) = self.max_connections {
            config.max_connections = max_connections;
        }
        if let Some(min_connections) = self.min_connections {
            config.min_connections = min_connections;
        }
        if let Some(timeout_seconds) = self.timeout_seconds {
            config.timeout_seconds = timeout_seconds;
        }
        if let Some(idle_timeout_seconds) = self.idle_timeout_seconds {
            config.idle_timeout_seconds = idle_timeout_seconds;
        }
    }
}

/// Partial Supabase project configuration
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct SupabaseOverlay {
    pub project_url: Option<String>,
    pub service_role_key: Option<String>,
    pub anon_key: Option<String>,
}

impl SupabaseOverlay {
    /// Honors the legacy `REACT_APP_*` names the web application used
    pub(crate) fn from_env() -> Self {
        Self {
            project_url: env_first(&["SUPABASE_URL", "REACT_APP_SUPABASE_URL"]),
            service_role_key: env_first(&[
                "SUPABASE_SERVICE_ROLE_KEY",
                "REACT_APP_SUPABASE_SERVICE_ROLE_KEY",
            ]),
            anon_key: env_first(&["SUPABASE_ANON_KEY", "REACT_APP_SUPABASE_ANON_KEY"]),
        }
    }

    pub(crate) fn apply_to(self, config: &mut crate::SupabaseConfig) {
        if let Some(project_url) = self.project_url {
            config.project_url = Some(project_url);
        }
        if let Some(service_role_key) = self.service_role_key {
            config.service_role_key = Some(service_role_key);
        }
        if let Some(anon_key) = self.anon_key {
            config.anon_key = Some(anon_key);
        }
    }
}

/// Partial migration engine configuration
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct MigrationOverlay {
    pub ledger_table: Option<String>,
    pub lock_key: Option<i64>,
    pub ddl_timeout_seconds: Option<u64>,
}

impl MigrationOverlay {
    pub(crate) fn from_env() -> Self {
        Self {
            ledger_table: env_first(&["SUPAOPS_MIGRATION_LEDGER_TABLE"]),
            lock_key: env_parsed(&["SUPAOPS_MIGRATION_LOCK_KEY"]),
            ddl_timeout_seconds: env_parsed(&["SUPAOPS_MIGRATION_DDL_TIMEOUT_SECONDS"]),
        }
    }

    pub(crate) fn apply_to(self, config: &mut crate::MigrationConfig) {
        if let Some(ledger_table) = self.ledger_table {
            config.ledger_table = ledger_table;
        }
        if let Some(lock_key) = self.lock_key {
            config.lock_key = lock_key;
        }
        if let Some(ddl_timeout_seconds) = self.ddl_timeout_seconds {
            config.ddl_timeout_seconds = ddl_timeout_seconds;
        }
    }
}

/// Partial logging configuration
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingOverlay {
    pub level: Option<String>,
    pub service_name: Option<String>,
}

impl LoggingOverlay {
    pub(crate) fn from_env() -> Self {
        Self {
            level: env_first(&["SUPAOPS_LOG_LEVEL"]),
            service_name: env_first(&["SUPAOPS_SERVICE_NAME"]),
        }
    }

    pub(crate) fn apply_to(self, config: &mut crate::LoggingConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }
        if let Some(service_name) = self.service_name {
            config.service_name = service_name;
        }
    }
}

/// Partial configuration produced by one source
///
/// Every section and field is optional, so a TOML file may set a single
/// field and leave the rest to lower-priority sources and defaults.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ConfigOverlay {
    pub database: DatabaseOverlay,
    pub supabase: SupabaseOverlay,
    pub migration: MigrationOverlay,
    pub logging: LoggingOverlay,
}

impl ConfigOverlay {
    pub(crate) fn from_env() -> Self {
        Self {
            database: DatabaseOverlay::from_env(),
            supabase: SupabaseOverlay::from_env(),
            migration: MigrationOverlay::from_env(),
            logging: LoggingOverlay::from_env(),
        }
    }

    pub(crate) fn apply_to(self, config: &mut ApplicationConfig) {
        self.database.apply_to(&mut config.database);
        self.supabase.apply_to(&mut config.supabase);
        self.migration.apply_to(&mut config.migration);
        self.logging.apply_to(&mut config.logging);
    }
}

/// Trait for loading configuration from different sources
pub trait ConfigurationSource {
    /// Load this source's overlay of explicitly-set fields
    ///
    /// # Errors
    /// Returns configuration loading errors
    fn load(&self) -> ConfigResult<ConfigOverlay>;

    /// Get the name of this configuration source
    fn name(&self) -> &str;

    /// Get the priority of this source (higher number = higher priority)
    fn priority(&self) -> u8;
}

/// Load configuration from environment variables
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn load(&self) -> ConfigResult<ConfigOverlay> {
        Ok(ConfigOverlay::from_env())
    }

    fn name(&self) -> &'static str {
        "environment"
    }

    fn priority(&self) -> u8 {
        100 // Highest priority - environment variables override everything
    }
}

/// Load configuration from TOML file
pub struct TomlFileSource {
    path: std::path::PathBuf,
}

impl TomlFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for TomlFileSource {
    fn load(&self) -> ConfigResult<ConfigOverlay> {
        let content = std::fs::read_to_string(&self.path)?;
        let overlay: ConfigOverlay = toml::from_str(&content)?;
        Ok(overlay)
    }

    fn name(&self) -> &'static str {
        "toml_file"
    }

    fn priority(&self) -> u8 {
        50 // Medium priority - below env vars, above defaults
    }
}

/// Type alias for configuration sources
type ConfigSources = Vec<Box<dyn ConfigurationSource>>;

/// Configuration loader that combines multiple sources
///
/// The loaded configuration is validated before being returned; a process
/// that gets an `ApplicationConfig` out of this loader can assume it is
/// usable.
pub struct ConfigurationLoader {
    sources: ConfigSources,
}

impl ConfigurationLoader {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Load configuration from all sources with priority ordering
    ///
    /// Merging is per-field: a value set by a config file stays in effect
    /// unless a higher-priority source sets that same field.
    ///
    /// # Errors
    /// Returns configuration loading or validation errors
    pub fn load(&self) -> ConfigResult<ApplicationConfig> {
        let mut config = ApplicationConfig::defaults();

        // Sort sources by priority (lowest first, so highest priority overwrites)
        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        for source in sorted_sources {
            match source.load() {
                Ok(overlay) => {
                    tracing::debug!("Loaded configuration from source: {}", source.name());
                    overlay.apply_to(&mut config);
                }
                Err(e) => {
                    tracing::warn!("Failed to load from source {}: {}", source.name(), e);
                }
            }
        }

        config.database.warn_if_default_password();
        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn environment_source_loads_and_validates() {
        let loader = ConfigurationLoader::new().add_source(Box::new(EnvironmentSource));
        let config = loader.load();
        assert!(config.is_ok());
    }

    #[test]
    fn toml_source_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[database]
host = "db.internal"
port = 6543
database = "app"
username = "ops"
password = "pw"
ssl_mode = "require"
max_connections = 2
min_connections = 1
timeout_seconds = 10
idle_timeout_seconds = 60

[supabase]

[migration]
ledger_table = "ops_ledger"
lock_key = 42
ddl_timeout_seconds = 30

[logging]
level = "debug"
service_name = "supaops"
"#
        )
        .unwrap();

        let loader =
            ConfigurationLoader::new().add_source(Box::new(TomlFileSource::new(file.path())));
        let config = loader.load().unwrap();
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.migration.ledger_table, "ops_ledger");
    }

    #[test]
    fn config_file_survives_environment_source() {
        // The composition every command uses: environment source always
        // registered, file source added when --config-file is given.
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[database]\nhost = \"db.internal\"\n").unwrap();

        let loader = ConfigurationLoader::new()
            .add_source(Box::new(EnvironmentSource))
            .add_source(Box::new(TomlFileSource::new(file.path())));
        let config = loader.load().unwrap();

        // No SUPAOPS_DATABASE_HOST exported, so the file value stays even
        // though the environment source has higher priority.
        assert_eq!(config.database.host, "db.internal");
        // Fields the file leaves out keep their defaults
        assert_eq!(config.database.port, 54322);
    }

    #[test]
    fn environment_wins_over_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[logging]\nlevel = \"error\"\n").unwrap();

        unsafe {
            std::env::set_var("SUPAOPS_LOG_LEVEL", "warn");
        }

        let loader = ConfigurationLoader::new()
            .add_source(Box::new(EnvironmentSource))
            .add_source(Box::new(TomlFileSource::new(file.path())));
        let config = loader.load().unwrap();

        unsafe {
            std::env::remove_var("SUPAOPS_LOG_LEVEL");
        }

        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn missing_toml_file_falls_back_to_environment() {
        let loader = ConfigurationLoader::new()
            .add_source(Box::new(TomlFileSource::new("/nonexistent/supaops.toml")));
        // The file source fails, is logged, and the defaults win
        assert!(loader.load().is_ok());
    }
}
