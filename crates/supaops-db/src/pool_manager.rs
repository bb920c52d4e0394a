//! Connection pool management with DDL/inspection separation
//!
//! Two pools with different shapes: a single-connection pool for migrations
//! (session advisory locks must live and die on one backend connection) and
//! a wider pool for read-only catalog inspection and capability checks.

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use supaops_config::DatabaseConfig;

/// Extension trait for saturating cast from usize to u32
trait SaturatingCast {
    fn saturating_cast(self) -> u32;
}

impl SaturatingCast for usize {
    fn saturating_cast(self) -> u32 {
        u32::try_from(self).unwrap_or(u32::MAX)
    }
}

/// Configuration for connection pools
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum connections for the inspection pool
    pub inspect_pool_size: u32,
    /// Connection timeout in seconds
    pub connect_timeout: u64,
    /// Idle timeout in seconds
    pub idle_timeout: u64,
    /// Maximum lifetime in seconds
    pub max_lifetime: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            inspect_pool_size: 4,
            connect_timeout: 30,
            idle_timeout: 600,
            max_lifetime: 1800,
        }
    }
}

/// Manages the DDL and inspection connection pools
///
/// The DDL pool is capped at exactly one connection: migrations are
/// serialized by design, and the store checks that connection out for the
/// whole run so the session advisory lock survives between applies.
#[derive(Clone)]
#[allow(clippy::struct_field_names)]
pub struct PoolManager {
    /// Single-connection pool for migrations and the advisory lock
    ddl_pool: PgPool,
    /// Pool for catalog probes and capability checks
    inspect_pool: PgPool,
}

impl PoolManager {
    /// Create a new pool manager with the given configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Connection options are malformed
    /// - The server is unreachable or refuses connections
    /// - Authentication fails
    /// - Either pool fails to establish its first connection
    pub async fn new(db_config: &DatabaseConfig, config: PoolConfig) -> Result<Self> {
        let base_options = db_config
            .connect_options()
            .context("Invalid database configuration")?
            .application_name("supaops");

        // DDL pool: one connection, longer acquire timeout (DDL can queue
        // behind application traffic holding relation locks)
        let ddl_pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(config.connect_timeout.saturating_mul(2)))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .connect_with(base_options.clone())
            .await
            .context("Failed to create DDL pool")?;

        let inspect_pool = PgPoolOptions::new()
            .max_connections(config.inspect_pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout))
            .idle_timeout(Duration::from_secs(config.idle_timeout))
            .max_lifetime(Duration::from_secs(config.max_lifetime))
            .connect_with(base_options)
            .await
            .context("Failed to create inspection pool")?;

        Ok(Self {
            ddl_pool,
            inspect_pool,
        })
    }

    /// Get the single-connection pool for migration operations
    pub const fn ddl_pool(&self) -> &PgPool {
        &self.ddl_pool
    }

    /// Get the pool for catalog probes and capability checks
    pub const fn inspect_pool(&self) -> &PgPool {
        &self.inspect_pool
    }

    /// Create with environment-derived configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the environment yields an unusable database
    /// configuration or pool creation fails (see `new` method errors)
    pub async fn from_env() -> Result<Self> {
        let db_config = DatabaseConfig::from_env();
        Self::new(&db_config, PoolConfig::default()).await
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            ddl_pool: ConnectionStats {
                size: self.ddl_pool.size(),
                idle: self.ddl_pool.num_idle().saturating_cast(),
                max: self.ddl_pool.options().get_max_connections(),
            },
            inspect_pool: ConnectionStats {
                size: self.inspect_pool.size(),
                idle: self.inspect_pool.num_idle().saturating_cast(),
                max: self.inspect_pool.options().get_max_connections(),
            },
        }
    }

    /// Close both pools
    pub async fn close(&self) {
        self.ddl_pool.close().await;
        self.inspect_pool.close().await;
    }
}

/// Statistics for a connection pool
#[derive(Debug, Clone)]
pub struct ConnectionStats {
    /// Current number of connections
    pub size: u32,
    /// Number of idle connections
    pub idle: u32,
    /// Maximum connections allowed
    pub max: u32,
}

/// Combined statistics for both pools
#[derive(Debug, Clone)]
pub struct PoolStats {
    pub ddl_pool: ConnectionStats,
    pub inspect_pool: ConnectionStats,
}

impl PoolStats {
    /// Get total connections across both pools
    pub const fn total_connections(&self) -> u32 {
        self.ddl_pool.size.saturating_add(self.inspect_pool.size)
    }

    /// Get total idle connections
    pub const fn total_idle(&self) -> u32 {
        self.ddl_pool.idle.saturating_add(self.inspect_pool.idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pool_config() {
        let config = PoolConfig::default();
        assert_eq!(config.inspect_pool_size, 4);
        assert_eq!(config.connect_timeout, 30);
    }

    #[test]
    fn test_pool_stats_calculations() {
        let stats = PoolStats {
            ddl_pool: ConnectionStats {
                size: 1,
                idle: 1,
                max: 1,
            },
            inspect_pool: ConnectionStats {
                size: 3,
                idle: 2,
                max: 4,
            },
        };

        assert_eq!(stats.total_connections(), 4);
        assert_eq!(stats.total_idle(), 3);
    }
}
