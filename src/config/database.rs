//! Database configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Seconds before an idle connection is closed
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Apply the embedded migrations when connecting
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.trim().is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE__URL"));
        }
        if !["postgres://", "postgresql://"].iter().any(|s| self.url.starts_with(s)) {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.max_connections > 100 {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        Ok(())
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            run_migrations: false,
        }
    }
}

fn default_min_connections() -> u32 {
    2
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout() -> u64 {
    15
}

fn default_idle_timeout() -> u64 {
    600
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn defaults_suit_a_small_pool() {
        let config = DatabaseConfig::default();
        assert_eq!(config.min_connections, 2);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.acquire_timeout(), Duration::from_secs(15));
        assert!(!config.run_migrations);
    }

    #[test]
    fn url_is_required() {
        assert_eq!(
            DatabaseConfig::default().validate(),
            Err(ValidationError::MissingRequired("DATABASE__URL"))
        );
    }

    #[test]
    fn only_postgres_urls_are_accepted() {
        assert_eq!(
            with_url("mysql://localhost/ledger").validate(),
            Err(ValidationError::InvalidDatabaseUrl)
        );
        assert!(with_url("postgres://localhost/ledger").validate().is_ok());
        assert!(with_url("postgresql://u:p@db:5432/ledger").validate().is_ok());
    }

    #[test]
    fn pool_bounds_are_checked() {
        let inverted = DatabaseConfig {
            min_connections: 8,
            max_connections: 4,
            ..with_url("postgres://localhost/ledger")
        };
        assert_eq!(inverted.validate(), Err(ValidationError::InvalidPoolSize));

        let oversized = DatabaseConfig {
            max_connections: 250,
            ..with_url("postgres://localhost/ledger")
        };
        assert_eq!(oversized.validate(), Err(ValidationError::PoolSizeTooLarge));
    }
}
