//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `LIVESTOCK_LEDGER`
//! prefix and nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use livestock_ledger::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Sync batches capped at {}", config.sync.max_batch_size);
//! ```

mod database;
mod error;
mod logging;
mod sync;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use sync::{SyncConfig, MAX_SYNC_BATCH_SIZE};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// PostgreSQL connection
    pub database: DatabaseConfig,

    /// Ingestion limits, conflict policy and gestation length
    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Reads a `.env` file when present, then every variable prefixed with
    /// `LIVESTOCK_LEDGER`:
    ///
    /// - `LIVESTOCK_LEDGER__DATABASE__URL=...` -> `database.url`
    /// - `LIVESTOCK_LEDGER__SYNC__CONFLICT_POLICY=server_wins` -> `sync.conflict_policy`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value
    /// cannot be parsed into its expected type.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("LIVESTOCK_LEDGER")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Semantic validation of every section.
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.sync.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sync::ConflictPolicy;
    use std::env;
    use std::sync::Mutex;

    // Environment variables are process-global.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: [&str; 5] = [
        "LIVESTOCK_LEDGER__DATABASE__URL",
        "LIVESTOCK_LEDGER__SYNC__MAX_BATCH_SIZE",
        "LIVESTOCK_LEDGER__SYNC__CONFLICT_POLICY",
        "LIVESTOCK_LEDGER__SYNC__GESTATION_DAYS",
        "LIVESTOCK_LEDGER__LOGGING__FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_minimal_environment_with_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("LIVESTOCK_LEDGER__DATABASE__URL", "postgres://ledger@localhost/ledger");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.url, "postgres://ledger@localhost/ledger");
        assert_eq!(config.sync.max_batch_size, 500);
        assert_eq!(config.sync.conflict_policy, ConflictPolicy::AdminDecides);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reads_nested_sync_settings() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("LIVESTOCK_LEDGER__DATABASE__URL", "postgres://localhost/ledger");
        env::set_var("LIVESTOCK_LEDGER__SYNC__MAX_BATCH_SIZE", "250");
        env::set_var("LIVESTOCK_LEDGER__SYNC__CONFLICT_POLICY", "server_wins");
        env::set_var("LIVESTOCK_LEDGER__SYNC__GESTATION_DAYS", "290");
        env::set_var("LIVESTOCK_LEDGER__LOGGING__FORMAT", "json");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.sync.max_batch_size, 250);
        assert_eq!(config.sync.conflict_policy, ConflictPolicy::ServerWins);
        assert_eq!(config.sync.gestation_days, 290);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn missing_database_url_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        assert!(matches!(AppConfig::load(), Err(ConfigError::LoadError(_))));
    }

    #[test]
    fn validation_reports_first_bad_section() {
        let config = AppConfig {
            database: DatabaseConfig {
                url: "postgres://localhost/ledger".to_string(),
                ..Default::default()
            },
            sync: SyncConfig {
                max_batch_size: 50_000,
                ..Default::default()
            },
            logging: LoggingConfig::default(),
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBatchSize { actual: 50_000, .. })
        ));
    }
}
