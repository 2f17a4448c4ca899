//! Logging configuration

use serde::Deserialize;

use super::error::ValidationError;

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable multi-line output
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default level when `RUST_LOG` is unset
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl LoggingConfig {
    /// Filter directive applied to this crate's targets.
    pub fn directive(&self) -> String {
        format!("livestock_ledger={}", self.level.to_ascii_lowercase())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let level = self.level.to_ascii_lowercase();
        if !LEVELS.contains(&level.as_str()) {
            return Err(ValidationError::UnknownLogLevel(self.level.clone()));
        }
        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
