//! Synchronization and derived-metric settings

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::metrics::{GestationCalculator, MetricError, CATTLE_GESTATION_DAYS};
use crate::domain::sync::ConflictPolicy;

/// Upper bound accepted for `max_batch_size`.
pub const MAX_SYNC_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Largest device queue accepted in one ingestion call
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Strategy stamped on conflicts found during a session
    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// Days added to a service date for the estimated birth date
    #[serde(default = "default_gestation_days")]
    pub gestation_days: i64,
}

impl SyncConfig {
    pub fn gestation_calculator(&self) -> Result<GestationCalculator, MetricError> {
        GestationCalculator::new(self.gestation_days)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=MAX_SYNC_BATCH_SIZE).contains(&self.max_batch_size) {
            return Err(ValidationError::InvalidBatchSize {
                max: MAX_SYNC_BATCH_SIZE,
                actual: self.max_batch_size,
            });
        }
        if !(200..=400).contains(&self.gestation_days) {
            return Err(ValidationError::InvalidGestationDays(self.gestation_days));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            conflict_policy: ConflictPolicy::default(),
            gestation_days: default_gestation_days(),
        }
    }
}

fn default_max_batch_size() -> usize {
    500
}

fn default_gestation_days() -> i64 {
    CATTLE_GESTATION_DAYS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.max_batch_size, 500);
        assert_eq!(config.conflict_policy, ConflictPolicy::AdminDecides);
        assert_eq!(config.gestation_days, 283);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let config = SyncConfig {
            max_batch_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidBatchSize { actual: 0, .. })
        ));
    }

    #[test]
    fn gestation_outside_bovine_range_is_rejected() {
        let config = SyncConfig {
            gestation_days: 150,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidGestationDays(150)));
    }

    #[test]
    fn builds_calculator_from_configured_length() {
        let config = SyncConfig {
            gestation_days: 290,
            ..Default::default()
        };
        assert_eq!(config.gestation_calculator().unwrap().gestation_days(), 290);
    }
}
