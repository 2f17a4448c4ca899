//! Calculator failures.

use thiserror::Error;

use crate::domain::foundation::ValidationError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetricError {
    #[error("Elapsed days must be positive, got {0}")]
    NonPositiveInterval(i64),

    #[error("Gain of {0} kg/day is outside the plausible range")]
    ImplausibleGain(f64),

    #[error("Gestation length must be positive, got {0}")]
    InvalidGestationLength(i64),

    #[error("Estimated birth date overflows the calendar")]
    DateOverflow,
}

impl From<MetricError> for ValidationError {
    fn from(err: MetricError) -> Self {
        match err {
            MetricError::NonPositiveInterval(days) => ValidationError::out_of_range(
                "days_since_previous",
                1.0,
                i64::MAX as f64,
                days as f64,
            ),
            MetricError::ImplausibleGain(gain) => ValidationError::out_of_range(
                "average_daily_gain",
                crate::domain::event::MIN_ADG_KG_PER_DAY,
                crate::domain::event::MAX_ADG_KG_PER_DAY,
                gain,
            ),
            MetricError::InvalidGestationLength(days) => ValidationError::out_of_range(
                "gestation_days",
                1.0,
                i64::MAX as f64,
                days as f64,
            ),
            MetricError::DateOverflow => {
                ValidationError::invalid_format("estimated_birth_date", "date overflow")
            }
        }
    }
}
