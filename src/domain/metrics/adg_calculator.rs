//! Average daily gain calculator.

use crate::domain::event::{AverageDailyGain, Weight};

use super::MetricError;

/// Computes weight change per day between two weighings.
pub struct AdgCalculator;

impl AdgCalculator {
    /// `(current - previous) / days`, rounded to 3 decimals.
    ///
    /// # Errors
    ///
    /// - `NonPositiveInterval` if `days <= 0`
    /// - `ImplausibleGain` if the result falls outside [-1, 3] kg/day
    pub fn compute(
        current: Weight,
        previous: Weight,
        days: i64,
    ) -> Result<AverageDailyGain, MetricError> {
        if days <= 0 {
            return Err(MetricError::NonPositiveInterval(days));
        }
        let raw = (current.kg() - previous.kg()) / days as f64;
        AverageDailyGain::new(raw).map_err(|_| MetricError::ImplausibleGain(raw))
    }
}
