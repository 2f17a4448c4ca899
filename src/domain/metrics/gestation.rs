//! Estimated birth date calculator.

use chrono::{Days, NaiveDate};

use super::MetricError;

/// Mean gestation length for cattle, in days.
pub const CATTLE_GESTATION_DAYS: i64 = 283;

/// Adds a fixed gestation length to a service date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestationCalculator {
    gestation_days: u64,
}

impl GestationCalculator {
    pub fn new(gestation_days: i64) -> Result<Self, MetricError> {
        if gestation_days <= 0 {
            return Err(MetricError::InvalidGestationLength(gestation_days));
        }
        Ok(Self {
            gestation_days: gestation_days as u64,
        })
    }

    pub fn cattle() -> Self {
        Self {
            gestation_days: CATTLE_GESTATION_DAYS as u64,
        }
    }

    pub fn gestation_days(&self) -> u64 {
        self.gestation_days
    }

    /// Calendar-day arithmetic; leap days count like any other day.
    pub fn estimated_birth_date(&self, service_date: NaiveDate) -> Result<NaiveDate, MetricError> {
        service_date
            .checked_add_days(Days::new(self.gestation_days))
            .ok_or(MetricError::DateOverflow)
    }
}

impl Default for GestationCalculator {
    fn default() -> Self {
        Self::cattle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_year_service_calves_on_october_tenth() {
        let ebd = GestationCalculator::cattle()
            .estimated_birth_date(date(2024, 1, 1))
            .unwrap();
        assert_eq!(ebd, date(2024, 10, 10));
    }

    #[test]
    fn non_leap_year_shifts_by_one_day() {
        let ebd = GestationCalculator::cattle()
            .estimated_birth_date(date(2023, 1, 1))
            .unwrap();
        assert_eq!(ebd, date(2023, 10, 11));
    }

    #[test]
    fn custom_length_is_honoured() {
        let calc = GestationCalculator::new(150).unwrap();
        assert_eq!(
            calc.estimated_birth_date(date(2024, 3, 1)).unwrap(),
            date(2024, 7, 29)
        );
    }

    #[test]
    fn non_positive_length_is_rejected() {
        assert_eq!(
            GestationCalculator::new(0),
            Err(MetricError::InvalidGestationLength(0))
        );
    }

    #[test]
    fn overflow_is_reported() {
        assert_eq!(
            GestationCalculator::cattle().estimated_birth_date(NaiveDate::MAX),
            Err(MetricError::DateOverflow)
        );
    }

    proptest! {
        #[test]
        fn always_exactly_gestation_days_later(offset in 0i64..40_000) {
            let service = date(1970, 1, 1) + chrono::Duration::days(offset);
            let ebd = GestationCalculator::cattle().estimated_birth_date(service).unwrap();
            prop_assert_eq!((ebd - service).num_days(), CATTLE_GESTATION_DAYS);
        }
    }
}
