//! Self-validating scalar value objects used by ledger events.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::domain::foundation::ValidationError;

/// Heaviest live weight accepted for a single animal, in kilograms.
pub const MAX_WEIGHT_KG: f64 = 3000.0;

/// Lower bound of a physically plausible average daily gain (kg/day).
pub const MIN_ADG_KG_PER_DAY: f64 = -1.0;

/// Upper bound of a physically plausible average daily gain (kg/day).
pub const MAX_ADG_KG_PER_DAY: f64 = 3.0;

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Live weight in kilograms, rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Weight(f64);

impl Weight {
    /// Creates a weight, rejecting non-positive or implausibly large values.
    pub fn from_kg(kg: f64) -> Result<Self, ValidationError> {
        let rounded = round_to(kg, 2);
        if !rounded.is_finite() || rounded <= 0.0 || rounded > MAX_WEIGHT_KG {
            return Err(ValidationError::out_of_range("weight", 0.0, MAX_WEIGHT_KG, kg));
        }
        Ok(Self(rounded))
    }

    pub fn kg(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Weight {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_kg(value)
    }
}

impl From<Weight> for f64 {
    fn from(w: Weight) -> Self {
        w.0
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} kg", self.0)
    }
}

/// Monetary amount in cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Creates an amount that must be strictly positive.
    pub fn positive(field: &str, cents: i64) -> Result<Self, ValidationError> {
        if cents <= 0 {
            return Err(ValidationError::out_of_range(
                field,
                1.0,
                i64::MAX as f64,
                cents as f64,
            ));
        }
        Ok(Self(cents))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Price per kilogram, rounded to the nearest cent.
    pub fn per_kg(&self, weight: Weight) -> Money {
        Money((self.0 as f64 / weight.kg()).round() as i64)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.0.abs() / 100, self.0.abs() % 100)
    }
}

/// Body condition score on the 1 (emaciated) to 5 (obese) scale.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct BodyCondition(f64);

impl BodyCondition {
    pub const MIN: f64 = 1.0;
    pub const MAX: f64 = 5.0;

    pub fn new(score: f64) -> Result<Self, ValidationError> {
        if !score.is_finite() || !(Self::MIN..=Self::MAX).contains(&score) {
            return Err(ValidationError::out_of_range(
                "body_condition",
                Self::MIN,
                Self::MAX,
                score,
            ));
        }
        Ok(Self(round_to(score, 2)))
    }

    pub fn score(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for BodyCondition {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BodyCondition> for f64 {
    fn from(b: BodyCondition) -> Self {
        b.0
    }
}

/// Weight change per day between two weighings, in kg/day.
///
/// Always within `[MIN_ADG_KG_PER_DAY, MAX_ADG_KG_PER_DAY]`, three decimals.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct AverageDailyGain(f64);

impl AverageDailyGain {
    pub fn new(kg_per_day: f64) -> Result<Self, ValidationError> {
        let rounded = round_to(kg_per_day, 3);
        if !rounded.is_finite() || !(MIN_ADG_KG_PER_DAY..=MAX_ADG_KG_PER_DAY).contains(&rounded) {
            return Err(ValidationError::out_of_range(
                "average_daily_gain",
                MIN_ADG_KG_PER_DAY,
                MAX_ADG_KG_PER_DAY,
                rounded,
            ));
        }
        Ok(Self(rounded))
    }

    pub fn kg_per_day(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for AverageDailyGain {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AverageDailyGain> for f64 {
    fn from(adg: AverageDailyGain) -> Self {
        adg.0
    }
}

/// Opaque key/value payload carried by an event.
///
/// Passed through untouched; no ledger rule ever reads its contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventMetadata(Map<String, Value>);

impl EventMetadata {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.0.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for EventMetadata {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// GPS position as reported by the capturing device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GpsLocation(String);

impl GpsLocation {
    pub const MAX_LENGTH: usize = 100;

    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("gps_location"));
        }
        if trimmed.len() > Self::MAX_LENGTH {
            return Err(ValidationError::invalid_format(
                "gps_location",
                format!("must be at most {} characters", Self::MAX_LENGTH),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GpsLocation {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<GpsLocation> for String {
    fn from(gps: GpsLocation) -> Self {
        gps.0
    }
}
