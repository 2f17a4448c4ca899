//! Weighing detail.

use serde::{Deserialize, Serialize};

use crate::domain::event::{AverageDailyGain, BodyCondition, Weight};
use crate::domain::foundation::{EventId, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeighingType {
    Routine,
    Birth,
    Weaning,
    Sale,
    Purchase,
    Control,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeighingDetail {
    pub weight: Weight,
    pub weighing_type: WeighingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_condition: Option<BodyCondition>,
    /// Derived from the previous weighing; advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub average_daily_gain: Option<AverageDailyGain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_since_previous: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_weighing_id: Option<EventId>,
}

impl WeighingDetail {
    /// Weighing without any link to history.
    pub fn new(weight: Weight, weighing_type: WeighingType) -> Self {
        Self {
            weight,
            weighing_type,
            body_condition: None,
            average_daily_gain: None,
            days_since_previous: None,
            previous_weighing_id: None,
        }
    }

    /// Body condition range is enforced by `BodyCondition` itself.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(days) = self.days_since_previous {
            if days < 0 {
                return Err(ValidationError::out_of_range(
                    "days_since_previous",
                    0.0,
                    i64::MAX as f64,
                    days as f64,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_condition_out_of_range_is_rejected_on_input() {
        let json = r#"{"weight":410.0,"weighing_type":"routine","body_condition":6}"#;
        assert!(serde_json::from_str::<WeighingDetail>(json).is_err());
    }

    #[test]
    fn negative_day_gap_is_invalid() {
        let mut detail = WeighingDetail::new(Weight::from_kg(410.0).unwrap(), WeighingType::Routine);
        detail.days_since_previous = Some(-2);
        assert!(detail.validate().is_err());
    }
}
