//! Death detail.

use serde::{Deserialize, Serialize};

use crate::domain::event::Money;
use crate::domain::foundation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCauseCategory {
    Disease,
    Accident,
    Predation,
    Calving,
    Poisoning,
    Weather,
    Unknown,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeathDetail {
    pub cause: String,
    pub cause_category: DeathCauseCategory,
    #[serde(default)]
    pub necropsy_performed: bool,
    /// Whether the cause must be reported to the animal health authority.
    #[serde(default)]
    pub notifiable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_value: Option<Money>,
}

impl DeathDetail {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cause.trim().is_empty() {
            return Err(ValidationError::empty_field("cause"));
        }
        if let Some(loss) = self.loss_value {
            if loss.cents() < 0 {
                return Err(ValidationError::out_of_range(
                    "loss_value",
                    0.0,
                    i64::MAX as f64,
                    loss.cents() as f64,
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detail(cause: &str) -> DeathDetail {
        DeathDetail {
            cause: cause.to_string(),
            cause_category: DeathCauseCategory::Disease,
            necropsy_performed: false,
            notifiable: false,
            loss_value: None,
        }
    }

    #[test]
    fn requires_cause_text() {
        assert_eq!(
            detail("  ").validate(),
            Err(ValidationError::empty_field("cause"))
        );
        assert!(detail("Bloat").validate().is_ok());
    }

    #[test]
    fn rejects_negative_loss_value() {
        let mut d = detail("Lightning");
        d.loss_value = Some(Money::from_cents(-1));
        assert!(d.validate().is_err());
    }
}
