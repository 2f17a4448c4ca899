//! Weaning detail.

use serde::{Deserialize, Serialize};

use crate::domain::event::Weight;
use crate::domain::foundation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaningType {
    Conventional,
    Early,
    Temporary,
    Natural,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaningDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weaning_weight: Option<Weight>,
    pub age_days: u32,
    pub weaning_type: WeaningType,
}

impl WeaningDetail {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.age_days == 0 {
            return Err(ValidationError::out_of_range(
                "age_days",
                1.0,
                u32::MAX as f64,
                0.0,
            ));
        }
        Ok(())
    }
}
