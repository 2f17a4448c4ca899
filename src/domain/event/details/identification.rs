//! Identification change detail.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentificationType {
    EarTag,
    ElectronicTag,
    Bolus,
    Brand,
    Tattoo,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentificationDetail {
    pub identification_type: IdentificationType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_identifier: Option<String>,
    pub new_identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl IdentificationDetail {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.new_identifier.trim().is_empty() {
            return Err(ValidationError::empty_field("new_identifier"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_identifier_is_required() {
        let detail = IdentificationDetail {
            identification_type: IdentificationType::EarTag,
            previous_identifier: Some("AR-001".to_string()),
            new_identifier: " ".to_string(),
            reason: Some("tag lost".to_string()),
        };
        assert_eq!(
            detail.validate(),
            Err(ValidationError::empty_field("new_identifier"))
        );
    }
}
