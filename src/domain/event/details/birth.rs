//! Birth detail.

use serde::{Deserialize, Serialize};

use crate::domain::event::Weight;
use crate::domain::foundation::{AnimalId, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BirthType {
    Natural,
    Assisted,
    Cesarean,
    Induced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BirthDifficulty {
    Easy,
    Moderate,
    Difficult,
    VeryDifficult,
}

/// Condition of the newborn at birth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vitality {
    Strong,
    Normal,
    Weak,
    Stillborn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthDetail {
    pub birth_type: BirthType,
    pub difficulty: BirthDifficulty,
    pub vitality: Vitality,
    /// Dam, when confirmed at registration time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mother_id: Option<AnimalId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_weight: Option<Weight>,
}

impl BirthDetail {
    /// Enum membership is enforced by the types; nothing else is mandatory.
    pub fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_snake_case_enums() {
        let json = r#"{"birth_type":"assisted","difficulty":"very_difficult","vitality":"weak"}"#;
        let detail: BirthDetail = serde_json::from_str(json).unwrap();
        assert_eq!(detail.birth_type, BirthType::Assisted);
        assert_eq!(detail.difficulty, BirthDifficulty::VeryDifficult);
        assert!(detail.mother_id.is_none());
        assert!(detail.validate().is_ok());
    }

    #[test]
    fn rejects_unknown_enum_member() {
        let json = r#"{"birth_type":"magic","difficulty":"easy","vitality":"weak"}"#;
        assert!(serde_json::from_str::<BirthDetail>(json).is_err());
    }
}
