//! Reproduction detail.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AnimalId, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    NaturalMating,
    ArtificialInsemination,
    EmbryoTransfer,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReproductionResult {
    #[default]
    Pending,
    Pregnant,
    Empty,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosisMethod {
    Palpation,
    Ultrasound,
    BloodTest,
    Observation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReproductionDetail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    /// Sire or donor used for the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stud_id: Option<AnimalId>,
    #[serde(default)]
    pub result: ReproductionResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis_method: Option<DiagnosisMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_birth_date: Option<NaiveDate>,
    /// Zero in a device queue means "not captured"; ingestion derives it.
    #[serde(default)]
    pub attempt_number: u32,
}

impl ReproductionDetail {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.attempt_number < 1 {
            return Err(ValidationError::out_of_range(
                "attempt_number",
                1.0,
                u32::MAX as f64,
                f64::from(self.attempt_number),
            ));
        }
        Ok(())
    }
}
