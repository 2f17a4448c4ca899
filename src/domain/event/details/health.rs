//! Health treatment detail.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProductId, ValidationError};

/// Route by which a product was administered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdministrationRoute {
    Intramuscular,
    Subcutaneous,
    Intravenous,
    Oral,
    Topical,
    Intramammary,
    Intranasal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthDetail {
    pub product_id: ProductId,
    /// Free-form dose as written on the treatment sheet, e.g. "5 ml".
    pub dose: String,
    pub route: AdministrationRoute,
    #[serde(default)]
    pub requires_follow_up: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_check_date: Option<NaiveDate>,
}

impl HealthDetail {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.dose.trim().is_empty() {
            return Err(ValidationError::empty_field("dose"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_dose() {
        let mut detail = HealthDetail {
            product_id: ProductId::new(),
            dose: String::new(),
            route: AdministrationRoute::Subcutaneous,
            requires_follow_up: true,
            next_check_date: NaiveDate::from_ymd_opt(2024, 5, 1),
        };
        assert_eq!(detail.validate(), Err(ValidationError::empty_field("dose")));

        detail.dose = "5 ml".to_string();
        assert!(detail.validate().is_ok());
    }
}
