//! Sale detail.

use serde::{Deserialize, Serialize};

use crate::domain::event::{Money, Weight};
use crate::domain::foundation::ValidationError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleDetail {
    /// Movement document (GMA) issued for the sale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gma_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_weight: Option<Weight>,
    pub sale_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_per_kg: Option<Money>,
}

impl SaleDetail {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Money::positive("sale_price", self.sale_price.cents())?;
        if let Some(gma) = &self.gma_reference {
            if gma.trim().is_empty() {
                return Err(ValidationError::empty_field("gma_reference"));
            }
        }
        Ok(())
    }

    /// Fills `price_per_kg` from price and weight when the caller left it out.
    pub fn with_derived_price_per_kg(mut self) -> Self {
        if self.price_per_kg.is_none() {
            self.price_per_kg = self.sale_weight.map(|w| self.sale_price.per_kg(w));
        }
        self
    }
}
