//! Purchase detail.

use serde::{Deserialize, Serialize};

use crate::domain::event::{Money, Weight};
use crate::domain::foundation::{SupplierId, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseDetail {
    pub supplier_id: SupplierId,
    pub purchase_price: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Weight>,
}

impl PurchaseDetail {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Money::positive("purchase_price", self.purchase_price.cents())?;
        Ok(())
    }
}
