//! Movement detail.

use serde::{Deserialize, Serialize};

use crate::domain::event::Weight;
use crate::domain::foundation::{LotId, PaddockId, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    LotTransfer,
    PaddockRotation,
    LotAndPaddock,
    External,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovementDetail {
    pub kind: MovementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_lot_id: Option<LotId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_lot_id: Option<LotId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_paddock_id: Option<PaddockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_paddock_id: Option<PaddockId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Weight>,
}

impl MovementDetail {
    pub fn validate(&self) -> Result<(), ValidationError> {
        Ok(())
    }
}
