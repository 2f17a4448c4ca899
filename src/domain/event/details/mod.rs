//! EventDetail - sum type over the ten variant detail records.
//!
//! Each variant carries its own validation. The base event owns at most one
//! detail, and the detail's kind must match the event's type definition.

mod birth;
mod death;
mod health;
mod identification;
mod movement;
mod purchase;
mod reproduction;
mod sale;
mod weaning;
mod weighing;

pub use birth::{BirthDetail, BirthDifficulty, BirthType, Vitality};
pub use death::{DeathCauseCategory, DeathDetail};
pub use health::{AdministrationRoute, HealthDetail};
pub use identification::{IdentificationDetail, IdentificationType};
pub use movement::{MovementDetail, MovementKind};
pub use purchase::PurchaseDetail;
pub use reproduction::{DiagnosisMethod, ReproductionDetail, ReproductionResult, ServiceType};
pub use sale::SaleDetail;
pub use weaning::{WeaningDetail, WeaningType};
pub use weighing::{WeighingDetail, WeighingType};

use serde::{Deserialize, Serialize};

use super::EventKind;
use crate::domain::foundation::ValidationError;

/// Variant payload attached 1:1 to a base event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventDetail {
    Birth(BirthDetail),
    Death(DeathDetail),
    Health(HealthDetail),
    Movement(MovementDetail),
    Weighing(WeighingDetail),
    Reproduction(ReproductionDetail),
    Sale(SaleDetail),
    Purchase(PurchaseDetail),
    Weaning(WeaningDetail),
    Identification(IdentificationDetail),
}

impl EventDetail {
    pub fn kind(&self) -> EventKind {
        match self {
            EventDetail::Birth(_) => EventKind::Birth,
            EventDetail::Death(_) => EventKind::Death,
            EventDetail::Health(_) => EventKind::Health,
            EventDetail::Movement(_) => EventKind::Movement,
            EventDetail::Weighing(_) => EventKind::Weighing,
            EventDetail::Reproduction(_) => EventKind::Reproduction,
            EventDetail::Sale(_) => EventKind::Sale,
            EventDetail::Purchase(_) => EventKind::Purchase,
            EventDetail::Weaning(_) => EventKind::Weaning,
            EventDetail::Identification(_) => EventKind::Identification,
        }
    }

    /// Applies the variant-specific invariant.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            EventDetail::Birth(d) => d.validate(),
            EventDetail::Death(d) => d.validate(),
            EventDetail::Health(d) => d.validate(),
            EventDetail::Movement(d) => d.validate(),
            EventDetail::Weighing(d) => d.validate(),
            EventDetail::Reproduction(d) => d.validate(),
            EventDetail::Sale(d) => d.validate(),
            EventDetail::Purchase(d) => d.validate(),
            EventDetail::Weaning(d) => d.validate(),
            EventDetail::Identification(d) => d.validate(),
        }
    }

    /// Copy with the fields derived from other events cleared.
    pub fn without_derived(&self) -> EventDetail {
        match self {
            EventDetail::Weighing(d) => EventDetail::Weighing(WeighingDetail {
                average_daily_gain: None,
                days_since_previous: None,
                previous_weighing_id: None,
                ..d.clone()
            }),
            other => other.clone(),
        }
    }

    pub fn as_weighing(&self) -> Option<&WeighingDetail> {
        match self {
            EventDetail::Weighing(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_reproduction(&self) -> Option<&ReproductionDetail> {
        match self {
            EventDetail::Reproduction(d) => Some(d),
            _ => None,
        }
    }
}

macro_rules! detail_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for EventDetail {
                fn from(detail: $ty) -> Self {
                    EventDetail::$variant(detail)
                }
            }
        )*
    };
}

detail_from!(
    Birth => BirthDetail,
    Death => DeathDetail,
    Health => HealthDetail,
    Movement => MovementDetail,
    Weighing => WeighingDetail,
    Reproduction => ReproductionDetail,
    Sale => SaleDetail,
    Purchase => PurchaseDetail,
    Weaning => WeaningDetail,
    Identification => IdentificationDetail,
);
