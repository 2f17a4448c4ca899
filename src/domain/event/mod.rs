//! Animal event ledger.
//!
//! The append-only record of everything that happens to an animal: the base
//! event, its category and type code, sync status, and the variant detail
//! carried by each of the ten canonical kinds.

mod aggregate;
mod category;
mod details;
mod errors;
mod kind;
mod sync_status;
mod values;

pub use aggregate::{AnimalEvent, EventInput, EventRecord, MAX_OBSERVATIONS_LENGTH};
pub use category::EventCategory;
pub use details::{
    AdministrationRoute, BirthDetail, BirthDifficulty, BirthType, DeathCauseCategory, DeathDetail,
    DiagnosisMethod, EventDetail, HealthDetail, IdentificationDetail, IdentificationType,
    MovementDetail, MovementKind, PurchaseDetail, ReproductionDetail, ReproductionResult,
    SaleDetail, ServiceType, Vitality, WeaningDetail, WeaningType, WeighingDetail, WeighingType,
};
pub use errors::EventError;
pub use kind::{EventKind, EventTypeCode, MAX_TYPE_CODE_LENGTH};
pub use sync_status::SyncStatus;
pub use values::{
    AverageDailyGain, BodyCondition, EventMetadata, GpsLocation, Money, Weight,
    MAX_ADG_KG_PER_DAY, MAX_WEIGHT_KG, MIN_ADG_KG_PER_DAY,
};
