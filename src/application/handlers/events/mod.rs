//! Event ledger command and query handlers.

mod bulk_register;
mod derivation;
mod get_event;
mod get_weight_trend;
mod list_animal_events;
mod list_farm_events;
mod register_birth;
mod register_death;
mod register_event;
mod register_health;
mod register_identification;
mod register_movement;
mod register_purchase;
mod register_reproduction;
mod register_sale;
mod register_weaning;
mod register_weighing;
mod registrar;

#[cfg(test)]
pub(crate) use registrar::test_support;

pub use bulk_register::{BulkRegisterEventsCommand, BulkRegisterEventsHandler, QueuedEvent};
pub use get_event::{GetEventHandler, GetEventQuery};
pub use get_weight_trend::{GetWeightTrendHandler, GetWeightTrendQuery};
pub use list_animal_events::{ListAnimalEventsHandler, ListAnimalEventsQuery};
pub use list_farm_events::{ListFarmEventsHandler, ListFarmEventsQuery};
pub use register_birth::{RegisterBirthCommand, RegisterBirthHandler};
pub use register_death::{RegisterDeathCommand, RegisterDeathHandler};
pub use register_event::{RegisterEventCommand, RegisterEventHandler};
pub use register_health::{RegisterHealthCommand, RegisterHealthHandler};
pub use register_identification::{RegisterIdentificationCommand, RegisterIdentificationHandler};
pub use register_movement::{RegisterMovementCommand, RegisterMovementHandler};
pub use register_purchase::{RegisterPurchaseCommand, RegisterPurchaseHandler};
pub use register_reproduction::{RegisterReproductionCommand, RegisterReproductionHandler};
pub use register_sale::{RegisterSaleCommand, RegisterSaleHandler};
pub use register_weaning::{RegisterWeaningCommand, RegisterWeaningHandler};
pub use register_weighing::{RegisterWeighingCommand, RegisterWeighingHandler};
pub use registrar::{EventRegistrar, PreparedEvent, RegisteredEvent};
