//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).

pub mod handlers;

pub use handlers::events::{
    // Registration
    BulkRegisterEventsCommand, BulkRegisterEventsHandler, EventRegistrar, QueuedEvent,
    RegisterBirthCommand, RegisterBirthHandler, RegisterDeathCommand, RegisterDeathHandler,
    RegisterEventCommand, RegisterEventHandler, RegisterHealthCommand, RegisterHealthHandler,
    RegisterIdentificationCommand, RegisterIdentificationHandler, RegisterMovementCommand,
    RegisterMovementHandler, RegisterPurchaseCommand, RegisterPurchaseHandler,
    RegisterReproductionCommand, RegisterReproductionHandler, RegisterSaleCommand,
    RegisterSaleHandler, RegisterWeaningCommand, RegisterWeaningHandler,
    RegisterWeighingCommand, RegisterWeighingHandler, RegisteredEvent,
    // Queries
    GetEventHandler, GetEventQuery, GetWeightTrendHandler, GetWeightTrendQuery,
    ListAnimalEventsHandler, ListAnimalEventsQuery, ListFarmEventsHandler, ListFarmEventsQuery,
};
pub use handlers::sync::{
    ConflictSettlement, GetSyncLogHandler, GetSyncLogQuery, ListOpenConflictsHandler,
    ListOpenConflictsQuery, ListPendingSyncHandler, ListPendingSyncQuery,
    MarkEventsSyncedCommand, MarkEventsSyncedHandler, ResolveConflictCommand,
    ResolveConflictHandler, RunSyncSessionCommand, RunSyncSessionHandler, SyncSessionOutcome,
};
