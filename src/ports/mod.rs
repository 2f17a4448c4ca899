//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Ledger Ports
//!
//! - `EventRepository` - Appending events and moving their sync status
//! - `EventReader` - History queries and derived-metric projections
//! - `EventTypeRegistry` - Type code resolution ahead of registration
//!
//! ## Sync Ports
//!
//! - `SyncLogRepository` - One log per device synchronization session
//! - `ConflictRepository` - Divergent versions awaiting or after resolution

mod conflict_repository;
mod event_reader;
mod event_repository;
mod event_type_registry;
mod sync_log_repository;

pub use conflict_repository::ConflictRepository;
pub use event_reader::{
    EventFilter, EventReader, Page, PageRequest, ReproductionProjection, WeighingProjection,
    MAX_PAGE_SIZE,
};
pub use event_repository::EventRepository;
pub use event_type_registry::{EventTypeDefinition, EventTypeRegistry};
pub use sync_log_repository::SyncLogRepository;
