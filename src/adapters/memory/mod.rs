//! In-memory adapters.
//!
//! Used by tests and by single-process deployments such as a field device
//! that keeps its queue in memory between uploads.

mod conflict_repository;
mod event_ledger;
mod event_type_registry;
mod sync_log_repository;

pub use conflict_repository::InMemoryConflictRepository;
pub use event_ledger::InMemoryEventLedger;
pub use event_type_registry::InMemoryEventTypeRegistry;
pub use sync_log_repository::InMemorySyncLogRepository;
