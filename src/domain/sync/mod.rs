//! Offline synchronization model.
//!
//! Sync run logs, conflict resolution records, resolution strategies, and the
//! payload fingerprint used to decide whether two versions of a fact diverge.

mod conflict;
mod errors;
mod fingerprint;
mod strategy;
mod sync_log;

pub use conflict::{ConflictResolution, ConflictResolutionParts, ANIMAL_EVENT_ENTITY};
pub use errors::SyncError;
pub use fingerprint::{diverges, payload_fingerprint, same_logical_fact, snapshot};
pub use strategy::{ConflictPolicy, ResolutionDecision, ResolutionStrategy};
pub use sync_log::{SyncCounts, SyncRunLog, SyncRunStatus};
