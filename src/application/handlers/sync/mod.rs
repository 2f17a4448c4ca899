//! Synchronization command and query handlers.

mod get_sync_log;
mod list_open_conflicts;
mod list_pending;
mod mark_synced;
mod resolve_conflict;
mod run_sync_session;

pub use get_sync_log::{GetSyncLogHandler, GetSyncLogQuery};
pub use list_open_conflicts::{ListOpenConflictsHandler, ListOpenConflictsQuery};
pub use list_pending::{ListPendingSyncHandler, ListPendingSyncQuery};
pub use mark_synced::{MarkEventsSyncedCommand, MarkEventsSyncedHandler};
pub use resolve_conflict::{ConflictSettlement, ResolveConflictCommand, ResolveConflictHandler};
pub use run_sync_session::{RunSyncSessionCommand, RunSyncSessionHandler, SyncSessionOutcome};
