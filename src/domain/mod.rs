//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, state machine, errors)
//! - `event` - Animal event ledger: base event, variant details, sync status
//! - `metrics` - Pure calculators over event history (ADG, gestation, trends)
//! - `sync` - Sync run logs, conflict records and payload fingerprints

pub mod event;
pub mod foundation;
pub mod metrics;
pub mod sync;
