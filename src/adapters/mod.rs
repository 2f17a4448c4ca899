//! Adapters - Implementations of port interfaces.
//!
//! - `memory` - In-process stores for tests and offline devices
//! - `postgres` - PostgreSQL persistence via `sqlx`

pub mod memory;
pub mod postgres;
