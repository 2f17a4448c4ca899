//! Livestock Ledger - Animal event ledger with offline synchronization
//!
//! This crate records the life history of farm animals as an append-only
//! ledger of typed events (births, weighings, treatments, sales, ...) and
//! reconciles events captured offline on field devices with the server copy.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod telemetry;
