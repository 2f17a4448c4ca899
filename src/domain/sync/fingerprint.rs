//! Business payload fingerprint and divergence check.
//!
//! Two events are the same logical fact when they share animal, type code
//! and event timestamp. They diverge when their business payloads differ.
//! Sync bookkeeping (ids, sequence, status, capture and sync times, device)
//! never takes part in the comparison, and neither do the weighing fields
//! derived from history or the capture mode (`is_manual`).
//!
//! Numbers are canonicalized before hashing: a JSONB round trip turns `1.0`
//! into `1`, so integral floats hash as integers.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::event::{EventCategory, EventDetail, EventMetadata, EventRecord, EventTypeCode};
use crate::domain::foundation::{FarmId, LotId, PaddockId};

#[derive(Serialize)]
struct BusinessPayload<'a> {
    event_type: &'a EventTypeCode,
    category: EventCategory,
    farm_id: Option<&'a FarmId>,
    lot_id: Option<&'a LotId>,
    paddock_id: Option<&'a PaddockId>,
    gps_location: Option<&'a str>,
    observations: Option<&'a str>,
    detail: Option<EventDetail>,
    metadata: &'a EventMetadata,
}

impl<'a> From<&'a EventRecord> for BusinessPayload<'a> {
    fn from(record: &'a EventRecord) -> Self {
        Self {
            event_type: &record.event_type,
            category: record.category,
            farm_id: record.farm_id.as_ref(),
            lot_id: record.lot_id.as_ref(),
            paddock_id: record.paddock_id.as_ref(),
            gps_location: record.gps_location.as_ref().map(|g| g.as_str()),
            observations: record.observations.as_deref(),
            detail: record.detail.as_ref().map(EventDetail::without_derived),
            metadata: &record.metadata,
        }
    }
}

/// Hex SHA-256 of the event's business payload.
pub fn payload_fingerprint(record: &EventRecord) -> String {
    // serde_json maps are key-sorted, which keeps the encoding stable.
    let payload = serde_json::to_value(BusinessPayload::from(record)).unwrap_or(Value::Null);
    let encoded = serde_json::to_vec(&canonical(payload)).unwrap_or_default();
    format!("{:x}", Sha256::digest(&encoded))
}

/// Rewrites integral floats as integers, recursively.
fn canonical(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => Value::from(f as i64),
            _ => Value::Number(n),
        },
        Value::Array(items) => Value::Array(items.into_iter().map(canonical).collect()),
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(k, v)| (k, canonical(v))).collect())
        }
        other => other,
    }
}

/// Same animal, same type code, same business timestamp.
pub fn same_logical_fact(a: &EventRecord, b: &EventRecord) -> bool {
    a.animal_id == b.animal_id && a.event_type == b.event_type && a.event_date == b.event_date
}

/// True when both records describe the same fact but disagree on its content.
pub fn diverges(a: &EventRecord, b: &EventRecord) -> bool {
    same_logical_fact(a, b) && payload_fingerprint(a) != payload_fingerprint(b)
}

/// Full JSON snapshot stored on a conflict record.
pub fn snapshot(record: &EventRecord) -> serde_json::Value {
    serde_json::to_value(record).unwrap_or(serde_json::Value::Null)
}
