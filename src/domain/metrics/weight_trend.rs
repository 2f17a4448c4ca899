//! Weight history walk.
//!
//! Weighings can arrive in any order. The trend sorts them by business time
//! before pairing neighbours, so a late upload lands between the right two
//! readings.

use serde::{Deserialize, Serialize};

use super::AdgCalculator;
use crate::domain::event::{AverageDailyGain, Weight};
use crate::domain::foundation::{EventId, Timestamp};

/// One weighing fact, as read from the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeighingPoint {
    pub event_id: EventId,
    pub event_date: Timestamp,
    pub weight: Weight,
}

/// Gain between two consecutive weighings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTrendPoint {
    pub from_event_id: EventId,
    pub to_event_id: EventId,
    pub days: i64,
    pub average_daily_gain: AverageDailyGain,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightTrend {
    /// Valid intervals only; same-day pairs and implausible gains are dropped.
    pub intervals: Vec<WeightTrendPoint>,
    /// Last minus first weight, in kg.
    pub total_gain_kg: f64,
    pub total_days: i64,
}

impl WeightTrend {
    /// Overall gain across the whole history, when it spans at least a day.
    pub fn overall_adg(&self) -> Option<f64> {
        if self.total_days <= 0 {
            return None;
        }
        let raw = self.total_gain_kg / self.total_days as f64;
        Some((raw * 1000.0).round() / 1000.0)
    }
}

/// Builds the trend for one animal. Returns `None` for fewer than two weighings.
pub fn weight_trend(points: &[WeighingPoint]) -> Option<WeightTrend> {
    if points.len() < 2 {
        return None;
    }

    let mut sorted: Vec<&WeighingPoint> = points.iter().collect();
    sorted.sort_by(|a, b| a.event_date.cmp(&b.event_date));

    let intervals = sorted
        .windows(2)
        .filter_map(|pair| {
            let (prev, next) = (pair[0], pair[1]);
            let days = next.event_date.whole_days_since(&prev.event_date);
            AdgCalculator::compute(next.weight, prev.weight, days)
                .ok()
                .map(|adg| WeightTrendPoint {
                    from_event_id: prev.event_id,
                    to_event_id: next.event_id,
                    days,
                    average_daily_gain: adg,
                })
        })
        .collect();

    let first = sorted[0];
    let last = sorted[sorted.len() - 1];
    Some(WeightTrend {
        intervals,
        total_gain_kg: ((last.weight.kg() - first.weight.kg()) * 100.0).round() / 100.0,
        total_days: last.event_date.whole_days_since(&first.event_date),
    })
}
