//! Detail fields derived from an animal's history.
//!
//! Shared by the single-event handlers and by queue ingestion, so a weighing
//! or service gets the same derived values whichever path stores it.

use crate::domain::event::{AnimalEvent, ReproductionDetail, ReproductionResult, WeighingDetail};
use crate::domain::foundation::{Timestamp, ValidationError};
use crate::domain::metrics::{AdgCalculator, GestationCalculator};
use crate::ports::{ReproductionProjection, WeighingProjection};

/// Links a weighing to its predecessor and derives the average daily gain.
///
/// Any previously derived values on `detail` are replaced. A calculator
/// rejection leaves the gain out; the weighing itself is never refused.
pub(crate) fn link_weighing(
    event: &AnimalEvent,
    previous: Option<&WeighingProjection>,
    detail: &mut WeighingDetail,
) {
    detail.average_daily_gain = None;
    detail.days_since_previous = None;
    detail.previous_weighing_id = None;

    let Some(previous) = previous else {
        return;
    };
    let days = event.event_date().whole_days_since(&previous.event_date);
    detail.days_since_previous = Some(days);
    detail.previous_weighing_id = Some(previous.event_id);

    if days <= 0 {
        tracing::debug!(animal_id = %event.animal_id(), "same-day weighing, no average daily gain");
        return;
    }
    match AdgCalculator::compute(detail.weight, previous.weight, days) {
        Ok(adg) => detail.average_daily_gain = Some(adg),
        Err(err) => tracing::warn!(
            animal_id = %event.animal_id(),
            previous_weighing_id = %previous.event_id,
            error = %err,
            "average daily gain omitted"
        ),
    }
}

/// Fills the estimated birth date of a service that does not carry one.
pub(crate) fn estimate_birth_date(
    gestation: &GestationCalculator,
    event: &AnimalEvent,
    detail: &mut ReproductionDetail,
) -> Result<(), ValidationError> {
    if detail.estimated_birth_date.is_none() && detail.service_type.is_some() {
        detail.estimated_birth_date = Some(
            gestation
                .estimated_birth_date(event.event_date().date())
                .map_err(ValidationError::from)?,
        );
    }
    Ok(())
}

/// Attempt number following `previous`: a new cycle starts after a confirmed pregnancy.
pub(crate) fn next_attempt(previous: Option<&ReproductionProjection>) -> u32 {
    match previous {
        Some(p) if p.result != ReproductionResult::Pregnant => p.attempt_number.saturating_add(1),
        _ => 1,
    }
}

pub(crate) fn weighing_projection(event: &AnimalEvent, detail: &WeighingDetail) -> WeighingProjection {
    WeighingProjection {
        event_id: *event.id(),
        event_date: *event.event_date(),
        weight: detail.weight,
    }
}

pub(crate) fn reproduction_projection(
    event: &AnimalEvent,
    detail: &ReproductionDetail,
) -> ReproductionProjection {
    ReproductionProjection {
        event_id: *event.id(),
        event_date: *event.event_date(),
        service_type: detail.service_type,
        result: detail.result,
        attempt_number: detail.attempt_number,
        estimated_birth_date: detail.estimated_birth_date,
    }
}

/// The later of two candidate predecessors, by business time.
pub(crate) fn later<T>(a: Option<T>, b: Option<T>, date: impl Fn(&T) -> Timestamp) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if date(&b).is_after(&date(&a)) { b } else { a }),
        (a, b) => a.or(b),
    }
}
