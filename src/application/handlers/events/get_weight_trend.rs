//! GetWeightTrendHandler - Weight history of one animal.

use std::sync::Arc;

use crate::domain::event::{EventError, EventKind, EventTypeCode};
use crate::domain::foundation::AnimalId;
use crate::domain::metrics::{weight_trend, WeighingPoint, WeightTrend};
use crate::ports::EventReader;

#[derive(Debug, Clone)]
pub struct GetWeightTrendQuery {
    pub animal_id: AnimalId,
}

pub struct GetWeightTrendHandler {
    reader: Arc<dyn EventReader>,
}

impl GetWeightTrendHandler {
    pub fn new(reader: Arc<dyn EventReader>) -> Self {
        Self { reader }
    }

    /// `None` until the animal has two weighings.
    pub async fn handle(&self, query: GetWeightTrendQuery) -> Result<Option<WeightTrend>, EventError> {
        let code = EventTypeCode::new(EventKind::Weighing.type_code())?;
        let points: Vec<WeighingPoint> = self
            .reader
            .find_by_animal_and_type(&query.animal_id, &code)
            .await?
            .iter()
            .filter_map(|e| {
                e.detail().and_then(|d| d.as_weighing()).map(|w| WeighingPoint {
                    event_id: *e.id(),
                    event_date: *e.event_date(),
                    weight: w.weight,
                })
            })
            .collect();
        Ok(weight_trend(&points))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::application::handlers::events::{RegisterWeighingCommand, RegisterWeighingHandler};
    use crate::domain::event::{Weight, WeighingType};
    use crate::domain::foundation::Timestamp;

    #[tokio::test]
    async fn trend_spans_all_weighings() {
        let fx = fixture();
        let animal = AnimalId::new();
        let weighings = RegisterWeighingHandler::new(fx.registrar.clone(), fx.ledger.clone());
        let t0 = Timestamp::now().minus_days(60);
        for (offset, kg) in [(0, 300.0), (30, 330.0), (60, 345.0)] {
            let mut event = input(EventKind::Weighing, animal, 0);
            event.event_date = t0.add_days(offset);
            weighings
                .handle(RegisterWeighingCommand {
                    event,
                    weight: Weight::from_kg(kg).unwrap(),
                    weighing_type: WeighingType::Control,
                    body_condition: None,
                })
                .await
                .unwrap();
        }

        let trend = GetWeightTrendHandler::new(fx.ledger.clone())
            .handle(GetWeightTrendQuery { animal_id: animal })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(trend.intervals.len(), 2);
        assert_eq!(trend.total_gain_kg, 45.0);
        assert_eq!(trend.overall_adg(), Some(0.75));
    }
}
