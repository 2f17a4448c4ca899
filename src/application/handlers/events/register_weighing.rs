//! RegisterWeighingHandler - Command handler for weighing events.
//!
//! Links each weighing to the animal's previous one by business time and
//! derives the average daily gain between them. ADG is advisory: a
//! calculator rejection leaves it out, the weighing is still stored.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::derivation::link_weighing;
use super::{EventRegistrar, RegisteredEvent};
use crate::domain::event::{
    BodyCondition, EventError, EventInput, WeighingDetail, WeighingType, Weight,
};
use crate::ports::EventReader;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterWeighingCommand {
    #[serde(flatten)]
    pub event: EventInput,
    pub weight: Weight,
    pub weighing_type: WeighingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_condition: Option<BodyCondition>,
}

pub struct RegisterWeighingHandler {
    registrar: EventRegistrar,
    reader: Arc<dyn EventReader>,
}

impl RegisterWeighingHandler {
    pub fn new(registrar: EventRegistrar, reader: Arc<dyn EventReader>) -> Self {
        Self { registrar, reader }
    }

    pub async fn handle(
        &self,
        cmd: RegisterWeighingCommand,
    ) -> Result<RegisteredEvent<WeighingDetail>, EventError> {
        let prepared = self.registrar.prepare(cmd.event).await?;

        let mut detail = WeighingDetail::new(cmd.weight, cmd.weighing_type);
        detail.body_condition = cmd.body_condition;

        let event = prepared.event();
        let previous = self
            .reader
            .last_weighing(event.animal_id(), event.event_date())
            .await?;
        link_weighing(event, previous.as_ref(), &mut detail);

        let event = self.registrar.commit(prepared, Some(detail.clone().into())).await?;
        Ok(RegisteredEvent { event, detail })
    }
}
