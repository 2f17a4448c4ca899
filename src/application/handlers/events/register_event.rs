//! RegisterEventHandler - Command handler for base events without a detail.
//!
//! Covers registry types that carry no variant payload. Types whose
//! definition names a detail kind go through their variant handler instead.

use serde::{Deserialize, Serialize};

use super::EventRegistrar;
use crate::domain::event::{AnimalEvent, EventError, EventInput};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterEventCommand {
    #[serde(flatten)]
    pub event: EventInput,
}

pub struct RegisterEventHandler {
    registrar: EventRegistrar,
}

impl RegisterEventHandler {
    pub fn new(registrar: EventRegistrar) -> Self {
        Self { registrar }
    }

    pub async fn handle(&self, cmd: RegisterEventCommand) -> Result<AnimalEvent, EventError> {
        let prepared = self.registrar.prepare(cmd.event).await?;
        if let Some(kind) = prepared.definition().kind {
            return Err(EventError::validation(
                "event_type",
                format!("{} events must be registered with their {} details", prepared.definition().code, kind),
            ));
        }
        self.registrar.commit(prepared, None).await
    }
}
