//! RegisterDeathHandler - Command handler for death events.

use serde::{Deserialize, Serialize};

use super::{EventRegistrar, RegisteredEvent};
use crate::domain::event::{DeathDetail, EventError, EventInput};

/// Base event fields plus the death detail, as one flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterDeathCommand {
    #[serde(flatten)]
    pub event: EventInput,
    #[serde(flatten)]
    pub death: DeathDetail,
}

/// Handler for death registration.
pub struct RegisterDeathHandler {
    registrar: EventRegistrar,
}

impl RegisterDeathHandler {
    pub fn new(registrar: EventRegistrar) -> Self {
        Self { registrar }
    }

    pub async fn handle(
        &self,
        cmd: RegisterDeathCommand,
    ) -> Result<RegisteredEvent<DeathDetail>, EventError> {
        self.registrar.register_with(cmd.event, cmd.death).await
    }
}
