//! RegisterBirthHandler - Command handler for birth events.

use serde::{Deserialize, Serialize};

use super::{EventRegistrar, RegisteredEvent};
use crate::domain::event::{BirthDetail, EventError, EventInput};

/// Base event fields plus the birth detail, as one flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterBirthCommand {
    #[serde(flatten)]
    pub event: EventInput,
    #[serde(flatten)]
    pub birth: BirthDetail,
}

/// Handler for birth registration.
pub struct RegisterBirthHandler {
    registrar: EventRegistrar,
}

impl RegisterBirthHandler {
    pub fn new(registrar: EventRegistrar) -> Self {
        Self { registrar }
    }

    pub async fn handle(
        &self,
        cmd: RegisterBirthCommand,
    ) -> Result<RegisteredEvent<BirthDetail>, EventError> {
        self.registrar.register_with(cmd.event, cmd.birth).await
    }
}
