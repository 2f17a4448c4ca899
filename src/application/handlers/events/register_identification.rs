//! RegisterIdentificationHandler - Command handler for identification change events.

use serde::{Deserialize, Serialize};

use super::{EventRegistrar, RegisteredEvent};
use crate::domain::event::{IdentificationDetail, EventError, EventInput};

/// Base event fields plus the identification change detail, as one flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterIdentificationCommand {
    #[serde(flatten)]
    pub event: EventInput,
    #[serde(flatten)]
    pub identification: IdentificationDetail,
}

/// Handler for identification change registration.
pub struct RegisterIdentificationHandler {
    registrar: EventRegistrar,
}

impl RegisterIdentificationHandler {
    pub fn new(registrar: EventRegistrar) -> Self {
        Self { registrar }
    }

    pub async fn handle(
        &self,
        cmd: RegisterIdentificationCommand,
    ) -> Result<RegisteredEvent<IdentificationDetail>, EventError> {
        self.registrar.register_with(cmd.event, cmd.identification).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::event::{EventKind, IdentificationType};
    use crate::domain::foundation::AnimalId;

    #[tokio::test]
    async fn retag_keeps_previous_identifier() {
        let fx = fixture();
        let handler = RegisterIdentificationHandler::new(fx.registrar.clone());
        let registered = handler
            .handle(RegisterIdentificationCommand {
                event: input(EventKind::Identification, AnimalId::new(), 0),
                identification: IdentificationDetail {
                    identification_type: IdentificationType::ElectronicTag,
                    previous_identifier: Some("UY-0042".to_string()),
                    new_identifier: "982 000123456789".to_string(),
                    reason: Some("tag lost".to_string()),
                },
            })
            .await
            .unwrap();
        assert_eq!(registered.detail.previous_identifier.as_deref(), Some("UY-0042"));
    }
}
