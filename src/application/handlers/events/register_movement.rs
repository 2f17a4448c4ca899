//! RegisterMovementHandler - Command handler for movement events.

use serde::{Deserialize, Serialize};

use super::{EventRegistrar, RegisteredEvent};
use crate::domain::event::{MovementDetail, EventError, EventInput};

/// Base event fields plus the movement detail, as one flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterMovementCommand {
    #[serde(flatten)]
    pub event: EventInput,
    #[serde(flatten)]
    pub movement: MovementDetail,
}

/// Handler for movement registration.
pub struct RegisterMovementHandler {
    registrar: EventRegistrar,
}

impl RegisterMovementHandler {
    pub fn new(registrar: EventRegistrar) -> Self {
        Self { registrar }
    }

    pub async fn handle(
        &self,
        cmd: RegisterMovementCommand,
    ) -> Result<RegisteredEvent<MovementDetail>, EventError> {
        self.registrar.register_with(cmd.event, cmd.movement).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::event::{EventKind, MovementKind};
    use crate::domain::foundation::{AnimalId, LotId};

    #[tokio::test]
    async fn lot_transfer_is_stored_with_detail() {
        let fx = fixture();
        let handler = RegisterMovementHandler::new(fx.registrar.clone());
        let destination = LotId::new();
        let registered = handler
            .handle(RegisterMovementCommand {
                event: input(EventKind::Movement, AnimalId::new(), 1),
                movement: MovementDetail {
                    kind: MovementKind::LotTransfer,
                    origin_lot_id: Some(LotId::new()),
                    destination_lot_id: Some(destination),
                    origin_paddock_id: None,
                    destination_paddock_id: None,
                    weight: None,
                },
            })
            .await
            .unwrap();
        let stored = fx.ledger.all().await;
        assert_eq!(stored[0].detail(), registered.event.detail());
        assert_eq!(registered.detail.destination_lot_id, Some(destination));
    }
}
