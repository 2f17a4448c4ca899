//! RegisterHealthHandler - Command handler for health treatment events.

use serde::{Deserialize, Serialize};

use super::{EventRegistrar, RegisteredEvent};
use crate::domain::event::{HealthDetail, EventError, EventInput};

/// Base event fields plus the health treatment detail, as one flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterHealthCommand {
    #[serde(flatten)]
    pub event: EventInput,
    #[serde(flatten)]
    pub health: HealthDetail,
}

/// Handler for health treatment registration.
pub struct RegisterHealthHandler {
    registrar: EventRegistrar,
}

impl RegisterHealthHandler {
    pub fn new(registrar: EventRegistrar) -> Self {
        Self { registrar }
    }

    pub async fn handle(
        &self,
        cmd: RegisterHealthCommand,
    ) -> Result<RegisteredEvent<HealthDetail>, EventError> {
        self.registrar.register_with(cmd.event, cmd.health).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::event::{AdministrationRoute, EventKind};
    use crate::domain::foundation::{AnimalId, ProductId};

    #[tokio::test]
    async fn blank_dose_is_rejected() {
        let fx = fixture();
        let handler = RegisterHealthHandler::new(fx.registrar.clone());
        let err = handler
            .handle(RegisterHealthCommand {
                event: input(EventKind::Health, AnimalId::new(), 1),
                health: HealthDetail {
                    product_id: ProductId::new(),
                    dose: "".to_string(),
                    route: AdministrationRoute::Subcutaneous,
                    requires_follow_up: false,
                    next_check_date: None,
                },
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::ValidationFailed { ref field, .. } if field == "dose"));
        assert!(fx.ledger.is_empty().await);
    }
}
