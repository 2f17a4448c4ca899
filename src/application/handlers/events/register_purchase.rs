//! RegisterPurchaseHandler - Command handler for purchase events.

use serde::{Deserialize, Serialize};

use super::{EventRegistrar, RegisteredEvent};
use crate::domain::event::{PurchaseDetail, EventError, EventInput};

/// Base event fields plus the purchase detail, as one flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterPurchaseCommand {
    #[serde(flatten)]
    pub event: EventInput,
    #[serde(flatten)]
    pub purchase: PurchaseDetail,
}

/// Handler for purchase registration.
pub struct RegisterPurchaseHandler {
    registrar: EventRegistrar,
}

impl RegisterPurchaseHandler {
    pub fn new(registrar: EventRegistrar) -> Self {
        Self { registrar }
    }

    pub async fn handle(
        &self,
        cmd: RegisterPurchaseCommand,
    ) -> Result<RegisteredEvent<PurchaseDetail>, EventError> {
        self.registrar.register_with(cmd.event, cmd.purchase).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::event::{EventKind, Money};
    use crate::domain::foundation::{AnimalId, SupplierId};

    #[tokio::test]
    async fn free_purchase_is_rejected() {
        let fx = fixture();
        let handler = RegisterPurchaseHandler::new(fx.registrar.clone());
        let err = handler
            .handle(RegisterPurchaseCommand {
                event: input(EventKind::Purchase, AnimalId::new(), 3),
                purchase: PurchaseDetail {
                    supplier_id: SupplierId::new(),
                    purchase_price: Money::from_cents(0),
                    weight: None,
                },
            })
            .await
            .unwrap_err();
        assert!(matches!(err, EventError::ValidationFailed { .. }));
        assert!(fx.ledger.is_empty().await);
    }
}
