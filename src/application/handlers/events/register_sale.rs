//! RegisterSaleHandler - Command handler for sale events.

use serde::{Deserialize, Serialize};

use super::{EventRegistrar, RegisteredEvent};
use crate::domain::event::{EventError, EventInput, SaleDetail};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterSaleCommand {
    #[serde(flatten)]
    pub event: EventInput,
    #[serde(flatten)]
    pub sale: SaleDetail,
}

/// Handler for sale registration.
///
/// Price per kilogram is derived from price and weight when the caller
/// leaves it out.
pub struct RegisterSaleHandler {
    registrar: EventRegistrar,
}

impl RegisterSaleHandler {
    pub fn new(registrar: EventRegistrar) -> Self {
        Self { registrar }
    }

    pub async fn handle(&self, cmd: RegisterSaleCommand) -> Result<RegisteredEvent<SaleDetail>, EventError> {
        let sale = cmd.sale.with_derived_price_per_kg();
        self.registrar.register_with(cmd.event, sale).await
    }
}
