//! RegisterWeaningHandler - Command handler for weaning events.

use serde::{Deserialize, Serialize};

use super::{EventRegistrar, RegisteredEvent};
use crate::domain::event::{WeaningDetail, EventError, EventInput};

/// Base event fields plus the weaning detail, as one flat record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterWeaningCommand {
    #[serde(flatten)]
    pub event: EventInput,
    #[serde(flatten)]
    pub weaning: WeaningDetail,
}

/// Handler for weaning registration.
pub struct RegisterWeaningHandler {
    registrar: EventRegistrar,
}

impl RegisterWeaningHandler {
    pub fn new(registrar: EventRegistrar) -> Self {
        Self { registrar }
    }

    pub async fn handle(
        &self,
        cmd: RegisterWeaningCommand,
    ) -> Result<RegisteredEvent<WeaningDetail>, EventError> {
        self.registrar.register_with(cmd.event, cmd.weaning).await
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::event::{EventKind, WeaningType, Weight};
    use crate::domain::foundation::AnimalId;

    fn weaning(age_days: u32) -> WeaningDetail {
        WeaningDetail {
            weaning_weight: Some(Weight::from_kg(180.0).unwrap()),
            age_days,
            weaning_type: WeaningType::Conventional,
        }
    }

    #[tokio::test]
    async fn zero_age_is_rejected() {
        let fx = fixture();
        let handler = RegisterWeaningHandler::new(fx.registrar.clone());
        let result = handler
            .handle(RegisterWeaningCommand {
                event: input(EventKind::Weaning, AnimalId::new(), 1),
                weaning: weaning(0),
            })
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn registers_weaning() {
        let fx = fixture();
        let handler = RegisterWeaningHandler::new(fx.registrar.clone());
        let registered = handler
            .handle(RegisterWeaningCommand {
                event: input(EventKind::Weaning, AnimalId::new(), 1),
                weaning: weaning(210),
            })
            .await
            .unwrap();
        assert_eq!(registered.detail.age_days, 210);
    }
}
