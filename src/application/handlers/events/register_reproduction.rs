//! RegisterReproductionHandler - Command handler for reproduction events.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::derivation::{estimate_birth_date, next_attempt};
use super::{EventRegistrar, RegisteredEvent};
use crate::domain::event::{
    DiagnosisMethod, EventError, EventInput, ReproductionDetail, ReproductionResult, ServiceType,
};
use crate::domain::foundation::AnimalId;
use crate::domain::metrics::GestationCalculator;
use crate::ports::EventReader;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterReproductionCommand {
    #[serde(flatten)]
    pub event: EventInput,
    #[serde(default)]
    pub service_type: Option<ServiceType>,
    #[serde(default)]
    pub stud_id: Option<AnimalId>,
    #[serde(default)]
    pub result: ReproductionResult,
    #[serde(default)]
    pub diagnosis_date: Option<NaiveDate>,
    #[serde(default)]
    pub diagnosis_method: Option<DiagnosisMethod>,
    /// Derived from the service date when a service type is given and this is absent.
    #[serde(default)]
    pub estimated_birth_date: Option<NaiveDate>,
    /// Derived from the previous reproduction event when absent.
    #[serde(default)]
    pub attempt_number: Option<u32>,
}

pub struct RegisterReproductionHandler {
    registrar: EventRegistrar,
    reader: Arc<dyn EventReader>,
    gestation: GestationCalculator,
}

impl RegisterReproductionHandler {
    pub fn new(
        registrar: EventRegistrar,
        reader: Arc<dyn EventReader>,
        gestation: GestationCalculator,
    ) -> Self {
        Self {
            registrar,
            reader,
            gestation,
        }
    }

    pub async fn handle(
        &self,
        cmd: RegisterReproductionCommand,
    ) -> Result<RegisteredEvent<ReproductionDetail>, EventError> {
        let prepared = self.registrar.prepare(cmd.event).await?;
        let event = prepared.event();

        let attempt_number = match cmd.attempt_number {
            Some(n) => n,
            None => {
                let previous = self
                    .reader
                    .last_reproduction(event.animal_id(), event.event_date())
                    .await?;
                next_attempt(previous.as_ref())
            }
        };

        let mut detail = ReproductionDetail {
            service_type: cmd.service_type,
            stud_id: cmd.stud_id,
            result: cmd.result,
            diagnosis_date: cmd.diagnosis_date,
            diagnosis_method: cmd.diagnosis_method,
            estimated_birth_date: cmd.estimated_birth_date,
            attempt_number,
        };
        estimate_birth_date(&self.gestation, event, &mut detail)?;

        let event = self.registrar.commit(prepared, Some(detail.clone().into())).await?;
        Ok(RegisteredEvent { event, detail })
    }
}
