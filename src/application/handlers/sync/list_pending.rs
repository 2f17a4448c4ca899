//! ListPendingSyncHandler - Events not yet acknowledged by the server.

use std::sync::Arc;

use crate::domain::event::{AnimalEvent, EventError};
use crate::domain::foundation::DeviceId;
use crate::ports::EventReader;

#[derive(Debug, Clone, Default)]
pub struct ListPendingSyncQuery {
    /// Restricts the listing to one device's queue.
    pub device_id: Option<DeviceId>,
}

pub struct ListPendingSyncHandler {
    reader: Arc<dyn EventReader>,
}

impl ListPendingSyncHandler {
    pub fn new(reader: Arc<dyn EventReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(&self, query: ListPendingSyncQuery) -> Result<Vec<AnimalEvent>, EventError> {
        Ok(self.reader.find_pending_sync(query.device_id.as_ref()).await?)
    }
}
