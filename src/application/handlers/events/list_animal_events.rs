//! ListAnimalEventsHandler - Query handler for an animal's history.

use std::sync::Arc;

use crate::domain::event::{AnimalEvent, EventError};
use crate::domain::foundation::AnimalId;
use crate::ports::{EventReader, Page, PageRequest};

#[derive(Debug, Clone)]
pub struct ListAnimalEventsQuery {
    pub animal_id: AnimalId,
    pub page: PageRequest,
}

pub struct ListAnimalEventsHandler {
    reader: Arc<dyn EventReader>,
}

impl ListAnimalEventsHandler {
    pub fn new(reader: Arc<dyn EventReader>) -> Self {
        Self { reader }
    }

    pub async fn handle(&self, query: ListAnimalEventsQuery) -> Result<Page<AnimalEvent>, EventError> {
        Ok(self.reader.find_by_animal(&query.animal_id, &query.page).await?)
    }
}
