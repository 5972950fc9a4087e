use crate::{
    commands::Command,
    db::DbPool,
    entities::equipment,
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterEquipmentCommand {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub serial_no: Option<String>,
    #[validate(range(min = 0, message = "qty cannot be negative"))]
    pub qty: i32,
}

impl RegisterEquipmentCommand {
    pub fn new(name: impl Into<String>, qty: i32) -> Self {
        Self {
            name: name.into(),
            serial_no: None,
            qty,
        }
    }
}

#[async_trait::async_trait]
impl Command for RegisterEquipmentCommand {
    type Result = equipment::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(name = %self.name))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;

        let now = Utc::now();
        let record = equipment::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(self.name.clone()),
            serial_no: Set(self.serial_no.clone()),
            qty: Set(self.qty),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let saved = record.insert(db_pool.as_ref()).await.map_err(|e| {
            error!("Failed to register equipment: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        info!(equipment_id = %saved.id, qty = saved.qty, "Equipment registered");

        if let Err(e) = event_sender.send(Event::EquipmentRegistered(saved.id)).await {
            warn!(equipment_id = %saved.id, "Failed to send equipment event: {}", e);
        }

        Ok(saved)
    }
}
