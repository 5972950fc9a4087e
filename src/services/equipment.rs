use crate::{
    commands::{equipment::RegisterEquipmentCommand, Command},
    db::DbPool,
    entities::equipment,
    errors::ServiceError,
    events::EventSender,
};
use sea_orm::{EntityTrait, QueryOrder};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

/// Service for laboratory equipment stock
#[derive(Clone)]
pub struct EquipmentService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl EquipmentService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    #[instrument(skip(self))]
    pub async fn register(
        &self,
        command: RegisterEquipmentCommand,
    ) -> Result<equipment::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_equipment(
        &self,
        equipment_id: Uuid,
    ) -> Result<Option<equipment::Model>, ServiceError> {
        equipment::Entity::find_by_id(equipment_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(equipment_id = %equipment_id, error = %e, "Database error when fetching equipment");
                ServiceError::db_error(e)
            })
    }

    #[instrument(skip(self))]
    pub async fn list_equipment(&self) -> Result<Vec<equipment::Model>, ServiceError> {
        equipment::Entity::find()
            .order_by_asc(equipment::Column::Name)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }
}
