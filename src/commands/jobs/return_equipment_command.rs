use crate::{
    commands::Command,
    db::{with_transaction, DbPool},
    entities::{equipment, job},
    errors::ServiceError,
    events::{Event, EventSender},
    notifications::NotificationRequest,
};
use chrono::Utc;
use sea_orm::{sea_query::Expr, ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Books a job's loaned equipment back into stock.
///
/// Every listed equipment row gets `qty + 1` (a duplicated id counts once per
/// occurrence) and the job's return flag is set, in one transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnEquipmentCommand {
    pub job_id: Uuid,
    pub equipment_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReturnOutcome {
    pub job: job::Model,
    pub returned_units: usize,
    pub notification_error: Option<String>,
}

impl ReturnOutcome {
    pub fn is_partial_failure(&self) -> bool {
        self.notification_error.is_some()
    }
}

impl ReturnEquipmentCommand {
    pub fn new(job_id: Uuid, equipment_ids: Vec<Uuid>) -> Self {
        Self {
            job_id,
            equipment_ids,
        }
    }

    async fn apply(&self, txn: &DatabaseTransaction) -> Result<job::Model, ServiceError> {
        let current = job::Entity::find_by_id(self.job_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Job {} not found", self.job_id)))?;

        if current.is_returned_equipment {
            return Err(ServiceError::AlreadyReturned(self.job_id));
        }
        if !current.status.allows_equipment_return() {
            return Err(ServiceError::InvalidOperation(format!(
                "equipment cannot be returned while job {} is {}",
                self.job_id, current.status
            )));
        }

        let now = Utc::now();
        for equipment_id in &self.equipment_ids {
            let result = equipment::Entity::update_many()
                .col_expr(
                    equipment::Column::Qty,
                    Expr::col(equipment::Column::Qty).add(1),
                )
                .col_expr(equipment::Column::UpdatedAt, Expr::value(now))
                .filter(equipment::Column::Id.eq(*equipment_id))
                .exec(txn)
                .await
                .map_err(|e| {
                    ServiceError::PartialFailure(format!(
                        "incrementing equipment {} failed: {}",
                        equipment_id, e
                    ))
                })?;

            if result.rows_affected == 0 {
                return Err(ServiceError::PartialFailure(format!(
                    "equipment {} does not exist",
                    equipment_id
                )));
            }
        }

        let flagged = job::Entity::update_many()
            .col_expr(job::Column::IsReturnedEquipment, Expr::value(true))
            .col_expr(job::Column::UpdatedAt, Expr::value(now))
            .filter(job::Column::Id.eq(self.job_id))
            .filter(job::Column::IsReturnedEquipment.eq(false))
            .exec(txn)
            .await
            .map_err(|e| {
                ServiceError::PartialFailure(format!(
                    "marking job {} as returned failed: {}",
                    self.job_id, e
                ))
            })?;

        // Another return committed between our read and this write.
        if flagged.rows_affected == 0 {
            return Err(ServiceError::AlreadyReturned(self.job_id));
        }

        job::Entity::find_by_id(self.job_id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("Job {} vanished during return", self.job_id))
            })
    }
}

#[async_trait::async_trait]
impl Command for ReturnEquipmentCommand {
    type Result = ReturnOutcome;

    #[instrument(skip(self, db_pool, event_sender), fields(job_id = %self.job_id, units = self.equipment_ids.len()))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        let command = self.clone();
        let job = with_transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move { command.apply(txn).await })
        })
        .await
        .map_err(|e| {
            let e = e.aborted_write(&format!("equipment return for job {}", self.job_id));
            if e.is_notice() {
                info!(job_id = %self.job_id, "Equipment already returned");
            } else {
                error!(job_id = %self.job_id, "Equipment return aborted: {}", e);
            }
            e
        })?;

        let returned_units = self.equipment_ids.len();
        info!(job_id = %job.id, returned_units, "Equipment returned to stock");

        if let Err(e) = event_sender
            .send(Event::EquipmentReturned {
                job_id: job.id,
                units: returned_units,
            })
            .await
        {
            warn!(job_id = %job.id, "Failed to send equipment returned event: {}", e);
        }

        let request = NotificationRequest::equipment_returned(&job, returned_units);
        let notification_error = match event_sender.send(Event::Notification(request)).await {
            Ok(()) => None,
            Err(e) => {
                warn!(job_id = %job.id, "Return committed but notification failed: {}", e);
                Some(e)
            }
        };

        Ok(ReturnOutcome {
            job,
            returned_units,
            notification_error,
        })
    }
}
