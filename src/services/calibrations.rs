use crate::{
    commands::{calibrations::RecordCalibrationCommand, Command},
    db::DbPool,
    due_date::{self, DueState},
    entities::calibration::{self, DueDateRequest},
    errors::ServiceError,
    events::EventSender,
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

/// A calibration together with its resolved due date.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DueCalibration {
    pub calibration: calibration::Model,
    pub due_date: NaiveDate,
}

/// Service for calibration records and certificate due dates
#[derive(Clone)]
pub struct CalibrationService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
    due_soon_window_days: u32,
}

impl CalibrationService {
    pub fn new(
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
        due_soon_window_days: u32,
    ) -> Self {
        Self {
            db_pool,
            event_sender,
            due_soon_window_days,
        }
    }

    #[instrument(skip(self))]
    pub async fn record(
        &self,
        command: RecordCalibrationCommand,
    ) -> Result<calibration::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    #[instrument(skip(self))]
    pub async fn get_calibration(
        &self,
        calibration_id: Uuid,
    ) -> Result<Option<calibration::Model>, ServiceError> {
        calibration::Entity::find_by_id(calibration_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(calibration_id = %calibration_id, error = %e, "Database error when fetching calibration");
                ServiceError::db_error(e)
            })
    }

    #[instrument(skip(self))]
    pub async fn list_for_job(&self, job_id: Uuid) -> Result<Vec<calibration::Model>, ServiceError> {
        calibration::Entity::find()
            .filter(calibration::Column::JobId.eq(job_id))
            .order_by_asc(calibration::Column::DateCalibrated)
            .order_by_asc(calibration::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Due date of a stored calibration; `None` when it carries none.
    #[instrument(skip(self))]
    pub async fn due_date_for(
        &self,
        calibration_id: Uuid,
    ) -> Result<Option<NaiveDate>, ServiceError> {
        let record = self.get_calibration(calibration_id).await?.ok_or_else(|| {
            ServiceError::NotFound(format!("Calibration {} not found", calibration_id))
        })?;
        Ok(record.effective_due_date())
    }

    /// Recall classification of a stored calibration on `today`.
    #[instrument(skip(self))]
    pub async fn due_state_for(
        &self,
        calibration_id: Uuid,
        today: NaiveDate,
    ) -> Result<DueState, ServiceError> {
        let due = self.due_date_for(calibration_id).await?;
        Ok(due_date::due_state(due, today, self.due_soon_window_days))
    }

    /// Calibrations whose due date falls within `from..=to`, earliest first.
    ///
    /// Interval-based due dates are derived, not stored, so the range is
    /// applied after computing each one.
    #[instrument(skip(self))]
    pub async fn list_due_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DueCalibration>, ServiceError> {
        if to < from {
            return Err(ServiceError::ValidationError(format!(
                "range end {} is before range start {}",
                to, from
            )));
        }

        let records = calibration::Entity::find()
            .filter(
                Condition::any()
                    // derived dates never precede the calibration date
                    .add(
                        Condition::all()
                            .add(calibration::Column::DueDateRequested.eq(DueDateRequest::Yes))
                            .add(calibration::Column::DateCalibrated.lte(to)),
                    )
                    .add(
                        Condition::all()
                            .add(calibration::Column::DueDateRequested.eq(DueDateRequest::No))
                            .add(calibration::Column::DueDate.between(from, to)),
                    ),
            )
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)?;

        let mut due: Vec<DueCalibration> = records
            .into_iter()
            .filter_map(|calibration| {
                let due_date = calibration.effective_due_date()?;
                (from..=to)
                    .contains(&due_date)
                    .then_some(DueCalibration {
                        calibration,
                        due_date,
                    })
            })
            .collect();
        due.sort_by_key(|entry| entry.due_date);
        Ok(due)
    }
}
