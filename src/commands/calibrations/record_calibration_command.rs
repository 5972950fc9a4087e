use crate::{
    commands::Command,
    db::DbPool,
    entities::{
        calibration::{self, CalibrationStatus, DueDateRequest},
        job,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Longest recalibration interval accepted, in months.
pub const MAX_DUE_DATE_DURATION_MONTHS: i32 = 120;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_due_date_policy"))]
pub struct RecordCalibrationCommand {
    pub job_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub equipment_description: String,
    pub certificate_no: Option<String>,
    pub date_calibrated: NaiveDate,
    pub due_date_requested: DueDateRequest,
    pub due_date_duration: Option<i32>,
    pub due_date: Option<NaiveDate>,
    pub status: CalibrationStatus,
}

fn validate_due_date_policy(cmd: &RecordCalibrationCommand) -> Result<(), ValidationError> {
    if cmd.due_date_requested == DueDateRequest::Yes {
        match cmd.due_date_duration {
            Some(months) if (1..=MAX_DUE_DATE_DURATION_MONTHS).contains(&months) => {}
            _ => {
                let mut err = ValidationError::new("due_date_duration");
                err.message = Some(
                    format!(
                        "a requested due date needs a duration of 1 to {} months",
                        MAX_DUE_DATE_DURATION_MONTHS
                    )
                    .into(),
                );
                return Err(err);
            }
        }
    }
    Ok(())
}

impl RecordCalibrationCommand {
    /// Calibration with a due date `months` after `date_calibrated`.
    pub fn with_interval(
        job_id: Uuid,
        equipment_description: impl Into<String>,
        date_calibrated: NaiveDate,
        months: i32,
    ) -> Self {
        Self {
            job_id,
            equipment_description: equipment_description.into(),
            certificate_no: None,
            date_calibrated,
            due_date_requested: DueDateRequest::Yes,
            due_date_duration: Some(months),
            due_date: None,
            status: CalibrationStatus::Completed,
        }
    }

    /// Calibration without an interval; `due_date` is taken as entered.
    pub fn without_interval(
        job_id: Uuid,
        equipment_description: impl Into<String>,
        date_calibrated: NaiveDate,
        due_date: Option<NaiveDate>,
    ) -> Self {
        Self {
            job_id,
            equipment_description: equipment_description.into(),
            certificate_no: None,
            date_calibrated,
            due_date_requested: DueDateRequest::No,
            due_date_duration: None,
            due_date,
            status: CalibrationStatus::Completed,
        }
    }

    /// Only the field selected by `due_date_requested` is stored.
    fn normalized_due_fields(&self) -> (Option<i32>, Option<NaiveDate>) {
        match self.due_date_requested {
            DueDateRequest::Yes => (self.due_date_duration, None),
            DueDateRequest::No => (None, self.due_date),
        }
    }
}

#[async_trait::async_trait]
impl Command for RecordCalibrationCommand {
    type Result = calibration::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(job_id = %self.job_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            error!("Invalid calibration: {}", e);
            ServiceError::from(e)
        })?;

        let db = db_pool.as_ref();
        job::Entity::find_by_id(self.job_id)
            .one(db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Job {} not found", self.job_id)))?;

        let (duration, explicit_due_date) = self.normalized_due_fields();
        let record = calibration::ActiveModel {
            id: Set(Uuid::new_v4()),
            job_id: Set(self.job_id),
            equipment_description: Set(self.equipment_description.clone()),
            certificate_no: Set(self.certificate_no.clone()),
            date_calibrated: Set(self.date_calibrated),
            due_date_requested: Set(self.due_date_requested),
            due_date_duration: Set(duration),
            due_date: Set(explicit_due_date),
            status: Set(self.status),
            created_at: Set(Utc::now()),
        };

        let saved = record.insert(db).await.map_err(|e| {
            error!("Failed to record calibration: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        let due_date = saved.effective_due_date();
        info!(calibration_id = %saved.id, ?due_date, "Calibration recorded");

        if let Err(e) = event_sender
            .send(Event::CalibrationRecorded {
                calibration_id: saved.id,
                job_id: saved.job_id,
                due_date,
            })
            .await
        {
            warn!(calibration_id = %saved.id, "Failed to send calibration event: {}", e);
        }

        Ok(saved)
    }
}
