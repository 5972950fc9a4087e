use crate::{
    commands::Command,
    db::DbPool,
    entities::job::{self, JobPriority, JobScope, JobStatus},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_schedule"))]
pub struct CreateJobCommand {
    #[validate(length(min = 1, message = "customer_id is required"))]
    pub customer_id: String,
    pub scope: JobScope,
    pub priority: JobPriority,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub workers: Vec<String>,
    pub location_id: Option<String>,
    #[serde(default)]
    pub equipments: Vec<Uuid>,
    pub requested_by: Option<String>,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}

fn validate_schedule(cmd: &CreateJobCommand) -> Result<(), ValidationError> {
    if cmd.customer_id.trim().is_empty() {
        let mut err = ValidationError::new("customer_id");
        err.message = Some("customer_id must not be blank".into());
        return Err(err);
    }
    if cmd.end_date < cmd.start_date {
        let mut err = ValidationError::new("end_date");
        err.message = Some("end_date must not be before start_date".into());
        return Err(err);
    }
    Ok(())
}

impl CreateJobCommand {
    /// A normal-priority job with no workers or equipment assigned yet.
    pub fn new(
        customer_id: impl Into<String>,
        scope: JobScope,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        Self {
            customer_id: customer_id.into(),
            scope,
            priority: JobPriority::Normal,
            start_date,
            end_date,
            start_time: None,
            end_time: None,
            workers: Vec::new(),
            location_id: None,
            equipments: Vec::new(),
            requested_by: None,
            remarks: None,
        }
    }

    pub fn with_workers<I, S>(mut self, workers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.workers = workers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_equipments(mut self, equipments: Vec<Uuid>) -> Self {
        self.equipments = equipments;
        self
    }

    pub fn requested_by(mut self, uid: impl Into<String>) -> Self {
        self.requested_by = Some(uid.into());
        self
    }
}

#[async_trait::async_trait]
impl Command for CreateJobCommand {
    type Result = job::Model;

    #[instrument(skip(self, db_pool, event_sender), fields(customer_id = %self.customer_id))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate().map_err(|e| {
            error!("Invalid job: {}", e);
            ServiceError::from(e)
        })?;

        let now = Utc::now();
        let record = job::ActiveModel {
            id: Set(Uuid::new_v4()),
            status: Set(JobStatus::Created),
            scope: Set(self.scope),
            priority: Set(self.priority),
            start_date: Set(self.start_date),
            end_date: Set(self.end_date),
            start_time: Set(self.start_time),
            end_time: Set(self.end_time),
            workers: Set(serde_json::to_value(&self.workers)?),
            customer_id: Set(self.customer_id.clone()),
            location_id: Set(self.location_id.clone()),
            equipments: Set(serde_json::to_value(&self.equipments)?),
            is_returned_equipment: Set(false),
            requested_by: Set(self.requested_by.clone()),
            remarks: Set(self.remarks.clone()),
            start_by: Set(None),
            start_by_at: Set(None),
            end_by: Set(None),
            end_by_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let job = record.insert(db_pool.as_ref()).await.map_err(|e| {
            error!("Failed to create job: {}", e);
            ServiceError::DatabaseError(e)
        })?;

        info!(job_id = %job.id, "Job created");

        if let Err(e) = event_sender.send(Event::JobCreated(job.id)).await {
            warn!(job_id = %job.id, "Failed to send job created event: {}", e);
        }

        Ok(job)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    #[test]
    fn accepts_single_day_job() {
        let cmd = CreateJobCommand::new("cust-1", JobScope::Lab, day(3), day(3));
        assert!(cmd.validate().is_ok());
    }

    #[test]
    fn rejects_end_before_start() {
        let cmd = CreateJobCommand::new("cust-1", JobScope::Onsite, day(5), day(4));
        assert!(cmd.validate().is_err());
    }

    #[test]
    fn rejects_missing_customer() {
        assert!(CreateJobCommand::new("", JobScope::Lab, day(1), day(2))
            .validate()
            .is_err());
        assert!(CreateJobCommand::new("   ", JobScope::Lab, day(1), day(2))
            .validate()
            .is_err());
    }
}
