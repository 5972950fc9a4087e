use crate::{
    auth::Actor,
    commands::Command,
    db::{with_transaction, DbPool},
    entities::job::{self, JobPriority},
    errors::ServiceError,
    events::{Event, EventSender},
    lifecycle::{plan_transition, JobAction, Transition},
    notifications::NotificationRequest,
};
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{ColumnTrait, DatabaseTransaction, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Schedule and assignment changes carried by `reschedule` and `edit-detail`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct JobDetailsPatch {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub workers: Option<Vec<String>>,
    pub priority: Option<JobPriority>,
    #[validate(length(max = 2000))]
    pub remarks: Option<String>,
}

impl JobDetailsPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn reschedule_to(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
            ..Default::default()
        }
    }

    fn apply(&self, current: &job::Model, record: &mut job::ActiveModel) -> Result<(), ServiceError> {
        let start_date = self.start_date.unwrap_or(current.start_date);
        let end_date = self.end_date.unwrap_or(current.end_date);
        if end_date < start_date {
            return Err(ServiceError::ValidationError(format!(
                "end_date {} is before start_date {}",
                end_date, start_date
            )));
        }

        if let Some(date) = self.start_date {
            record.start_date = Set(date);
        }
        if let Some(date) = self.end_date {
            record.end_date = Set(date);
        }
        if let Some(time) = self.start_time {
            record.start_time = Set(Some(time));
        }
        if let Some(time) = self.end_time {
            record.end_time = Set(Some(time));
        }
        if let Some(workers) = &self.workers {
            record.workers = Set(serde_json::to_value(workers)?);
        }
        if let Some(priority) = self.priority {
            record.priority = Set(priority);
        }
        if let Some(remarks) = &self.remarks {
            record.remarks = Set(Some(remarks.clone()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TransitionJobCommand {
    pub job_id: Uuid,
    pub action: JobAction,
    pub actor: Actor,
    #[serde(default)]
    #[validate]
    pub details: JobDetailsPatch,
}

/// Result of an applied transition.
///
/// The job mutation is committed whenever an outcome is returned.
/// `notification_error` is set when the follow-up notification could not be
/// handed to the event processor.
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub job: job::Model,
    pub transition: Transition,
    pub notification_error: Option<String>,
}

impl TransitionOutcome {
    pub fn is_partial_failure(&self) -> bool {
        self.notification_error.is_some()
    }
}

impl TransitionJobCommand {
    pub fn new(job_id: Uuid, action: JobAction, actor: Actor) -> Self {
        Self {
            job_id,
            action,
            actor,
            details: JobDetailsPatch::default(),
        }
    }

    pub fn with_details(mut self, details: JobDetailsPatch) -> Self {
        self.details = details;
        self
    }

    /// Reads the job, checks the table and writes the new state, all
    /// through `txn`. The write only matches while the status is still the
    /// one that was checked.
    async fn apply(
        &self,
        txn: &DatabaseTransaction,
    ) -> Result<(job::Model, Transition), ServiceError> {
        let current = job::Entity::find_by_id(self.job_id)
            .one(txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Job {} not found", self.job_id)))?;

        let workers = current.worker_uids()?;
        let transition = plan_transition(current.status, self.action, &self.actor, &workers)?;

        let now = Utc::now();
        let mut record = job::ActiveModel {
            status: Set(transition.to),
            updated_at: Set(now),
            ..Default::default()
        };

        match self.action {
            JobAction::Start => {
                record.start_by = Set(Some(self.actor.uid.clone()));
                record.start_by_at = Set(Some(now));
                record.end_by = Set(None);
                record.end_by_at = Set(None);
            }
            JobAction::Finish => {
                record.end_by = Set(Some(self.actor.uid.clone()));
                record.end_by_at = Set(Some(now));
            }
            _ => {}
        }
        self.details.apply(&current, &mut record)?;

        let result = job::Entity::update_many()
            .set(record)
            .filter(job::Column::Id.eq(self.job_id))
            .filter(job::Column::Status.eq(current.status))
            .exec(txn)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::PartialFailure(format!(
                "job {} changed status while {} was being applied",
                self.job_id, self.action
            )));
        }

        let updated = job::Entity::find_by_id(self.job_id)
            .one(txn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!("Job {} vanished during update", self.job_id))
            })?;

        Ok((updated, transition))
    }
}

#[async_trait::async_trait]
impl Command for TransitionJobCommand {
    type Result = TransitionOutcome;

    #[instrument(skip(self, db_pool, event_sender), fields(job_id = %self.job_id, action = %self.action, role = %self.actor.role))]
    async fn execute(
        &self,
        db_pool: Arc<DbPool>,
        event_sender: Arc<EventSender>,
    ) -> Result<Self::Result, ServiceError> {
        self.validate()?;
        if !self.action.accepts_details() && !self.details.is_empty() {
            return Err(ServiceError::InvalidOperation(format!(
                "{} does not accept job details",
                self.action
            )));
        }

        let command = self.clone();
        let (job, transition) = with_transaction(db_pool.as_ref(), move |txn| {
            Box::pin(async move { command.apply(txn).await })
        })
        .await
        .map_err(|e| e.aborted_write(&format!("{} on job {}", self.action, self.job_id)))?;

        info!(
            job_id = %job.id,
            from = %transition.from,
            to = %transition.to,
            actor = %self.actor.uid,
            "Job transition applied"
        );

        let request = NotificationRequest::job_transition(&job, &transition, &self.actor);
        let notification_error = match event_sender.send(Event::Notification(request)).await {
            Ok(()) => None,
            Err(e) => {
                warn!(job_id = %job.id, "Transition committed but notification failed: {}", e);
                Some(e)
            }
        };

        Ok(TransitionOutcome {
            job,
            transition,
            notification_error,
        })
    }
}
