use crate::{
    auth::Actor,
    commands::{
        jobs::{
            CreateJobCommand, JobDetailsPatch, ReturnEquipmentCommand, ReturnOutcome,
            TransitionJobCommand, TransitionOutcome,
        },
        Command,
    },
    db::DbPool,
    entities::job::{self, JobStatus},
    errors::ServiceError,
    events::EventSender,
    lifecycle::{self, JobAction},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use std::sync::Arc;
use tracing::{error, instrument};
use uuid::Uuid;

/// Service for calibration jobs: creation, lifecycle transitions and the
/// equipment return ledger.
#[derive(Clone)]
pub struct JobService {
    db_pool: Arc<DbPool>,
    event_sender: Arc<EventSender>,
}

impl JobService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a job in status `created`
    #[instrument(skip(self))]
    pub async fn create_job(&self, command: CreateJobCommand) -> Result<job::Model, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Gets a job by ID
    #[instrument(skip(self))]
    pub async fn get_job(&self, job_id: Uuid) -> Result<Option<job::Model>, ServiceError> {
        job::Entity::find_by_id(job_id)
            .one(&*self.db_pool)
            .await
            .map_err(|e| {
                error!(job_id = %job_id, error = %e, "Database error when fetching job");
                ServiceError::db_error(e)
            })
    }

    /// Jobs currently in `status`, soonest start first
    #[instrument(skip(self))]
    pub async fn list_jobs_by_status(
        &self,
        status: JobStatus,
    ) -> Result<Vec<job::Model>, ServiceError> {
        job::Entity::find()
            .filter(job::Column::Status.eq(status))
            .order_by_asc(job::Column::StartDate)
            .order_by_asc(job::Column::CreatedAt)
            .all(&*self.db_pool)
            .await
            .map_err(ServiceError::db_error)
    }

    /// Applies a lifecycle action. See [`TransitionJobCommand`].
    #[instrument(skip(self))]
    pub async fn transition(
        &self,
        command: TransitionJobCommand,
    ) -> Result<TransitionOutcome, ServiceError> {
        command
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    async fn apply(
        &self,
        job_id: Uuid,
        action: JobAction,
        actor: &Actor,
    ) -> Result<TransitionOutcome, ServiceError> {
        self.transition(TransitionJobCommand::new(job_id, action, actor.clone()))
            .await
    }

    pub async fn approve(&self, job_id: Uuid, actor: &Actor) -> Result<TransitionOutcome, ServiceError> {
        self.apply(job_id, JobAction::Approve, actor).await
    }

    pub async fn start(&self, job_id: Uuid, actor: &Actor) -> Result<TransitionOutcome, ServiceError> {
        self.apply(job_id, JobAction::Start, actor).await
    }

    pub async fn finish(&self, job_id: Uuid, actor: &Actor) -> Result<TransitionOutcome, ServiceError> {
        self.apply(job_id, JobAction::Finish, actor).await
    }

    pub async fn complete(&self, job_id: Uuid, actor: &Actor) -> Result<TransitionOutcome, ServiceError> {
        self.apply(job_id, JobAction::Complete, actor).await
    }

    pub async fn cancel(&self, job_id: Uuid, actor: &Actor) -> Result<TransitionOutcome, ServiceError> {
        self.apply(job_id, JobAction::Cancel, actor).await
    }

    pub async fn mark_incomplete(
        &self,
        job_id: Uuid,
        actor: &Actor,
    ) -> Result<TransitionOutcome, ServiceError> {
        self.apply(job_id, JobAction::MarkIncomplete, actor).await
    }

    pub async fn reschedule(
        &self,
        job_id: Uuid,
        actor: &Actor,
        details: JobDetailsPatch,
    ) -> Result<TransitionOutcome, ServiceError> {
        self.transition(
            TransitionJobCommand::new(job_id, JobAction::Reschedule, actor.clone())
                .with_details(details),
        )
        .await
    }

    pub async fn edit_details(
        &self,
        job_id: Uuid,
        actor: &Actor,
        details: JobDetailsPatch,
    ) -> Result<TransitionOutcome, ServiceError> {
        self.transition(
            TransitionJobCommand::new(job_id, JobAction::EditDetail, actor.clone())
                .with_details(details),
        )
        .await
    }

    /// Actions `actor` may trigger on the job as it is stored now.
    #[instrument(skip(self))]
    pub async fn available_actions(
        &self,
        job_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<JobAction>, ServiceError> {
        let job = self.require_job(job_id).await?;
        let workers = job.worker_uids()?;
        Ok(lifecycle::available_actions(job.status, actor, &workers))
    }

    /// Returns an explicit list of equipment for the job.
    #[instrument(skip(self))]
    pub async fn return_equipment(
        &self,
        job_id: Uuid,
        equipment_ids: Vec<Uuid>,
    ) -> Result<ReturnOutcome, ServiceError> {
        ReturnEquipmentCommand::new(job_id, equipment_ids)
            .execute(self.db_pool.clone(), self.event_sender.clone())
            .await
    }

    /// Returns everything loaned out on the job record.
    #[instrument(skip(self, actor), fields(actor_uid = %actor.uid))]
    pub async fn return_job_equipment(
        &self,
        job_id: Uuid,
        actor: &Actor,
    ) -> Result<ReturnOutcome, ServiceError> {
        let job = self
            .require_job(job_id)
            .await
            .map_err(|e| e.aborted_write(&format!("equipment return for job {}", job_id)))?;
        if job.is_returned_equipment {
            return Err(ServiceError::AlreadyReturned(job_id));
        }
        self.return_equipment(job_id, job.equipment_ids()?).await
    }

    async fn require_job(&self, job_id: Uuid) -> Result<job::Model, ServiceError> {
        self.get_job(job_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Job {} not found", job_id)))
    }
}
