//! Notification records addressed to roles and individual users.
//!
//! Emission is fire-and-forget from the point of view of lifecycle
//! operations: requests travel over the event channel and are persisted by
//! the processing loop.

use chrono::Utc;
use sea_orm::{
    sea_query::{Alias, Expr, LikeExpr},
    ActiveModelTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::{Actor, NOTIFIED_ROLES};
use crate::db::DbPool;
use crate::entities::{job, notification};
use crate::errors::ServiceError;
use crate::lifecycle::{JobAction, Transition};

pub const JOB_MODULE: &str = "job";
pub const EQUIPMENT_MODULE: &str = "equipment";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub module: String,
    pub target: Vec<String>,
    pub title: String,
    pub message: String,
    pub data: NotificationData,
}

/// Admins, supervisors and, when known, the person who requested the job.
pub fn job_recipients(requested_by: Option<&str>) -> Vec<String> {
    let mut target: Vec<String> = NOTIFIED_ROLES.iter().map(|r| r.to_string()).collect();
    if let Some(uid) = requested_by.filter(|uid| !uid.is_empty()) {
        if !target.iter().any(|t| t == uid) {
            target.push(uid.to_string());
        }
    }
    target
}

fn job_url(job_id: Uuid) -> String {
    format!("/jobs/{}", job_id)
}

fn action_verb(action: JobAction) -> &'static str {
    match action {
        JobAction::Approve => "approved",
        JobAction::Start => "started",
        JobAction::Finish => "finished",
        JobAction::Complete => "completed",
        JobAction::Cancel => "cancelled",
        JobAction::MarkIncomplete => "marked incomplete",
        JobAction::Reschedule => "rescheduled",
        JobAction::EditDetail => "updated",
    }
}

impl NotificationRequest {
    pub fn job_transition(job: &job::Model, transition: &Transition, actor: &Actor) -> Self {
        let verb = action_verb(transition.action);
        Self {
            module: JOB_MODULE.to_string(),
            target: job_recipients(job.requested_by.as_deref()),
            title: format!("Job {}", verb),
            message: format!(
                "Job {} was {} by {} ({}); status is now {}",
                job.id, verb, actor.uid, actor.role, transition.to
            ),
            data: NotificationData {
                redirect_url: job_url(job.id),
            },
        }
    }

    pub fn equipment_returned(job: &job::Model, returned_units: usize) -> Self {
        Self {
            module: EQUIPMENT_MODULE.to_string(),
            target: job_recipients(job.requested_by.as_deref()),
            title: "Equipment returned".to_string(),
            message: format!(
                "{} equipment unit(s) loaned for job {} are back in stock",
                returned_units, job.id
            ),
            data: NotificationData {
                redirect_url: job_url(job.id),
            },
        }
    }
}

/// Persistence for delivered notifications.
#[derive(Debug, Clone)]
pub struct NotificationStore {
    db_pool: Arc<DbPool>,
}

impl NotificationStore {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn persist(
        &self,
        request: &NotificationRequest,
    ) -> Result<notification::Model, ServiceError> {
        let record = notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            module: Set(request.module.clone()),
            target: Set(serde_json::to_value(&request.target)?),
            title: Set(request.title.clone()),
            message: Set(request.message.clone()),
            data: Set(serde_json::to_value(&request.data)?),
            created_at: Set(Utc::now()),
        };
        Ok(record.insert(self.db_pool.as_ref()).await?)
    }

    /// Notifications addressed to a role name or uid, newest first.
    #[instrument(skip(self))]
    pub async fn list_for_target(
        &self,
        target: &str,
    ) -> Result<Vec<notification::Model>, ServiceError> {
        // The JSON array text contains the quoted target; the store narrows
        // on that and exact membership is checked on the decoded list.
        let candidates = notification::Entity::find()
            .filter(
                Expr::expr(Expr::col(notification::Column::Target).cast_as(Alias::new("text")))
                    .like(target_pattern(target)?),
            )
            .order_by_desc(notification::Column::CreatedAt)
            .all(self.db_pool.as_ref())
            .await?;

        let mut addressed = Vec::new();
        for record in candidates {
            let targets: Vec<String> = serde_json::from_value(record.target.clone())?;
            if targets.iter().any(|t| t == target) {
                addressed.push(record);
            }
        }
        Ok(addressed)
    }
}

fn target_pattern(target: &str) -> Result<LikeExpr, ServiceError> {
    let quoted = serde_json::to_string(target)?;
    let mut pattern = String::with_capacity(quoted.len() + 2);
    pattern.push('%');
    for c in quoted.chars() {
        if matches!(c, '%' | '_' | '!') {
            pattern.push('!');
        }
        pattern.push(c);
    }
    pattern.push('%');
    Ok(LikeExpr::new(pattern).escape('!'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::entities::job::{JobPriority, JobScope, JobStatus};
    use chrono::NaiveDate;

    fn sample_job(requested_by: Option<&str>) -> job::Model {
        let now = Utc::now();
        let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        job::Model {
            id: Uuid::new_v4(),
            status: JobStatus::InProgress,
            scope: JobScope::Onsite,
            priority: JobPriority::Normal,
            start_date: day,
            end_date: day,
            start_time: None,
            end_time: None,
            workers: serde_json::json!(["tech-1"]),
            customer_id: "cust-1".into(),
            location_id: None,
            equipments: serde_json::json!([]),
            is_returned_equipment: false,
            requested_by: requested_by.map(str::to_string),
            remarks: None,
            start_by: None,
            start_by_at: None,
            end_by: None,
            end_by_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn recipients_are_staff_roles_plus_requester() {
        assert_eq!(job_recipients(None), vec!["admin", "supervisor"]);
        assert_eq!(
            job_recipients(Some("cust-contact")),
            vec!["admin", "supervisor", "cust-contact"]
        );
        assert_eq!(job_recipients(Some("")), vec!["admin", "supervisor"]);
    }

    #[test]
    fn transition_notification_points_at_the_job() {
        let job = sample_job(Some("requester-1"));
        let transition = Transition {
            from: JobStatus::Confirmed,
            action: JobAction::Start,
            to: JobStatus::InProgress,
        };
        let actor = Actor::new("tech-1", Role::Worker);
        let request = NotificationRequest::job_transition(&job, &transition, &actor);

        assert_eq!(request.module, JOB_MODULE);
        assert_eq!(request.title, "Job started");
        assert!(request.message.contains("in-progress"));
        assert!(request.target.contains(&"requester-1".to_string()));
        assert_eq!(request.data.redirect_url, format!("/jobs/{}", job.id));
    }

    async fn store() -> NotificationStore {
        let pool = crate::db::establish_connection_from_app_config(&crate::config::AppConfig::in_memory())
            .await
            .expect("connect");
        crate::db::run_migrations(&pool).await.expect("migrate");
        NotificationStore::new(Arc::new(pool))
    }

    fn addressed_to(targets: &[&str], title: &str) -> NotificationRequest {
        NotificationRequest {
            module: JOB_MODULE.to_string(),
            target: targets.iter().map(|t| t.to_string()).collect(),
            title: title.to_string(),
            message: String::new(),
            data: NotificationData {
                redirect_url: "/jobs".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn listing_matches_whole_targets_only() {
        let store = store().await;
        store.persist(&addressed_to(&["admin-1"], "for a user")).await.unwrap();
        store.persist(&addressed_to(&["tech_1"], "underscore uid")).await.unwrap();
        store.persist(&addressed_to(&["tech11"], "digit uid")).await.unwrap();
        store.persist(&addressed_to(&["admin", "supervisor"], "older")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.persist(&addressed_to(&["supervisor", "admin"], "newer")).await.unwrap();

        let for_admin: Vec<String> = store
            .list_for_target("admin")
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(for_admin, vec!["newer", "older"]);

        // `_` must not act as a wildcard
        let underscored = store.list_for_target("tech_1").await.unwrap();
        assert_eq!(underscored.len(), 1);
        assert_eq!(underscored[0].title, "underscore uid");
        assert!(store.list_for_target("nobody").await.unwrap().is_empty());
    }
}
