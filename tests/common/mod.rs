#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use calibration_engine::{
    auth::{Actor, Role},
    commands::{equipment::RegisterEquipmentCommand, jobs::CreateJobCommand},
    config::AppConfig,
    entities::{
        equipment,
        job::{self, JobScope, JobStatus},
        notification,
    },
    events::EventSender,
    services::JobService,
    CalibrationEngine,
};
use chrono::NaiveDate;
use sea_orm::{ColumnTrait, ConnectionTrait, DbBackend, EntityTrait, QueryFilter, Set, Statement};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Engine backed by a private in-memory SQLite database.
pub struct TestApp {
    pub engine: CalibrationEngine,
}

pub fn admin() -> Actor {
    Actor::new("admin-1", Role::Admin)
}

pub fn supervisor() -> Actor {
    Actor::new("supervisor-1", Role::Supervisor)
}

pub fn worker(uid: &str) -> Actor {
    Actor::new(uid, Role::Worker)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

impl TestApp {
    pub async fn new() -> Self {
        let engine = CalibrationEngine::bootstrap(&AppConfig::in_memory())
            .await
            .expect("engine bootstrap");
        Self { engine }
    }

    pub fn jobs(&self) -> &JobService {
        &self.engine.jobs
    }

    /// Same store, but the event processor is gone: every notification
    /// send fails.
    pub fn jobs_without_event_consumer(&self) -> JobService {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        JobService::new(self.engine.db.clone(), Arc::new(EventSender::new(tx)))
    }

    pub async fn seed_equipment(&self, name: &str, qty: i32) -> equipment::Model {
        self.engine
            .equipment
            .register(RegisterEquipmentCommand::new(name, qty))
            .await
            .expect("register equipment")
    }

    pub async fn seed_job(&self, workers: &[&str], equipments: Vec<Uuid>) -> job::Model {
        let command = CreateJobCommand::new(
            "customer-1",
            JobScope::Onsite,
            date(2024, 3, 4),
            date(2024, 3, 6),
        )
        .with_workers(workers.iter().copied())
        .with_equipments(equipments)
        .requested_by("requester-1");

        self.jobs().create_job(command).await.expect("create job")
    }

    /// Puts a job straight into `status`, bypassing the lifecycle.
    pub async fn force_status(&self, job_id: Uuid, status: JobStatus) {
        job::Entity::update_many()
            .set(job::ActiveModel {
                status: Set(status),
                ..Default::default()
            })
            .filter(job::Column::Id.eq(job_id))
            .exec(self.engine.db.as_ref())
            .await
            .expect("force status");
    }

    /// Moves the jobs table out of reach so every job read or write fails
    /// at the store.
    pub async fn break_jobs_table(&self) {
        self.engine
            .db
            .execute(Statement::from_string(
                DbBackend::Sqlite,
                "ALTER TABLE jobs RENAME TO jobs_unreachable".to_string(),
            ))
            .await
            .expect("rename jobs table");
    }

    /// Puts the jobs table back after [`TestApp::break_jobs_table`].
    pub async fn restore_jobs_table(&self) {
        self.engine
            .db
            .execute(Statement::from_string(
                DbBackend::Sqlite,
                "ALTER TABLE jobs_unreachable RENAME TO jobs".to_string(),
            ))
            .await
            .expect("restore jobs table");
    }

    pub async fn job(&self, job_id: Uuid) -> job::Model {
        self.jobs()
            .get_job(job_id)
            .await
            .expect("load job")
            .expect("job exists")
    }

    pub async fn qty(&self, equipment_id: Uuid) -> i32 {
        self.engine
            .equipment
            .get_equipment(equipment_id)
            .await
            .expect("load equipment")
            .expect("equipment exists")
            .qty
    }

    /// Waits for the event processor to persist at least `count`
    /// notifications addressed to `target`.
    pub async fn wait_for_notifications(
        &self,
        target: &str,
        count: usize,
    ) -> Vec<notification::Model> {
        for _ in 0..100 {
            let found = self
                .engine
                .notifications
                .list_for_target(target)
                .await
                .expect("list notifications");
            if found.len() >= count {
                return found;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {count} notification(s) for {target}");
    }
}
