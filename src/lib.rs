//! Calibration Engine Library
//!
//! Core rules of a calibration laboratory: certificate due dates, the job
//! lifecycle state machine and the equipment return ledger.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod due_date;
pub mod entities;
pub mod errors;
pub mod events;
pub mod lifecycle;
pub mod migrator;
pub mod notifications;
pub mod services;

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use validator::Validate;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::events::{process_events, EventSender};
use crate::notifications::NotificationStore;
use crate::services::{CalibrationService, EquipmentService, JobService};

/// A connected engine: store, event processor and the services on top.
pub struct CalibrationEngine {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub event_sender: Arc<EventSender>,
    pub jobs: JobService,
    pub calibrations: CalibrationService,
    pub equipment: EquipmentService,
    pub notifications: NotificationStore,
    event_processor: JoinHandle<()>,
}

impl CalibrationEngine {
    /// Connects to the configured database, migrates it when
    /// `auto_migrate` is set and starts the event processor.
    pub async fn bootstrap(config: &AppConfig) -> Result<Self, ServiceError> {
        config.validate()?;
        let db = Arc::new(db::establish_connection_from_app_config(config).await?);
        if config.auto_migrate {
            db::run_migrations(&db).await?;
        }

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);
        let event_sender = Arc::new(EventSender::new(tx));
        let notifications = NotificationStore::new(db.clone());
        let event_processor = tokio::spawn(process_events(rx, Some(notifications.clone())));

        info!(environment = %config.environment, "Calibration engine ready");

        Ok(Self {
            jobs: JobService::new(db.clone(), event_sender.clone()),
            calibrations: CalibrationService::new(
                db.clone(),
                event_sender.clone(),
                config.due_soon_window_days,
            ),
            equipment: EquipmentService::new(db.clone(), event_sender.clone()),
            notifications,
            db,
            config: config.clone(),
            event_sender,
            event_processor,
        })
    }

    /// Stops accepting events and waits until every queued notification
    /// has been handled. Clones of the services must be dropped first.
    pub async fn shutdown(self) -> Result<(), ServiceError> {
        let Self {
            event_sender,
            jobs,
            calibrations,
            equipment,
            event_processor,
            ..
        } = self;
        drop((event_sender, jobs, calibrations, equipment));

        event_processor
            .await
            .map_err(|e| ServiceError::InternalError(format!("event processor failed: {}", e)))
    }
}
