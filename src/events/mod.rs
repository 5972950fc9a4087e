use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::notifications::{NotificationRequest, NotificationStore};

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously. Fails once the processing loop is gone.
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    JobCreated(Uuid),
    EquipmentRegistered(Uuid),
    CalibrationRecorded {
        calibration_id: Uuid,
        job_id: Uuid,
        due_date: Option<NaiveDate>,
    },
    EquipmentReturned {
        job_id: Uuid,
        units: usize,
    },
    /// User-facing notification; persisted by the processing loop.
    Notification(NotificationRequest),
}

/// Drains the event channel until every sender is dropped.
///
/// Notifications are written through `store` when one is configured and
/// only logged otherwise.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, store: Option<NotificationStore>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::Notification(request) => {
                info!(
                    module = %request.module,
                    title = %request.title,
                    targets = ?request.target,
                    "Delivering notification"
                );
                let Some(store) = store.as_ref() else {
                    continue;
                };
                if let Err(e) = store.persist(&request).await {
                    error!(
                        "Failed to persist notification: title={}, error={}",
                        request.title, e
                    );
                }
            }
            Event::CalibrationRecorded {
                calibration_id,
                job_id,
                due_date,
            } => {
                info!(
                    %calibration_id,
                    %job_id,
                    due_date = %crate::due_date::format_due_date(due_date),
                    "Calibration recorded"
                );
            }
            other => info!("Received event: {:?}", other),
        }
    }

    warn!("Event channel closed; event processing loop stopped");
}
