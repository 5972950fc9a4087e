use sea_orm::error::DbErr;
use serde::Serialize;
use uuid::Uuid;

use crate::entities::job::JobStatus;
use crate::lifecycle::JobAction;
use crate::auth::Role;

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid transition: cannot {action} a job in status {from} as {role}")]
    InvalidTransition {
        from: JobStatus,
        action: JobAction,
        role: Role,
    },

    #[error("Equipment for job {0} has already been returned")]
    AlreadyReturned(Uuid),

    #[error("Transaction aborted, nothing was written: {0}")]
    PartialFailure(String),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Other error: {0}")]
    Other(
        #[from]
        #[serde(skip)]
        anyhow::Error,
    ),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::SerializationError(err.to_string())
    }
}

impl ServiceError {
    pub fn db_error(error: DbErr) -> Self {
        ServiceError::DatabaseError(error)
    }

    /// Store failures inside a rolled-back write surface as `PartialFailure`
    /// naming the operation. Every other error passes through unchanged.
    pub fn aborted_write(self, operation: &str) -> Self {
        match self {
            Self::DatabaseError(e) => Self::PartialFailure(format!("{}: {}", operation, e)),
            other => other,
        }
    }

    /// Stable machine-readable code for callers that map errors to notices.
    pub fn code(&self) -> &'static str {
        match self {
            Self::DatabaseError(_) => "database_error",
            Self::NotFound(_) => "not_found",
            Self::ValidationError(_) => "validation_error",
            Self::InvalidOperation(_) => "invalid_operation",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::AlreadyReturned(_) => "already_returned",
            Self::PartialFailure(_) => "partial_failure",
            Self::EventError(_) => "event_error",
            Self::InternalError(_) | Self::Other(_) => "internal_error",
            Self::SerializationError(_) => "serialization_error",
        }
    }

    /// Whether retrying the same call may succeed. Nothing was persisted
    /// when this returns true.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PartialFailure(_) | Self::DatabaseError(_))
    }

    /// Outcomes that should be shown as an informational notice rather than
    /// a failure.
    pub fn is_notice(&self) -> bool {
        matches!(self, Self::AlreadyReturned(_))
    }

    /// Returns the error message suitable for showing to a user.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::SerializationError(_) | Self::InternalError(_) | Self::Other(_) => {
                "Internal error".to_string()
            }
            _ => self.to_string(),
        }
    }
}
