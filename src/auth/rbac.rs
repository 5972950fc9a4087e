/*!
 * # Role-Based Access Control (RBAC) Module
 *
 * Roles of the calibration laboratory staff and the actor making a request.
 * Which role may trigger which job transition lives in the lifecycle table;
 * this module only knows who somebody is.
 */

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Staff role of an actor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Supervisor,
    Worker,
}

impl Role {
    /// Admins and supervisors manage jobs regardless of assignment.
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Supervisor)
    }
}

/// Roles that receive every job lifecycle notification.
pub const NOTIFIED_ROLES: [Role; 2] = [Role::Admin, Role::Supervisor];

/// The user performing an operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub uid: String,
    pub role: Role,
}

impl Actor {
    pub fn new(uid: impl Into<String>, role: Role) -> Self {
        Self {
            uid: uid.into(),
            role,
        }
    }

    /// True when the actor is a worker listed on the job.
    pub fn is_assigned_worker(&self, workers: &[String]) -> bool {
        self.role == Role::Worker && workers.iter().any(|w| w == &self.uid)
    }
}
