//! Job lifecycle state machine.
//!
//! The transition table is the single source of truth for which action is
//! accepted from which status and by whom. Planning a transition is pure;
//! persisting it is the job of `TransitionJobCommand`.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::auth::Actor;
use crate::entities::job::JobStatus;
use crate::errors::ServiceError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize, Deserialize,
)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum JobAction {
    Approve,
    Start,
    Finish,
    Complete,
    Cancel,
    MarkIncomplete,
    Reschedule,
    EditDetail,
}

impl JobAction {
    /// Actions that may carry schedule/assignment changes.
    pub fn accepts_details(&self) -> bool {
        matches!(self, JobAction::Reschedule | JobAction::EditDetail)
    }
}

/// Who may trigger a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permitted {
    Staff,
    StaffOrAssignedWorker,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    To(JobStatus),
    Unchanged,
}

#[derive(Debug, Clone)]
struct TransitionRule {
    from: &'static [JobStatus],
    permitted: Permitted,
    target: Target,
}

const NON_TERMINAL: &[JobStatus] = &[
    JobStatus::Created,
    JobStatus::Confirmed,
    JobStatus::Rescheduled,
    JobStatus::InProgress,
    JobStatus::Validation,
];

lazy_static! {
    static ref RULES: HashMap<JobAction, TransitionRule> = {
        let mut rules = HashMap::new();

        rules.insert(
            JobAction::Approve,
            TransitionRule {
                from: &[JobStatus::Created],
                permitted: Permitted::Staff,
                target: Target::To(JobStatus::Confirmed),
            },
        );
        rules.insert(
            JobAction::Start,
            TransitionRule {
                from: &[JobStatus::Confirmed, JobStatus::Rescheduled],
                permitted: Permitted::StaffOrAssignedWorker,
                target: Target::To(JobStatus::InProgress),
            },
        );
        rules.insert(
            JobAction::Finish,
            TransitionRule {
                from: &[JobStatus::InProgress],
                permitted: Permitted::StaffOrAssignedWorker,
                target: Target::To(JobStatus::Validation),
            },
        );
        rules.insert(
            JobAction::Complete,
            TransitionRule {
                from: &[JobStatus::Validation],
                permitted: Permitted::Staff,
                target: Target::To(JobStatus::Complete),
            },
        );
        rules.insert(
            JobAction::Cancel,
            TransitionRule {
                from: NON_TERMINAL,
                permitted: Permitted::Staff,
                target: Target::To(JobStatus::Cancelled),
            },
        );
        rules.insert(
            JobAction::MarkIncomplete,
            TransitionRule {
                from: &[JobStatus::Created],
                permitted: Permitted::Staff,
                target: Target::To(JobStatus::Incomplete),
            },
        );
        rules.insert(
            JobAction::Reschedule,
            TransitionRule {
                from: NON_TERMINAL,
                permitted: Permitted::Staff,
                target: Target::To(JobStatus::Rescheduled),
            },
        );
        rules.insert(
            JobAction::EditDetail,
            TransitionRule {
                from: NON_TERMINAL,
                permitted: Permitted::Staff,
                target: Target::Unchanged,
            },
        );

        rules
    };
}

/// An accepted lifecycle step. `from == to` for detail edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: JobStatus,
    pub action: JobAction,
    pub to: JobStatus,
}

impl Transition {
    pub fn changes_status(&self) -> bool {
        self.from != self.to
    }
}

/// Checks `action` against the transition table.
///
/// `workers` is the job's assigned worker list; it only matters for actions
/// open to assigned workers.
pub fn plan_transition(
    from: JobStatus,
    action: JobAction,
    actor: &Actor,
    workers: &[String],
) -> Result<Transition, ServiceError> {
    let rejected = || ServiceError::InvalidTransition {
        from,
        action,
        role: actor.role,
    };

    let rule = RULES.get(&action).ok_or_else(rejected)?;
    if !rule.from.contains(&from) {
        return Err(rejected());
    }

    let allowed = match rule.permitted {
        Permitted::Staff => actor.role.is_staff(),
        Permitted::StaffOrAssignedWorker => {
            actor.role.is_staff() || actor.is_assigned_worker(workers)
        }
    };
    if !allowed {
        return Err(rejected());
    }

    let to = match rule.target {
        Target::To(status) => status,
        Target::Unchanged => from,
    };
    Ok(Transition { from, action, to })
}

/// Actions the actor could trigger right now, for enabling controls.
pub fn available_actions(from: JobStatus, actor: &Actor, workers: &[String]) -> Vec<JobAction> {
    JobAction::iter()
        .filter(|action| plan_transition(from, *action, actor, workers).is_ok())
        .collect()
}
