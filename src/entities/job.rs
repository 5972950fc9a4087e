use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle status of a calibration job.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    #[sea_orm(string_value = "created")]
    Created,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "in-progress")]
    InProgress,
    #[sea_orm(string_value = "validation")]
    Validation,
    #[sea_orm(string_value = "complete")]
    Complete,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    #[sea_orm(string_value = "rescheduled")]
    Rescheduled,
    #[sea_orm(string_value = "incomplete")]
    Incomplete,
}

impl JobStatus {
    /// No lifecycle action, including detail edits, applies to a terminal job.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobStatus::Complete | JobStatus::Cancelled | JobStatus::Incomplete
        )
    }

    /// Loaned equipment may only be booked back once field work is over.
    pub fn allows_equipment_return(&self) -> bool {
        matches!(
            self,
            JobStatus::Validation
                | JobStatus::Complete
                | JobStatus::Cancelled
                | JobStatus::Incomplete
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobScope {
    #[sea_orm(string_value = "lab")]
    Lab,
    #[sea_orm(string_value = "onsite")]
    Onsite,
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum JobPriority {
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "jobs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub status: JobStatus,
    pub scope: JobScope,
    pub priority: JobPriority,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    /// Ordered list of worker uids.
    #[sea_orm(column_type = "Json")]
    pub workers: Json,
    pub customer_id: String,
    pub location_id: Option<String>,
    /// Equipment ids loaned out for this job.
    #[sea_orm(column_type = "Json")]
    pub equipments: Json,
    pub is_returned_equipment: bool,
    pub requested_by: Option<String>,
    pub remarks: Option<String>,
    pub start_by: Option<String>,
    pub start_by_at: Option<DateTime<Utc>>,
    pub end_by: Option<String>,
    pub end_by_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::calibration::Entity")]
    Calibrations,
}

impl Related<super::calibration::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Calibrations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn worker_uids(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_value(self.workers.clone())
    }

    pub fn equipment_ids(&self) -> Result<Vec<Uuid>, serde_json::Error> {
        serde_json::from_value(self.equipments.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_names_match_stored_values() {
        assert_eq!(JobStatus::InProgress.to_string(), "in-progress");
        assert_eq!(JobStatus::from_str("rescheduled").unwrap(), JobStatus::Rescheduled);
        assert!(JobStatus::from_str("in_progress").is_err());
        assert_eq!(
            serde_json::to_value(JobStatus::InProgress).unwrap(),
            serde_json::json!("in-progress")
        );
    }

    #[test]
    fn terminal_and_return_eligible_states() {
        assert!(JobStatus::Complete.is_terminal());
        assert!(JobStatus::Incomplete.is_terminal());
        assert!(!JobStatus::Validation.is_terminal());
        assert!(JobStatus::Validation.allows_equipment_return());
        assert!(!JobStatus::InProgress.allows_equipment_return());
        assert!(!JobStatus::Created.allows_equipment_return());
    }
}
