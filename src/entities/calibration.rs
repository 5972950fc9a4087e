use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::due_date;

/// Whether a recalibration interval was requested on the certificate.
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
pub enum DueDateRequest {
    #[sea_orm(string_value = "no")]
    No,
    #[sea_orm(string_value = "yes")]
    Yes,
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
pub enum CalibrationStatus {
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "approval")]
    Approval,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "calibrations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub job_id: Uuid,
    pub equipment_description: String,
    pub certificate_no: Option<String>,
    pub date_calibrated: NaiveDate,
    pub due_date_requested: DueDateRequest,
    /// Interval in months, only meaningful when `due_date_requested` is `yes`.
    pub due_date_duration: Option<i32>,
    /// Manually entered due date, only meaningful when `due_date_requested` is `no`.
    pub due_date: Option<NaiveDate>,
    pub status: CalibrationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::job::Entity",
        from = "Column::JobId",
        to = "super::job::Column::Id"
    )]
    Job,
}

impl Related<super::job::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Job.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// The due date printed on the certificate, if any.
    pub fn effective_due_date(&self) -> Option<NaiveDate> {
        due_date::compute_due_date(
            Some(self.date_calibrated),
            self.due_date_requested,
            self.due_date_duration
                .and_then(|months| u32::try_from(months).ok()),
            self.due_date,
        )
    }
}
