//! Certificate due-date computation.
//!
//! Everything here is pure: no store access, no clock. Malformed or
//! unrepresentable inputs produce `None`, which callers render as "N/A".

use chrono::{DateTime, Months, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

pub use crate::entities::calibration::DueDateRequest;

/// Placeholder shown wherever a calibration carries no due date.
pub const NOT_APPLICABLE: &str = "N/A";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Derives the next due date of a certificate.
///
/// With [`DueDateRequest::Yes`] the result is `date_calibrated` plus
/// `duration_months` calendar months. Days past the end of the target month
/// are clamped to its last day, so Jan 31 + 1 month is Feb 28 (or 29).
/// With [`DueDateRequest::No`] the manually entered `explicit_due_date` is
/// returned as-is.
///
/// A missing calibration date always yields `None`.
pub fn compute_due_date(
    date_calibrated: Option<NaiveDate>,
    requested: DueDateRequest,
    duration_months: Option<u32>,
    explicit_due_date: Option<NaiveDate>,
) -> Option<NaiveDate> {
    let calibrated = date_calibrated?;
    match requested {
        DueDateRequest::No => explicit_due_date,
        DueDateRequest::Yes => calibrated.checked_add_months(Months::new(duration_months?)),
    }
}

/// Same as [`compute_due_date`] but takes the calibration date as entered.
/// Unparseable input is treated as a missing date.
pub fn compute_due_date_from_str(
    date_calibrated: &str,
    requested: DueDateRequest,
    duration_months: Option<u32>,
    explicit_due_date: Option<NaiveDate>,
) -> Option<NaiveDate> {
    compute_due_date(
        parse_date(date_calibrated),
        requested,
        duration_months,
        explicit_due_date,
    )
}

/// Accepts `YYYY-MM-DD`, RFC 3339 timestamps and naive ISO timestamps.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|ts| ts.date())
}

pub fn format_due_date(due: Option<NaiveDate>) -> String {
    due.map(|d| d.format(DATE_FORMAT).to_string())
        .unwrap_or_else(|| NOT_APPLICABLE.to_string())
}

/// Recall classification of a due date relative to `today`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DueState {
    NoDueDate,
    Current,
    DueSoon,
    Overdue,
}

/// An instrument is overdue from the day after its due date. It is due soon
/// when the due date falls within `due_soon_window_days` of `today`.
pub fn due_state(due: Option<NaiveDate>, today: NaiveDate, due_soon_window_days: u32) -> DueState {
    let Some(due) = due else {
        return DueState::NoDueDate;
    };
    let days_left = (due - today).num_days();
    if days_left < 0 {
        DueState::Overdue
    } else if days_left <= i64::from(due_soon_window_days) {
        DueState::DueSoon
    } else {
        DueState::Current
    }
}
