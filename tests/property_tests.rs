//! Property-based tests for the due-date calculator and the transition table.
//!
//! These tests use proptest to verify invariants across a wide range of inputs,
//! helping to catch edge cases that unit tests might miss.

use calibration_engine::{
    auth::{Actor, Role},
    due_date::{compute_due_date, compute_due_date_from_str, parse_date, DueDateRequest},
    entities::job::JobStatus,
    lifecycle::{plan_transition, JobAction},
};
use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;
use strum::IntoEnumIterator;

// Strategies for generating test data
fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2100, 1u32..=12, 1u32..=31).prop_filter_map("valid calendar date", |(y, m, d)| {
        NaiveDate::from_ymd_opt(y, m, d)
    })
}

fn status_strategy() -> impl Strategy<Value = JobStatus> {
    proptest::sample::select(JobStatus::iter().collect::<Vec<_>>())
}

fn action_strategy() -> impl Strategy<Value = JobAction> {
    proptest::sample::select(JobAction::iter().collect::<Vec<_>>())
}

fn months_between(from: NaiveDate, to: NaiveDate) -> i32 {
    (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn interval_lands_exactly_that_many_months_later(
        calibrated in date_strategy(),
        months in 0u32..240,
    ) {
        let due = compute_due_date(Some(calibrated), DueDateRequest::Yes, Some(months), None)
            .expect("representable date");
        prop_assert_eq!(months_between(calibrated, due), months as i32);
        // the day only ever moves down, to the last day of a shorter month
        prop_assert!(due.day() <= calibrated.day());
        if due.day() < calibrated.day() {
            prop_assert!(due.succ_opt().map(|next| next.month()) != Some(due.month()));
        }
    }

    #[test]
    fn no_interval_without_entered_date_is_none(
        calibrated in date_strategy(),
        months in proptest::option::of(0u32..240),
    ) {
        prop_assert_eq!(compute_due_date(Some(calibrated), DueDateRequest::No, months, None), None);
    }

    #[test]
    fn text_and_typed_paths_agree(calibrated in date_strategy(), months in 1u32..120) {
        let raw = calibrated.format("%Y-%m-%d").to_string();
        prop_assert_eq!(parse_date(&raw), Some(calibrated));
        prop_assert_eq!(
            compute_due_date_from_str(&raw, DueDateRequest::Yes, Some(months), None),
            compute_due_date(Some(calibrated), DueDateRequest::Yes, Some(months), None)
        );
    }

    #[test]
    fn garbage_dates_never_panic(raw in "\\PC{0,24}") {
        let _ = compute_due_date_from_str(&raw, DueDateRequest::Yes, Some(12), None);
    }

    #[test]
    fn terminal_jobs_reject_everything(
        status in status_strategy(),
        action in action_strategy(),
    ) {
        let admin = Actor::new("admin-1", Role::Admin);
        let planned = plan_transition(status, action, &admin, &[]);
        if status.is_terminal() {
            prop_assert!(planned.is_err());
        }
        if let Ok(transition) = planned {
            prop_assert_eq!(transition.from, status);
            prop_assert_eq!(transition.action, action);
        }
    }

    #[test]
    fn unassigned_workers_can_do_nothing(
        status in status_strategy(),
        action in action_strategy(),
    ) {
        let outsider = Actor::new("tech-9", Role::Worker);
        let workers = vec!["tech-1".to_string()];
        prop_assert!(plan_transition(status, action, &outsider, &workers).is_err());
    }
}
