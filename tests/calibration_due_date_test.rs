//! Integration tests for calibration records and due dates.

mod common;

use assert_matches::assert_matches;
use calibration_engine::{
    commands::calibrations::RecordCalibrationCommand,
    due_date::{format_due_date, DueState},
    entities::calibration::DueDateRequest,
    errors::ServiceError,
};
use common::{date, TestApp};
use uuid::Uuid;

#[tokio::test]
async fn twelve_month_interval_from_mid_january() {
    let app = TestApp::new().await;
    let job = app.seed_job(&[], vec![]).await;

    let record = app
        .engine
        .calibrations
        .record(RecordCalibrationCommand::with_interval(
            job.id,
            "Digital thermometer",
            date(2024, 1, 15),
            12,
        ))
        .await
        .unwrap();

    assert_eq!(record.due_date_requested, DueDateRequest::Yes);
    assert_eq!(record.due_date, None);
    assert_eq!(
        app.engine.calibrations.due_date_for(record.id).await.unwrap(),
        Some(date(2025, 1, 15))
    );
}

#[tokio::test]
async fn month_end_interval_is_clamped() {
    let app = TestApp::new().await;
    let job = app.seed_job(&[], vec![]).await;

    let record = app
        .engine
        .calibrations
        .record(RecordCalibrationCommand::with_interval(
            job.id,
            "Torque wrench",
            date(2024, 1, 31),
            1,
        ))
        .await
        .unwrap();

    assert_eq!(record.effective_due_date(), Some(date(2024, 2, 29)));
}

#[tokio::test]
async fn without_interval_the_entered_date_is_used() {
    let app = TestApp::new().await;
    let job = app.seed_job(&[], vec![]).await;
    let calibrations = &app.engine.calibrations;

    let mut command = RecordCalibrationCommand::without_interval(
        job.id,
        "Pressure gauge",
        date(2024, 1, 15),
        Some(date(2024, 9, 1)),
    );
    command.due_date_duration = Some(6);
    let explicit = calibrations.record(command).await.unwrap();
    assert_eq!(explicit.due_date_duration, None);
    assert_eq!(explicit.effective_due_date(), Some(date(2024, 9, 1)));

    let none = calibrations
        .record(RecordCalibrationCommand::without_interval(
            job.id,
            "Pressure gauge",
            date(2024, 1, 15),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(calibrations.due_date_for(none.id).await.unwrap(), None);
    assert_eq!(format_due_date(none.effective_due_date()), "N/A");
}

#[tokio::test]
async fn interval_without_duration_is_rejected() {
    let app = TestApp::new().await;
    let job = app.seed_job(&[], vec![]).await;

    let mut command =
        RecordCalibrationCommand::with_interval(job.id, "Scale", date(2024, 1, 15), 12);
    command.due_date_duration = None;

    assert_matches!(
        app.engine.calibrations.record(command).await,
        Err(ServiceError::ValidationError(_))
    );
    assert!(app.engine.calibrations.list_for_job(job.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn calibration_for_unknown_job_is_not_found() {
    let app = TestApp::new().await;
    assert_matches!(
        app.engine
            .calibrations
            .record(RecordCalibrationCommand::with_interval(
                Uuid::new_v4(),
                "Scale",
                date(2024, 1, 15),
                12,
            ))
            .await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn recall_list_covers_derived_and_entered_dates() {
    let app = TestApp::new().await;
    let job = app.seed_job(&[], vec![]).await;
    let calibrations = &app.engine.calibrations;

    // due 2024-07-15
    let derived = calibrations
        .record(RecordCalibrationCommand::with_interval(
            job.id,
            "Caliper",
            date(2024, 1, 15),
            6,
        ))
        .await
        .unwrap();
    // due 2024-06-30
    let entered = calibrations
        .record(RecordCalibrationCommand::without_interval(
            job.id,
            "Hygrometer",
            date(2024, 1, 10),
            Some(date(2024, 6, 30)),
        ))
        .await
        .unwrap();
    // due 2025-01-15, outside the window
    calibrations
        .record(RecordCalibrationCommand::with_interval(
            job.id,
            "Oscilloscope",
            date(2024, 1, 15),
            12,
        ))
        .await
        .unwrap();
    // no due date at all
    calibrations
        .record(RecordCalibrationCommand::without_interval(
            job.id,
            "Ruler",
            date(2024, 1, 15),
            None,
        ))
        .await
        .unwrap();

    let due = calibrations
        .list_due_between(date(2024, 6, 1), date(2024, 7, 15))
        .await
        .unwrap();

    let ids: Vec<Uuid> = due.iter().map(|d| d.calibration.id).collect();
    assert_eq!(ids, vec![entered.id, derived.id]);
    assert_eq!(due[1].due_date, date(2024, 7, 15));

    assert_eq!(calibrations.list_for_job(job.id).await.unwrap().len(), 4);
    assert_matches!(
        calibrations
            .list_due_between(date(2024, 7, 1), date(2024, 6, 1))
            .await,
        Err(ServiceError::ValidationError(_))
    );
}

#[tokio::test]
async fn recall_list_keeps_entered_dates_earlier_than_the_calibration() {
    let app = TestApp::new().await;
    let job = app.seed_job(&[], vec![]).await;
    let calibrations = &app.engine.calibrations;

    // certificate back-dated: calibrated after the range, due inside it
    let backdated = calibrations
        .record(RecordCalibrationCommand::without_interval(
            job.id,
            "Load cell",
            date(2024, 8, 1),
            Some(date(2024, 7, 1)),
        ))
        .await
        .unwrap();
    // calibrated after the range with an interval, so due after it too
    calibrations
        .record(RecordCalibrationCommand::with_interval(
            job.id,
            "Load cell",
            date(2024, 8, 1),
            1,
        ))
        .await
        .unwrap();

    let due = calibrations
        .list_due_between(date(2024, 6, 1), date(2024, 7, 15))
        .await
        .unwrap();

    assert_eq!(due.len(), 1);
    assert_eq!(due[0].calibration.id, backdated.id);
    assert_eq!(due[0].due_date, date(2024, 7, 1));
}

#[tokio::test]
async fn due_state_uses_the_configured_window() {
    let app = TestApp::new().await;
    let job = app.seed_job(&[], vec![]).await;
    let calibrations = &app.engine.calibrations;

    let record = calibrations
        .record(RecordCalibrationCommand::with_interval(
            job.id,
            "Caliper",
            date(2024, 1, 15),
            6,
        ))
        .await
        .unwrap();

    assert_eq!(
        calibrations.due_state_for(record.id, date(2024, 5, 1)).await.unwrap(),
        DueState::Current
    );
    assert_eq!(
        calibrations.due_state_for(record.id, date(2024, 7, 1)).await.unwrap(),
        DueState::DueSoon
    );
    assert_eq!(
        calibrations.due_state_for(record.id, date(2024, 7, 16)).await.unwrap(),
        DueState::Overdue
    );
}
