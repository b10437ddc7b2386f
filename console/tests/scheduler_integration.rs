//! Scheduler engine tests: timer registration, cancellation, phase
//! execution, recurrence, and startup reconciliation.
//!
//! Phase-execution tests run real timers with short windows against
//! temp-file databases; they are serialized to keep timing slack generous.

mod common;

use chrono::{Duration, Utc};
use common::{maintenance_window, new_server, recurring_window, servers};
use console::database::{MaintenanceStatus, RecurrencePattern, ServerStatus};
use console::errors::SchedulerError;
use console::scheduler::Phase;
use serial_test::serial;

#[tokio::test]
async fn scheduling_registers_both_phase_timers() {
    let ctx = common::test_context().await;
    let server = ctx
        .database
        .create_server(&new_server(servers::WEB_1))
        .await
        .unwrap();
    let record = ctx
        .database
        .create_maintenance(&maintenance_window(server.id, 3_600_000, 3_600_000))
        .await
        .unwrap();

    ctx.scheduler.schedule_maintenance(record.id).await.unwrap();

    let jobs = ctx.scheduler.scheduled_jobs();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].maintenance_id, record.id);
    assert_eq!(jobs[0].phase, Phase::Start);
    assert_eq!(jobs[1].phase, Phase::End);
}

#[tokio::test]
async fn scheduling_unknown_id_is_not_found() {
    let ctx = common::test_context().await;
    let result = ctx.scheduler.schedule_maintenance(4242).await;
    assert!(matches!(
        result,
        Err(SchedulerError::MaintenanceNotFound {
            maintenance_id: 4242
        })
    ));
    assert!(ctx.scheduler.scheduled_jobs().is_empty());
}

#[tokio::test]
async fn schedule_then_cancel_leaves_no_timers() {
    let ctx = common::test_context().await;
    let server = ctx
        .database
        .create_server(&new_server(servers::WEB_1))
        .await
        .unwrap();
    let record = ctx
        .database
        .create_maintenance(&maintenance_window(server.id, 3_600_000, 3_600_000))
        .await
        .unwrap();

    ctx.scheduler.schedule_maintenance(record.id).await.unwrap();
    ctx.scheduler.cancel_maintenance(record.id).await.unwrap();

    assert!(ctx.scheduler.scheduled_jobs().is_empty());
    let record = ctx
        .database
        .get_maintenance(record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, MaintenanceStatus::Cancelled);
}

#[tokio::test]
async fn rescheduling_replaces_timers_instead_of_duplicating() {
    let ctx = common::test_context().await;
    let server = ctx
        .database
        .create_server(&new_server(servers::WEB_1))
        .await
        .unwrap();
    let record = ctx
        .database
        .create_maintenance(&maintenance_window(server.id, 3_600_000, 3_600_000))
        .await
        .unwrap();

    ctx.scheduler.schedule_maintenance(record.id).await.unwrap();
    ctx.scheduler.schedule_maintenance(record.id).await.unwrap();
    ctx.scheduler.schedule_maintenance(record.id).await.unwrap();

    assert_eq!(ctx.scheduler.scheduled_jobs().len(), 2);
}

#[tokio::test]
async fn cancel_of_nonexistent_id_is_a_noop() {
    let ctx = common::test_context().await;
    ctx.scheduler.cancel_maintenance(4242).await.unwrap();
    assert!(ctx.scheduler.scheduled_jobs().is_empty());
    assert!(ctx.database.list_maintenance().await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn start_fire_moves_server_into_maintenance() {
    let ctx = common::test_context().await;
    let server = ctx
        .database
        .create_server(&new_server(servers::WEB_1))
        .await
        .unwrap();
    // Starts in 300ms, ends far in the future
    let record = ctx
        .database
        .create_maintenance(&maintenance_window(server.id, 300, 60_000))
        .await
        .unwrap();

    ctx.scheduler.schedule_maintenance(record.id).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;

    let server = ctx.database.get_server(server.id).await.unwrap().unwrap();
    assert_eq!(server.status, ServerStatus::Maintenance);

    let record = ctx
        .database
        .get_maintenance(record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, MaintenanceStatus::InProgress);
    let actual_start = record.actual_start.expect("actual_start stamped");
    assert!((actual_start - record.scheduled_start).num_milliseconds().abs() < 1_500);

    // Only the end timer is left pending
    let jobs = ctx.scheduler.scheduled_jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].phase, Phase::End);
}

#[tokio::test]
#[serial]
async fn end_fire_completes_window_and_spawns_daily_successor() {
    let ctx = common::test_context().await;
    let server = ctx
        .database
        .create_server(&new_server(servers::WEB_1))
        .await
        .unwrap();
    let record = ctx
        .database
        .create_maintenance(&recurring_window(
            server.id,
            200,
            400,
            RecurrencePattern::Daily,
        ))
        .await
        .unwrap();

    ctx.scheduler.schedule_maintenance(record.id).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(2_000)).await;

    let server_after = ctx.database.get_server(server.id).await.unwrap().unwrap();
    assert_eq!(server_after.status, ServerStatus::Online);

    let completed = ctx
        .database
        .get_maintenance(record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(completed.status, MaintenanceStatus::Completed);
    assert!(completed.actual_start.is_some());
    assert!(completed.actual_end.is_some());

    // Exactly one successor, one day later, same duration, SCHEDULED
    let all = ctx
        .database
        .list_maintenance_for_server(server.id)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    let successor = all
        .iter()
        .find(|m| m.id != record.id)
        .expect("successor row");
    assert_eq!(successor.status, MaintenanceStatus::Scheduled);
    assert!(successor.recurring);
    assert_eq!(successor.recurring_pattern, Some(RecurrencePattern::Daily));

    let start_shift = successor.scheduled_start - completed.scheduled_start;
    assert!((start_shift - Duration::days(1)).num_milliseconds().abs() < 10);
    let original_duration = completed.scheduled_end - completed.scheduled_start;
    let successor_duration = successor.scheduled_end - successor.scheduled_start;
    assert!((successor_duration - original_duration).num_milliseconds().abs() < 10);

    // The successor's timers are live
    let jobs = ctx.scheduler.scheduled_jobs();
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|job| job.maintenance_id == successor.id));
}

#[tokio::test]
#[serial]
async fn elapsed_next_occurrence_is_silently_skipped() {
    let ctx = common::test_context().await;
    let server = ctx
        .database
        .create_server(&new_server(servers::WEB_1))
        .await
        .unwrap();

    // A weekly window whose whole schedule is 8 days in the past: both
    // timers fire immediately, and the successor (start + 7d, still in the
    // past) must not be created.
    let mut stale = recurring_window(server.id, 0, 3_600_000, RecurrencePattern::Weekly);
    stale.scheduled_start = Utc::now() - Duration::days(8);
    stale.scheduled_end = stale.scheduled_start + Duration::hours(1);
    let record = ctx.database.create_maintenance(&stale).await.unwrap();

    ctx.scheduler.schedule_maintenance(record.id).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;

    let all = ctx
        .database
        .list_maintenance_for_server(server.id)
        .await
        .unwrap();
    assert_eq!(all.len(), 1, "no successor should be created");
    assert!(ctx.scheduler.scheduled_jobs().is_empty());
}

#[tokio::test]
async fn reconciliation_restores_timers_for_future_windows() {
    let ctx = common::test_context().await;
    let server = ctx
        .database
        .create_server(&new_server(servers::WEB_1))
        .await
        .unwrap();
    let record = ctx
        .database
        .create_maintenance(&maintenance_window(server.id, 3_600_000, 3_600_000))
        .await
        .unwrap();

    let restored = ctx.scheduler.restore_pending().await.unwrap();
    assert_eq!(restored, 1);

    let jobs = ctx.scheduler.scheduled_jobs();
    assert_eq!(jobs.len(), 2);
    assert!(jobs.iter().all(|job| job.maintenance_id == record.id));
}

#[tokio::test]
async fn reconciliation_skips_elapsed_windows_without_touching_them() {
    let ctx = common::test_context().await;
    let server = ctx
        .database
        .create_server(&new_server(servers::WEB_1))
        .await
        .unwrap();

    let mut stale = maintenance_window(server.id, 0, 3_600_000);
    stale.scheduled_start = Utc::now() - Duration::hours(2);
    stale.scheduled_end = Utc::now() - Duration::hours(1);
    let record = ctx.database.create_maintenance(&stale).await.unwrap();

    let restored = ctx.scheduler.restore_pending().await.unwrap();
    assert_eq!(restored, 0);
    assert!(ctx.scheduler.scheduled_jobs().is_empty());

    // The elapsed row stays SCHEDULED; it is not auto-started, failed, or
    // cancelled.
    let record = ctx
        .database
        .get_maintenance(record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.status, MaintenanceStatus::Scheduled);
}

#[tokio::test]
async fn reconciliation_runs_only_once_per_process() {
    let ctx = common::test_context().await;
    let server = ctx
        .database
        .create_server(&new_server(servers::WEB_1))
        .await
        .unwrap();
    ctx.database
        .create_maintenance(&maintenance_window(server.id, 3_600_000, 3_600_000))
        .await
        .unwrap();

    assert_eq!(ctx.scheduler.restore_pending().await.unwrap(), 1);
    assert_eq!(ctx.scheduler.restore_pending().await.unwrap(), 0);
    assert_eq!(ctx.scheduler.scheduled_jobs().len(), 2);
}

#[tokio::test]
#[serial]
async fn end_to_end_daily_window_lifecycle() {
    let ctx = common::test_context().await;
    let server = ctx
        .database
        .create_server(&new_server(servers::WEB_1))
        .await
        .unwrap();
    let record = ctx
        .database
        .create_maintenance(&recurring_window(
            server.id,
            300,
            500,
            RecurrencePattern::Daily,
        ))
        .await
        .unwrap();
    ctx.scheduler.schedule_maintenance(record.id).await.unwrap();

    // Mid-window: server under maintenance, record in progress
    tokio::time::sleep(std::time::Duration::from_millis(600)).await;
    let mid_server = ctx.database.get_server(server.id).await.unwrap().unwrap();
    let mid_record = ctx
        .database
        .get_maintenance(record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mid_server.status, ServerStatus::Maintenance);
    assert_eq!(mid_record.status, MaintenanceStatus::InProgress);

    // Past the end: back online, completed, successor one day out
    tokio::time::sleep(std::time::Duration::from_millis(1_500)).await;
    let final_server = ctx.database.get_server(server.id).await.unwrap().unwrap();
    let final_record = ctx
        .database
        .get_maintenance(record.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(final_server.status, ServerStatus::Online);
    assert_eq!(final_record.status, MaintenanceStatus::Completed);

    let all = ctx
        .database
        .list_maintenance_for_server(server.id)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
    let successor = all.iter().find(|m| m.id != record.id).unwrap();
    let shift = successor.scheduled_start - final_record.scheduled_start;
    assert!((shift - Duration::days(1)).num_milliseconds().abs() < 10);
}
