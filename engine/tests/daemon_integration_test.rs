//! Polling loop and daemon lifecycle

mod common;

use chrono::{Duration as ChronoDuration, Local, Utc};
use common::{sample_plan, Harness, CHILD, PARENT};
use potluck_engine::config::Config;
use potluck_engine::daemon::runner::open_database;
use potluck_engine::daemon::{DaemonManager, PlanningLoop};
use potluck_engine::db::state::START_REQUEST_KEY;
use potluck_engine::scheduler::{ScheduleTracker, WeeklySchedule};
use potluck_engine::session::StartOutcome;
use sdk::{MessageChannel, SessionState};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn planning_loop(h: &Harness) -> PlanningLoop {
    let channel: Arc<dyn MessageChannel> = h.channel.clone();
    PlanningLoop::new(
        h.db.clone(),
        channel,
        h.orchestrator(),
        Duration::from_millis(10),
    )
}

#[tokio::test]
async fn test_tick_handles_messages_and_stores_cursor() {
    let h = Harness::new(sample_plan()).await;
    let mut planning = planning_loop(&h);

    h.message(PARENT, "plan dinner");
    h.message(CHILD, "wish soup");

    let report = planning
        .tick(Utc::now(), Local::now().naive_local())
        .await
        .unwrap();
    assert_eq!(report.messages, 2);
    assert_eq!(report.failed, 0);
    assert_eq!(h.db.state().cursor().await.unwrap(), Some(2));

    let session = planning.orchestrator().active_session().unwrap();
    assert_eq!(session.state, SessionState::CollectingPreferences);
    assert!(session.members_responded.contains(&h.members[1].id));

    // Nothing new on the next tick
    let report = planning
        .tick(Utc::now(), Local::now().naive_local())
        .await
        .unwrap();
    assert_eq!(report.messages, 0);
    assert_eq!(h.db.state().cursor().await.unwrap(), Some(2));
}

#[tokio::test]
async fn test_tick_resumes_from_stored_cursor() {
    let h = Harness::new(sample_plan()).await;
    h.message(PARENT, "plan dinner");
    h.db.state().set_cursor(1).await.unwrap();

    let mut planning = planning_loop(&h);
    let report = planning
        .tick(Utc::now(), Local::now().naive_local())
        .await
        .unwrap();

    assert_eq!(report.messages, 0);
    assert!(planning.orchestrator().active_session().is_none());
}

#[tokio::test]
async fn test_tick_runs_timeouts() {
    let h = Harness::new(sample_plan()).await;
    let mut planning = planning_loop(&h);
    h.message(PARENT, "plan dinner");
    planning
        .tick(Utc::now(), Local::now().naive_local())
        .await
        .unwrap();

    let report = planning
        .tick(
            Utc::now() + ChronoDuration::hours(5),
            Local::now().naive_local(),
        )
        .await
        .unwrap();
    assert!(report.timeout.is_some());
    assert_eq!(
        planning.orchestrator().active_session().unwrap().state,
        SessionState::AwaitingApproval
    );
}

#[tokio::test]
async fn test_schedule_fires_once_per_slot() {
    let h = Harness::new(sample_plan()).await;
    let now = Local::now().naive_local();
    let slot = now + ChronoDuration::minutes(30);
    let schedule =
        WeeklySchedule::new(true, chrono::Datelike::weekday(&slot), 0, 0).unwrap();
    let schedule = WeeklySchedule {
        time: slot.time(),
        ..schedule
    };
    let mut planning = planning_loop(&h).with_schedule(ScheduleTracker::new(schedule, now));

    let before = planning.tick(Utc::now(), now).await.unwrap();
    assert_eq!(before.scheduled, None);

    let after = slot + ChronoDuration::minutes(1);
    let fired = planning.tick(Utc::now(), after).await.unwrap();
    assert!(matches!(fired.scheduled, Some(StartOutcome::Started { .. })));

    let again = planning.tick(Utc::now(), after).await.unwrap();
    assert_eq!(again.scheduled, None);
}

#[tokio::test]
async fn test_start_request_is_consumed() {
    let h = Harness::new(sample_plan()).await;
    let mut planning = planning_loop(&h);
    h.db.state()
        .set(START_REQUEST_KEY, &Utc::now().to_rfc3339())
        .await
        .unwrap();

    let report = planning
        .tick(Utc::now(), Local::now().naive_local())
        .await
        .unwrap();
    assert!(matches!(report.scheduled, Some(StartOutcome::Started { .. })));
    assert_eq!(h.db.state().get(START_REQUEST_KEY).await.unwrap(), None);

    let report = planning
        .tick(Utc::now(), Local::now().naive_local())
        .await
        .unwrap();
    assert_eq!(report.scheduled, None);
}

#[tokio::test]
async fn test_run_stops_when_flag_is_set() {
    let h = Harness::new(sample_plan()).await;
    let mut planning = planning_loop(&h);
    let shutdown = Arc::new(AtomicBool::new(false));

    let flag = Arc::clone(&shutdown);
    let (result, ()) = tokio::join!(planning.run(Arc::clone(&shutdown)), async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        flag.store(true, Ordering::SeqCst);
    });

    assert!(result.is_ok());
}

fn test_config(dir: &TempDir) -> Config {
    Config::from_toml(&format!(
        r#"
[core]
data_dir = "{}"

[[family.members]]
name = "Anna"
address = "100"
role = "parent"

[[family.members]]
name = "Tim"
address = "200"
role = "child"
"#,
        dir.path().display()
    ))
    .unwrap()
}

#[tokio::test]
async fn test_open_database_syncs_members() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let db = open_database(&config).await.unwrap();
    let members = db.members().list().await.unwrap();
    assert_eq!(members.len(), 2);
    assert_eq!(members[0].name, "Anna");
    assert!(members[0].is_parent());
    db.close().await.unwrap();

    // Reopening keeps ids stable
    let db = open_database(&config).await.unwrap();
    let again = db.members().list().await.unwrap();
    assert_eq!(again[0].id, members[0].id);
    db.close().await.unwrap();
}

#[tokio::test]
async fn test_graceful_shutdown_removes_pid_file() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let mut manager = DaemonManager::new(&config);
    manager.start().unwrap();
    assert!(config.pid_file_path().exists());
    assert!(DaemonManager::status(&config).pid.is_some());

    let db = open_database(&config).await.unwrap();
    manager.set_database(db);

    manager.graceful_shutdown().await;
    assert!(manager.is_shutdown_signaled());
    assert!(!config.pid_file_path().exists());
}
