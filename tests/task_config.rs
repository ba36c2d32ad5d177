// tests/task_config.rs

//! Envelope configuration and the fake launch path.

use bgtask::AsyncTask;
use bgtask::errors::BgtaskError;
use bgtask::task::DEFAULT_TIME_LIMIT_SECS;
use bgtask_test_utils::init_tracing;

#[test]
fn configuration_chains() {
    init_tracing();
    let task = AsyncTask::from_fn("config-test.noop", serde_json::Value::Null)
        .with_time_limit(90)
        .unwrap()
        .with_task_id("report-42")
        .unwrap();

    assert_eq!(task.time_limit(), Some(90));
    assert_eq!(task.task_id(), Some("report-42"));
}

#[test]
fn default_limit_applies_until_overridden() {
    let task = AsyncTask::from_fn("config-test.noop", serde_json::Value::Null);
    assert_eq!(task.time_limit(), Some(DEFAULT_TIME_LIMIT_SECS));
    assert_eq!(task.without_time_limit().time_limit(), None);
}

#[test]
fn zero_limit_and_blank_id_are_rejected() {
    let task = AsyncTask::from_fn("config-test.noop", serde_json::Value::Null);
    assert!(matches!(
        task.clone().with_time_limit(0),
        Err(BgtaskError::InvalidTimeLimit)
    ));
    assert!(matches!(
        task.with_task_id(""),
        Err(BgtaskError::BlankTaskId)
    ));
}

#[test]
fn faked_launch_keeps_the_pinned_id_and_latches() {
    init_tracing();
    let task = AsyncTask::from_fn("config-test.noop", serde_json::Value::Null)
        .with_task_id("pinned-id")
        .unwrap();

    let mut status = task.fake().start().unwrap();
    assert_eq!(status.task_id(), "pinned-id");
    assert!(status.is_running());

    status.fake_stop_running();
    assert!(!status.is_running());
    assert!(!status.is_running());
}

#[test]
fn faked_launch_without_id_generates_one_per_start() {
    let task = AsyncTask::from_fn("config-test.noop", serde_json::Value::Null);
    let fake = task.fake();

    let first = fake.start().unwrap();
    let second = fake.start().unwrap();
    assert_ne!(first.task_id(), second.task_id());
}
