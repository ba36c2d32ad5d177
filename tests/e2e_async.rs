// tests/e2e_async.rs

//! End-to-end launches through the real binary: detachment, timeout
//! enforcement via the external helper, and liveness tracking.
//!
//! These tests spawn actual processes and watch the real process table,
//! so they carry generous polling deadlines.

#![cfg(unix)]

use std::path::Path;
use std::process::Command;
use std::time::{Duration, Instant};

use bgtask::tasks::{NoisyTask, SleepTask, TimeoutMarkerTask, WriteFileTask};
use bgtask::{AsyncTask, AsyncTaskStatus, Codec, Launcher, RunnerCommand};
use bgtask_test_utils::init_tracing;

const RUNNER_BIN: &str = env!("CARGO_BIN_EXE_bgtask");

fn launcher() -> Launcher {
    Launcher::new(Codec::new(), RunnerCommand::new(RUNNER_BIN))
}

/// Poll `check` every 50ms until it passes or `deadline` elapses.
fn wait_for(deadline: Duration, mut check: impl FnMut() -> bool) -> bool {
    let end = Instant::now() + deadline;
    loop {
        if check() {
            return true;
        }
        if Instant::now() >= end {
            return false;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}

#[test]
fn handler_task_runs_in_the_background() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.txt");

    let task = AsyncTask::new(&WriteFileTask {
        path: path.clone(),
        contents: "hello from the background".to_string(),
    })
    .unwrap();
    launcher().launch(task).unwrap();

    assert!(wait_for(Duration::from_secs(5), || path.exists()));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "hello from the background"
    );
}

#[test]
fn bare_function_task_runs_in_the_background() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fn-out.txt");

    let task = AsyncTask::from_fn(
        "bgtask.write_file_fn",
        serde_json::json!([path.to_string_lossy(), "fn variant"]),
    );
    launcher().launch(task).unwrap();

    assert!(wait_for(Duration::from_secs(5), || path.exists()));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "fn variant");
}

#[test]
fn launch_returns_before_the_task_finishes() {
    init_tracing();
    let task = AsyncTask::new(&SleepTask { millis: 10_000 }).unwrap();

    let started = Instant::now();
    launcher().launch(task).unwrap();
    // Spawning the detached wrapper is all that happens synchronously.
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn overrunning_task_fires_its_timeout_hook() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("marker.txt");

    let task = AsyncTask::new(&TimeoutMarkerTask {
        path: marker.clone(),
        message: "timeout occurred".to_string(),
        sleep_ms: 30_000,
    })
    .unwrap()
    .with_time_limit(1)
    .unwrap();
    launcher().launch(task).unwrap();

    // The helper interrupts the runner after ~1s; the hook then writes
    // the marker.
    assert!(wait_for(Duration::from_secs(8), || marker.exists()));
    assert_eq!(std::fs::read_to_string(&marker).unwrap(), "timeout occurred");
}

#[test]
fn task_that_finishes_in_time_never_fires_the_hook() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let marker = dir.path().join("no-marker.txt");

    let task = AsyncTask::new(&TimeoutMarkerTask {
        path: marker.clone(),
        message: "timeout occurred".to_string(),
        sleep_ms: 10,
    })
    .unwrap()
    .with_time_limit(30)
    .unwrap();
    launcher().launch(task).unwrap();

    std::thread::sleep(Duration::from_millis(1500));
    assert!(!marker.exists());
}

#[test]
fn status_tracks_the_runner_until_it_exits() {
    init_tracing();
    let task_id = format!("e2e-track-{}", std::process::id());
    let task = AsyncTask::new(&SleepTask { millis: 4_000 })
        .unwrap()
        .with_task_id(&task_id)
        .unwrap();

    let mut status = launcher().launch(task).unwrap();
    assert_eq!(status.task_id(), task_id);

    // Give the nohup/timeout exec chain a moment to reach the runner
    // before the one-shot discovery scan runs; a premature scan would
    // latch stopped.
    std::thread::sleep(Duration::from_millis(800));
    assert!(status.is_running().unwrap());

    assert!(wait_for(Duration::from_secs(10), || {
        !status.is_running().unwrap()
    }));
    // Stopped is terminal.
    assert!(!status.is_running().unwrap());
}

#[test]
fn quick_exit_without_limit_reads_as_stopped() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("quick.txt");

    let task = AsyncTask::new(&WriteFileTask {
        path: path.clone(),
        contents: "done".to_string(),
    })
    .unwrap()
    .without_time_limit()
    .with_task_id(format!("e2e-quick-{}", std::process::id()))
    .unwrap();
    let mut status = launcher().launch(task).unwrap();

    // Let the task finish first; its output file is the proof.
    assert!(wait_for(Duration::from_secs(5), || path.exists()));
    std::thread::sleep(Duration::from_millis(300));

    let started = Instant::now();
    assert!(!status.is_running().unwrap());
    assert!(started.elapsed() < Duration::from_millis(600));
    assert!(!status.is_running().unwrap());
}

#[test]
fn never_launched_id_reads_as_not_running() {
    init_tracing();
    let runner = Path::new(RUNNER_BIN).file_name().unwrap().to_string_lossy();
    let mut status =
        AsyncTaskStatus::for_runner("e2e-never-launched", runner.into_owned()).unwrap();

    let started = Instant::now();
    assert!(!status.is_running().unwrap());
    // One discovery scan, no retry loop.
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
fn noisy_task_exits_with_success() {
    let transport = Codec::new()
        .encode(
            &AsyncTask::new(&NoisyTask {
                label: "e2e".to_string(),
            })
            .unwrap()
            .with_time_limit(30)
            .unwrap(),
        )
        .unwrap();
    let output = Command::new(RUNNER_BIN)
        .args(["run", &transport, "--id=eDE="])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(bgtask::exit_codes::SUCCESS));
}

#[test]
fn malformed_transport_exits_with_invalid() {
    let output = Command::new(RUNNER_BIN)
        .args(["run", "definitely not base64", "--id=eDE="])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(bgtask::exit_codes::INVALID));
}

#[test]
fn unknown_task_name_exits_with_invalid_type() {
    let transport = Codec::new()
        .encode(&AsyncTask::from_fn(
            "e2e.not_registered",
            serde_json::Value::Null,
        ))
        .unwrap();
    let output = Command::new(RUNNER_BIN)
        .args(["run", &transport, "--id=eDE="])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(bgtask::exit_codes::INVALID_TYPE));
}

#[test]
fn unverifiable_transport_exits_with_failure() {
    let transport = Codec::with_secret("some other secret")
        .encode(&AsyncTask::from_fn("bgtask.sleep", serde_json::json!(null)))
        .unwrap();
    let output = Command::new(RUNNER_BIN)
        .args(["run", &transport, "--id=eDE="])
        .env("BGTASK_SECRET", "runner secret")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(bgtask::exit_codes::FAILURE));
}
