// src/testing.rs

//! In-memory fakes for exercising task orchestration without spawning
//! anything. Wrap a configured task with [`crate::task::AsyncTask::fake`]
//! and drive the returned status handle by hand.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use ulid::Ulid;

use crate::errors::{BgtaskError, Result};
use crate::task::AsyncTask;

/// A task that pretends to launch. Carries the real configuration so
/// assertions against ids and limits still work.
#[derive(Debug, Clone)]
pub struct FakeAsyncTask {
    inner: AsyncTask,
}

impl FakeAsyncTask {
    pub fn wrap(inner: AsyncTask) -> Self {
        Self { inner }
    }

    /// "Launch" the task: no process is spawned, but the returned handle
    /// reports running until told otherwise.
    pub fn start(&self) -> Result<FakeAsyncTaskStatus> {
        let task_id = match self.inner.task_id() {
            Some(id) => id.to_owned(),
            None => Ulid::new().to_string(),
        };
        FakeAsyncTaskStatus::new(task_id)
    }

    /// No-op stand-in for the detached body run.
    pub fn run(&self) {}

    pub fn inner(&self) -> &AsyncTask {
        &self.inner
    }
}

/// Status handle for a faked launch. Starts out running; flip it with
/// [`FakeAsyncTaskStatus::fake_stop_running`].
#[derive(Debug, Clone)]
pub struct FakeAsyncTaskStatus {
    task_id: String,
    encoded_task_id: String,
    running: bool,
}

impl FakeAsyncTaskStatus {
    pub fn new(task_id: impl Into<String>) -> Result<Self> {
        let task_id = task_id.into();
        if task_id.trim().is_empty() {
            return Err(BgtaskError::BlankTaskId);
        }
        let encoded_task_id = BASE64.encode(task_id.as_bytes());
        Ok(Self {
            task_id,
            encoded_task_id,
            running: true,
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn encoded_task_id(&self) -> &str {
        &self.encoded_task_id
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Simulate the runner exiting. Latches: the handle never reports
    /// running again.
    pub fn fake_stop_running(&mut self) {
        self.running = false;
    }
}
