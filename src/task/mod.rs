// src/task/mod.rs

//! The task envelope: what to run plus its execution policy.
//!
//! An [`AsyncTask`] is built by the caller, optionally configured, and
//! consumed exactly once by a launch, which produces an
//! [`AsyncTaskStatus`](crate::status::AsyncTaskStatus) for later polling.

pub mod codec;
pub mod handler;

use serde::{Deserialize, Serialize};

use crate::errors::{BgtaskError, Result};
use crate::launch::Launcher;
use crate::status::AsyncTaskStatus;
use crate::task::handler::TaskHandler;
use crate::testing::FakeAsyncTask;

/// Default wall-clock limit, in seconds, for newly built tasks.
pub const DEFAULT_TIME_LIMIT_SECS: u64 = 30;

/// What to run, in transportable form. Exactly one variant is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TaskPayload {
    /// Opaque callable: a registered bare function plus its JSON
    /// arguments. Carries no timeout hook.
    Func {
        name: String,
        args: serde_json::Value,
    },
    /// Named handler object implementing `execute()` / `handle_timeout()`,
    /// with its serde state.
    Handler {
        name: String,
        state: serde_json::Value,
    },
}

/// A unit of background work plus its execution policy.
#[derive(Debug, Clone)]
pub struct AsyncTask {
    payload: TaskPayload,
    /// Maximum real time in seconds, sleeping and waiting included.
    /// `None` means unlimited.
    time_limit: Option<u64>,
    /// Caller-pinned ID. When absent, a fresh ULID is generated at launch
    /// time only, so identical envelopes launched twice get distinct IDs.
    task_id: Option<String>,
}

impl AsyncTask {
    /// Build an envelope around a handler object.
    pub fn new<H: TaskHandler>(handler: &H) -> Result<Self> {
        let state = serde_json::to_value(handler)?;
        Ok(Self {
            payload: TaskPayload::Handler {
                name: H::NAME.to_string(),
                state,
            },
            time_limit: Some(DEFAULT_TIME_LIMIT_SECS),
            task_id: None,
        })
    }

    /// Build an envelope around a registered bare function.
    pub fn from_fn(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            payload: TaskPayload::Func {
                name: name.into(),
                args,
            },
            time_limit: Some(DEFAULT_TIME_LIMIT_SECS),
            task_id: None,
        }
    }

    /// Rebuild an envelope decoded from the wire; it has no task ID of its
    /// own because the ID travels outside the payload.
    pub(crate) fn from_wire(payload: TaskPayload, time_limit: Option<u64>) -> Self {
        Self {
            payload,
            time_limit,
            task_id: None,
        }
    }

    /// Pin an explicit task ID. Should be unique per logical task.
    ///
    /// Blank IDs (empty or whitespace-only) are rejected, with the same
    /// predicate the status constructor applies: base64 of "" is "",
    /// which would make the ID undetectable on the runner's command line.
    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Result<Self> {
        let task_id = task_id.into();
        if task_id.trim().is_empty() {
            return Err(BgtaskError::BlankTaskId);
        }
        self.task_id = Some(task_id);
        Ok(self)
    }

    /// Set the maximum real time this task may run, in seconds.
    ///
    /// Zero is rejected rather than treated as "disabled"; use
    /// [`without_time_limit`](Self::without_time_limit) for that.
    pub fn with_time_limit(mut self, seconds: u64) -> Result<Self> {
        if seconds == 0 {
            return Err(BgtaskError::InvalidTimeLimit);
        }
        self.time_limit = Some(seconds);
        Ok(self)
    }

    /// Run with no time limit at all.
    pub fn without_time_limit(mut self) -> Self {
        self.time_limit = None;
        self
    }

    pub fn payload(&self) -> &TaskPayload {
        &self.payload
    }

    /// The time limit in seconds; `None` means unlimited.
    pub fn time_limit(&self) -> Option<u64> {
        self.time_limit
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    /// Start this task in the background using environment defaults
    /// (current executable as runner, `BGTASK_SECRET` for signing).
    ///
    /// For explicit configuration, use [`Launcher::launch`].
    pub fn start(self) -> Result<AsyncTaskStatus> {
        Launcher::from_env()?.launch(self)
    }

    /// A fake with the same payload, time limit and task ID, for tests.
    /// Faked tasks never spawn anything.
    pub fn fake(self) -> FakeAsyncTask {
        FakeAsyncTask::wrap(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_time_limit_is_rejected() {
        let task = AsyncTask::from_fn("test.noop", serde_json::Value::Null);
        assert!(matches!(
            task.with_time_limit(0),
            Err(BgtaskError::InvalidTimeLimit)
        ));
    }

    #[test]
    fn time_limit_is_configurable() {
        let task = AsyncTask::from_fn("test.noop", serde_json::Value::Null);
        assert_eq!(task.time_limit(), Some(DEFAULT_TIME_LIMIT_SECS));

        let task = task.with_time_limit(120).unwrap();
        assert_eq!(task.time_limit(), Some(120));

        let task = task.without_time_limit();
        assert_eq!(task.time_limit(), None);
    }

    #[test]
    fn blank_task_id_is_rejected() {
        let task = AsyncTask::from_fn("test.noop", serde_json::Value::Null);
        assert!(matches!(
            task.clone().with_task_id(""),
            Err(BgtaskError::BlankTaskId)
        ));
        // Same predicate as the status constructor: whitespace-only is
        // blank.
        assert!(matches!(
            task.with_task_id("  "),
            Err(BgtaskError::BlankTaskId)
        ));
    }

    #[test]
    fn task_id_is_not_generated_at_construction() {
        let task = AsyncTask::from_fn("test.noop", serde_json::Value::Null);
        assert_eq!(task.task_id(), None);
    }
}
