// src/status/mod.rs

//! Liveness tracking for launched tasks.
//!
//! A status handle starts out knowing only the task id. The first
//! `is_running` call runs a discovery scan: a hit pins the runner's PID,
//! a miss latches stopped. From then on the handle watches the pinned
//! PID alone, and once the PID disappears it latches stopped forever.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{debug, trace};

use crate::errors::{BgtaskError, Result};
use crate::proc::{ProcTable, os_proc_table};

/// Substring that separates the runner invocation from launcher noise in
/// a scanned command line (the subcommand, space-delimited both sides).
const RUN_MARKER: &str = " run ";
const ID_FLAG: &str = "--id=";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TrackState {
    /// Never observed; the next check runs a discovery scan.
    Unknown,
    /// Pinned to the runner's PID.
    Tracking(u32),
    /// The tracked PID went away. Terminal.
    Stopped,
}

/// Tracks whether a detached task's runner process is still alive.
pub struct AsyncTaskStatus {
    task_id: String,
    encoded_task_id: String,
    runner_exe: String,
    state: TrackState,
    table: Box<dyn ProcTable>,
}

impl AsyncTaskStatus {
    /// Track a task launched by the current executable.
    pub fn new(task_id: impl Into<String>) -> Result<Self> {
        let exe = std::env::current_exe()?;
        let runner_exe = exe
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::for_runner(task_id, runner_exe)
    }

    /// Track a task launched by a specific runner binary name.
    pub fn for_runner(task_id: impl Into<String>, runner_exe: impl Into<String>) -> Result<Self> {
        let task_id = task_id.into();
        if task_id.trim().is_empty() {
            return Err(BgtaskError::BlankTaskId);
        }
        let encoded_task_id = BASE64.encode(task_id.as_bytes());
        Ok(Self {
            task_id,
            encoded_task_id,
            runner_exe: runner_exe.into(),
            state: TrackState::Unknown,
            table: os_proc_table(),
        })
    }

    /// Swap in a different process table. Test seam.
    pub fn with_proc_table(mut self, table: Box<dyn ProcTable>) -> Self {
        self.table = table;
        self
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// The base64 form the runner carries in its `--id` flag.
    pub fn encoded_task_id(&self) -> &str {
        &self.encoded_task_id
    }

    /// Whether the runner process is currently alive.
    ///
    /// Errors from the underlying process table propagate so a query
    /// failure is never mistaken for "stopped".
    pub fn is_running(&mut self) -> Result<bool> {
        match self.state {
            TrackState::Stopped => Ok(false),
            TrackState::Tracking(pid) => {
                if self.table.exists(pid)? {
                    Ok(true)
                } else {
                    debug!(pid, task_id = %self.task_id, "tracked runner exited");
                    self.state = TrackState::Stopped;
                    Ok(false)
                }
            }
            TrackState::Unknown => match self.discover()? {
                Some(pid) => {
                    debug!(pid, task_id = %self.task_id, "runner discovered");
                    self.state = TrackState::Tracking(pid);
                    Ok(true)
                }
                None => {
                    // A failed scan is conclusive: either the runner never
                    // came up or it already exited. Latch, so later PID
                    // reuse cannot resurrect the task.
                    debug!(task_id = %self.task_id, "no runner found, marking stopped");
                    self.state = TrackState::Stopped;
                    Ok(false)
                }
            },
        }
    }

    /// Scan the process table for a runner carrying our encoded id.
    fn discover(&self) -> Result<Option<u32>> {
        let candidates = self.table.pids_with_cmdline(&self.encoded_task_id)?;
        trace!(count = candidates.len(), "discovery scan candidates");
        for pid in candidates {
            let Some(cmdline) = self.table.cmdline(pid)? else {
                continue;
            };
            if !cmdline.contains(RUN_MARKER) {
                continue;
            }
            if !cmdline.contains(&format!("{ID_FLAG}{}", self.encoded_task_id)) {
                continue;
            }
            let Some(exe) = self.table.exe_name(pid)? else {
                continue;
            };
            // Some process tables truncate the executable name to 15
            // bytes; accept a truncated prefix match.
            let exe_matches = exe == self.runner_exe
                || (exe.len() == 15 && self.runner_exe.starts_with(&exe));
            if exe_matches {
                return Ok(Some(pid));
            }
        }
        Ok(None)
    }
}

impl std::fmt::Debug for AsyncTaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncTaskStatus")
            .field("task_id", &self.task_id)
            .field("runner_exe", &self.runner_exe)
            .field("state", &self.state)
            .finish()
    }
}
