// src/lib.rs

//! bgtask: fire-and-forget background tasks as detached OS processes.
//!
//! An application embeds this crate twice over. As a launcher it builds
//! an [`AsyncTask`], configures its time limit and ID, and calls
//! [`AsyncTask::start`]; the task is serialized, handed to a fresh copy
//! of the application's own binary, and detached from the session. As a
//! runner the binary's `run` subcommand decodes the transport string,
//! resolves the task against its [`TaskRegistry`](task::handler::TaskRegistry)
//! and executes it under the runtime guard, which fires the task's
//! timeout hook when the time limit cut it short. The returned
//! [`AsyncTaskStatus`] polls the OS process table to answer "is it still
//! running?" later.

pub mod cli;
pub mod config;
pub mod errors;
pub mod guard;
pub mod launch;
pub mod logging;
pub mod proc;
pub mod status;
pub mod task;
pub mod tasks;
pub mod testing;

use std::time::Instant;

use tracing::error;

pub use errors::{BgtaskError, Result};
pub use launch::{Launcher, RunnerCommand};
pub use status::AsyncTaskStatus;
pub use task::codec::Codec;
pub use task::handler::{TaskHandler, TaskRegistry};
pub use task::{AsyncTask, TaskPayload};

/// Process exit codes of the runner subcommand.
pub mod exit_codes {
    /// Task ran to completion, including the graceful-timeout path.
    pub const SUCCESS: i32 = 0;
    /// Task body failed, or the transport failed sender verification.
    pub const FAILURE: i32 = 1;
    /// Transport string was malformed.
    pub const INVALID: i32 = 2;
    /// Transport was well-formed but not of a runnable kind: foreign
    /// format marker or a task name this runner does not know.
    pub const INVALID_TYPE: i32 = 3;
}

/// Runner entry point: decode, resolve, guard, classify, exit code.
///
/// `app_start` should be captured as the first statement of `main`; it
/// anchors the wall-clock timeout rules.
pub fn run_runner(
    args: cli::CliArgs,
    registry: &task::handler::TaskRegistry,
    app_start: Option<Instant>,
) -> i32 {
    let cli::CliCommand::Run { task: transport, id: _ } = args.command;

    let codec = config::Settings::from_env().codec();
    let task = match codec.decode(&transport) {
        Ok(task) => task,
        Err(err) => {
            error!(error = %err, "could not decode transport string");
            return match err {
                task::codec::DecodeError::Unauthorized => exit_codes::FAILURE,
                task::codec::DecodeError::WrongType(_) => exit_codes::INVALID_TYPE,
                task::codec::DecodeError::InvalidEncoding
                | task::codec::DecodeError::InvalidPayload(_) => exit_codes::INVALID,
            };
        }
    };

    match guard::run_task(&task, registry, app_start) {
        Ok(guard::GuardOutcome::Completed) => exit_codes::SUCCESS,
        Ok(guard::GuardOutcome::BodyFailed) => exit_codes::FAILURE,
        Err(err) => {
            error!(error = %err, "task could not be resolved");
            exit_codes::INVALID_TYPE
        }
    }
}
