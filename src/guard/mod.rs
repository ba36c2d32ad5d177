// src/guard/mod.rs

//! The in-process runtime guard.
//!
//! Runs inside the spawned runner process: executes the task body on a
//! worker thread, listens for the timeout helper's interrupt, and always
//! finishes by classifying its own shutdown. The tail of [`run_task`] is
//! the finish hook that runs on every path (clean return, body error,
//! body panic, interrupt, ceiling).

pub mod classify;

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::proc::os_proc_table;
use crate::task::AsyncTask;
use crate::task::handler::{RegistryError, RunnableTask, TaskRegistry};
use classify::{ShutdownFacts, has_timed_out};

/// How the guarded process should exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Body finished cleanly, or the timeout path ran its hook.
    Completed,
    /// Body returned an error or panicked.
    BodyFailed,
}

/// Polling cadence of the guard loop. Both preemption points (interrupt
/// flag, execution ceiling) are observed at this granularity.
const TICK: Duration = Duration::from_millis(25);

static INTERRUPT_SEEN: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
fn install_interrupt_listener() {
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    extern "C" fn on_sigint(_: i32) {
        INTERRUPT_SEEN.store(true, Ordering::SeqCst);
    }

    let action = SigAction::new(
        SigHandler::Handler(on_sigint),
        SaFlags::empty(),
        SigSet::empty(),
    );
    // If installation fails we degrade to the elapsed-time rules; not
    // worth dying over.
    if let Err(err) = unsafe { sigaction(Signal::SIGINT, &action) } {
        warn!(%err, "could not install interrupt listener");
    }
}

/// PID whose kernel clock is authoritative for this task's elapsed time:
/// the enclosing timeout helper when there is one (it started before our
/// runtime finished initializing), otherwise ourselves.
#[cfg(unix)]
fn timer_pid() -> u32 {
    let own = std::process::id();
    let parent = std::os::unix::process::parent_id();
    match os_proc_table().exe_name(parent) {
        Ok(Some(name)) if name == "timeout" || name == "gtimeout" => parent,
        _ => own,
    }
}

/// Execute a decoded envelope to completion and classify the shutdown.
///
/// `app_start` is the instant the hosting process began initializing
/// (captured at the very top of `main`); pass `None` when driving the
/// guard from a harness that has no meaningful process start, which
/// limits timeout detection to the interrupt/ceiling rules.
///
/// Unknown task names fail before any task work starts.
pub fn run_task(
    task: &AsyncTask,
    registry: &TaskRegistry,
    app_start: Option<Instant>,
) -> Result<GuardOutcome, RegistryError> {
    let runnable = registry.resolve(task.payload())?;
    let started_at = Instant::now();
    let time_limit = task.time_limit();

    #[cfg(unix)]
    install_interrupt_listener();
    #[cfg(unix)]
    let timer = timer_pid();

    // Where no external helper wraps us, the guard itself is the
    // execution-time ceiling.
    let ceiling = if cfg!(windows) {
        time_limit.map(|secs| started_at + Duration::from_secs(secs))
    } else {
        None
    };

    debug!(?time_limit, "task body starting");
    let body = runnable.clone();
    let (done_tx, done_rx) = mpsc::channel();
    thread::spawn(move || {
        let result = catch_unwind(AssertUnwindSafe(|| body.execute()));
        let _ = done_tx.send(result);
    });

    let mut interrupted = false;
    let mut ceiling_exceeded = false;
    let mut body_result = None;
    loop {
        if INTERRUPT_SEEN.load(Ordering::SeqCst) {
            // Abandon the body and classify right away, outside of any
            // execution-time accounting.
            interrupted = true;
            break;
        }
        if let Some(deadline) = ceiling {
            if Instant::now() >= deadline {
                ceiling_exceeded = true;
                break;
            }
        }
        match done_rx.recv_timeout(TICK) {
            Ok(result) => {
                body_result = Some(result);
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    // Finish hook: every path above lands here.
    #[cfg(unix)]
    let timer_elapsed_secs = match (app_start, time_limit) {
        (Some(_), Some(_)) => os_proc_table().elapsed_secs(timer).ok().flatten(),
        _ => None,
    };
    #[cfg(not(unix))]
    let timer_elapsed_secs = None;

    let facts = ShutdownFacts {
        interrupted,
        ceiling_exceeded,
        time_limit,
        app_start,
        timer_elapsed_secs,
    };

    if has_timed_out(&facts) {
        info!(elapsed = ?started_at.elapsed(), "task ran out of time");
        if runnable.has_timeout_hook() {
            if let Err(err) = runnable.fire_timeout_hook() {
                error!(error = %err, "timeout hook failed");
            }
        }
        return Ok(GuardOutcome::Completed);
    }

    match body_result {
        Some(Ok(Ok(()))) => {
            debug!(elapsed = ?started_at.elapsed(), "task body finished");
            Ok(GuardOutcome::Completed)
        }
        Some(Ok(Err(err))) => {
            error!(error = %err, "task body failed");
            Ok(GuardOutcome::BodyFailed)
        }
        Some(Err(_panic)) => {
            error!("task body panicked");
            Ok(GuardOutcome::BodyFailed)
        }
        // Interrupt or ceiling that classification rejected; nothing
        // further to report.
        None => Ok(GuardOutcome::Completed),
    }
}
