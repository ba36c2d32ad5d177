// src/launch/mod.rs

//! Turning an envelope into a detached OS process.
//!
//! The launcher assembles the runner command line, picks the detachment
//! strategy for the host OS family once, and returns a status object
//! immediately; it never waits for the task.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use ulid::Ulid;

use crate::config::Settings;
use crate::errors::Result;
use crate::status::AsyncTaskStatus;
use crate::task::AsyncTask;
use crate::task::codec::Codec;

#[cfg(unix)]
pub use unix::UnixSpawn;
#[cfg(windows)]
pub use windows::WindowsSpawn;

/// How to invoke the runner entry point on this machine.
#[derive(Debug, Clone)]
pub struct RunnerCommand {
    program: PathBuf,
}

impl RunnerCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// The launching application is its own runner (the common case: the
    /// binary that builds envelopes also registers the handlers).
    pub fn current_exe() -> Result<Self> {
        Ok(Self {
            program: std::env::current_exe()?,
        })
    }

    /// Executable name the status tracker later matches candidates
    /// against.
    pub(crate) fn exe_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }

    /// The program token as it appears on the assembled command line.
    fn program_token(&self) -> String {
        quote_if_needed(&self.program)
    }
}

/// Quote a program path for the wrapping shell when it contains
/// whitespace or shell-special characters. Transport strings and encoded
/// IDs are base64 and never need quoting.
///
/// Inside `sh` double quotes, `$`, backtick, `"` and `\` keep their
/// special meaning and must be backslash-escaped; `cmd` has no such
/// expansion, and escaping `\` there would corrupt the path.
fn quote_if_needed(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let specials: &[char] = if cfg!(windows) {
        &['"']
    } else {
        &['"', '$', '`', '\\']
    };
    if !raw.chars().any(|c| c.is_whitespace() || specials.contains(&c)) {
        return raw.into_owned();
    }

    let mut quoted = String::with_capacity(raw.len() + 2);
    quoted.push('"');
    for c in raw.chars() {
        if !cfg!(windows) && specials.contains(&c) {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Strategy for detaching and time-limiting the runner on one OS family.
///
/// One implementation per family, selected once via
/// [`os_spawn_strategy`]; tests can drive a strategy directly.
pub trait SpawnStrategy: Send + Sync {
    /// Spawn `base` (a fully assembled runner invocation) detached from
    /// the calling session, wrapped to enforce `time_limit` seconds when
    /// set. Must return in call-setup time.
    fn spawn_detached(&self, base: &str, time_limit: Option<u64>) -> Result<()>;
}

/// The detachment strategy of the host OS.
pub fn os_spawn_strategy() -> &'static dyn SpawnStrategy {
    #[cfg(unix)]
    {
        &UnixSpawn
    }
    #[cfg(windows)]
    {
        &WindowsSpawn
    }
}

/// Launches envelopes as detached runner processes.
pub struct Launcher {
    codec: Codec,
    runner: RunnerCommand,
    strategy: &'static dyn SpawnStrategy,
}

impl Launcher {
    pub fn new(codec: Codec, runner: RunnerCommand) -> Self {
        Self {
            codec,
            runner,
            strategy: os_spawn_strategy(),
        }
    }

    /// Launcher configured from the environment: current executable as
    /// runner, `BGTASK_SECRET` for transport signing.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            Settings::from_env().codec(),
            RunnerCommand::current_exe()?,
        ))
    }

    /// Start the task in the background and return its status object
    /// immediately.
    ///
    /// The task is consumed: launching the "same" envelope twice requires
    /// building it twice, and each launch without a pinned ID gets a
    /// fresh one.
    pub fn launch(&self, task: AsyncTask) -> Result<AsyncTaskStatus> {
        let task_id = match task.task_id() {
            Some(id) => id.to_string(),
            None => Ulid::new().to_string(),
        };
        let status = AsyncTaskStatus::for_runner(task_id, self.runner.exe_name())?;

        let transport = self.codec.encode(&task)?;
        let base = format!(
            "{} run {} --id={}",
            self.runner.program_token(),
            transport,
            status.encoded_task_id()
        );
        debug!(task_id = %status.task_id(), "assembled runner invocation");

        self.strategy.spawn_detached(&base, task.time_limit())?;
        info!(task_id = %status.task_id(), "launched detached task");
        Ok(status)
    }
}
