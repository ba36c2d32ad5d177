// src/launch/unix.rs

//! Unix detachment: a new session, `nohup`, and GNU coreutils `timeout`
//! for the time limit.
//!
//! The runner is backgrounded inside a short-lived `sh`, which exits as
//! soon as the spawn is done; the runner is reparented to init and has no
//! tie back to the caller. The timeout helper delivers SIGINT rather than
//! a hard kill so the runner's own shutdown classification gets to run
//! first.

use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use tracing::debug;

use crate::errors::{BgtaskError, Result};
use crate::launch::SpawnStrategy;

/// Signal the timeout helper sends at the limit: SIGINT.
const TIMEOUT_SIGNAL: &str = "2";

static TIMEOUT_HELPER: OnceLock<Option<String>> = OnceLock::new();

/// Name of the kill-after-timeout helper on PATH, probed at most once per
/// process. Older macOS installs ship `gtimeout` (from brew coreutils)
/// instead of `timeout`.
pub(crate) fn timeout_helper() -> Option<&'static str> {
    TIMEOUT_HELPER
        .get_or_init(|| {
            let output = Command::new("sh")
                .args(["-c", "command -v timeout || command -v gtimeout"])
                .output()
                .ok()?;
            let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if name.is_empty() { None } else { Some(name) }
        })
        .as_deref()
}

pub struct UnixSpawn;

impl SpawnStrategy for UnixSpawn {
    fn spawn_detached(&self, base: &str, time_limit: Option<u64>) -> Result<()> {
        let timeout_clause = match time_limit {
            Some(secs) => {
                // Without the helper the time-limit contract cannot be
                // honored; fail before spawning anything.
                let helper = timeout_helper().ok_or(BgtaskError::MissingTimeoutHelper)?;
                format!("{helper} -s {TIMEOUT_SIGNAL} {secs} ")
            }
            None => String::new(),
        };

        let line = format!("nohup {timeout_clause}{base} >/dev/null 2>&1 &");
        debug!(%line, "spawning detached runner");

        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        // New session: no controlling terminal, and the runner outlives
        // the caller. setsid(2) is async-signal-safe, which is the
        // requirement for pre_exec.
        unsafe {
            cmd.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(std::io::Error::last_os_error());
                }
                Ok(())
            });
        }

        let mut child = cmd.spawn().map_err(BgtaskError::Spawn)?;
        // The wrapper sh exits the moment the runner is backgrounded, so
        // this wait is call-setup time and leaves no zombie behind.
        child.wait().map_err(BgtaskError::Spawn)?;
        Ok(())
    }
}
