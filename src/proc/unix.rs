// src/proc/unix.rs

//! Unix process-table access via `pgrep` and `ps`.
//!
//! `ps` output is requested with empty header format specifiers
//! (`-o comm=` etc.) so there is nothing to strip but whitespace.

use std::process::Command;

use tracing::trace;

use crate::errors::{BgtaskError, Result};
use crate::proc::ProcTable;

pub struct UnixProcTable;

/// Run a query tool and capture trimmed stdout.
///
/// A tool that cannot be executed at all is a `ProcQuery` error; a tool
/// that runs but prints nothing (e.g. `ps -p` on a dead PID, `pgrep` with
/// no matches) is a clean `None`.
fn query(cmd: &str, args: &[&str]) -> Result<Option<String>> {
    trace!(cmd, ?args, "process table query");
    let output = Command::new(cmd)
        .args(args)
        .output()
        .map_err(|e| BgtaskError::ProcQuery(format!("failed to run {cmd}: {e}")))?;
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if text.is_empty() {
        Ok(None)
    } else {
        Ok(Some(text))
    }
}

/// `pgrep -f` takes an extended regex, but callers pass literal
/// substrings (base64 task IDs included, which contain `+`).
fn ere_escape(needle: &str) -> String {
    const SPECIALS: &str = r".[]()*+?{}|^$\";
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if SPECIALS.contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl ProcTable for UnixProcTable {
    fn pids_with_cmdline(&self, needle: &str) -> Result<Vec<u32>> {
        let pattern = ere_escape(needle);
        let Some(out) = query("pgrep", &["-f", &pattern])? else {
            return Ok(Vec::new());
        };
        Ok(out.lines().filter_map(|l| l.trim().parse().ok()).collect())
    }

    fn cmdline(&self, pid: u32) -> Result<Option<String>> {
        query("ps", &["-p", &pid.to_string(), "-o", "args="])
    }

    fn exe_name(&self, pid: u32) -> Result<Option<String>> {
        query("ps", &["-p", &pid.to_string(), "-o", "comm="])
    }

    fn exists(&self, pid: u32) -> Result<bool> {
        Ok(query("ps", &["-p", &pid.to_string(), "-o", "pid="])?.is_some())
    }

    fn elapsed_secs(&self, pid: u32) -> Result<Option<u64>> {
        let Some(out) = query("ps", &["-p", &pid.to_string(), "-o", "etimes="])? else {
            return Ok(None);
        };
        Ok(out.trim().parse().ok())
    }
}
