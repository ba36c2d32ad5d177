// src/proc/windows.rs

//! Windows process-table access via `wmic` and `tasklist`.
//!
//! `wmic ... /format:value` prints `Property=value` lines, which keeps
//! parsing independent of column widths and localized headers.

use std::process::Command;

use tracing::trace;

use crate::errors::{BgtaskError, Result};
use crate::proc::ProcTable;

pub struct WindowsProcTable;

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

/// Extract `Property=value` payloads from `/format:value` output.
fn values_of<'a>(out: &'a str, property: &str) -> Vec<&'a str> {
    let prefix = format!("{property}=");
    out.lines()
        .filter_map(|line| line.trim().strip_prefix(prefix.as_str()))
        .filter(|v| !v.is_empty())
        .collect()
}

impl ProcTable for WindowsProcTable {
    fn pids_with_cmdline(&self, needle: &str) -> Result<Vec<u32>> {
        // WQL escaping: the needle is base64, so quotes cannot occur, but
        // strip them anyway rather than trusting the caller.
        let needle = needle.replace(['\'', '"'], "");
        let filter = format!("CommandLine like '%{needle}%'");
        let Some(out) = query(
            "wmic",
            &["process", "where", &filter, "get", "ProcessId", "/format:value"],
        )?
        else {
            return Ok(Vec::new());
        };
        Ok(values_of(&out, "ProcessId")
            .into_iter()
            .filter_map(|v| v.parse().ok())
            .collect())
    }

    fn cmdline(&self, pid: u32) -> Result<Option<String>> {
        let filter = format!("ProcessId={pid}");
        let Some(out) = query(
            "wmic",
            &["process", "where", &filter, "get", "CommandLine", "/format:value"],
        )?
        else {
            return Ok(None);
        };
        Ok(values_of(&out, "CommandLine").first().map(|s| s.to_string()))
    }

    fn exe_name(&self, pid: u32) -> Result<Option<String>> {
        let filter = format!("ProcessId={pid}");
        let Some(out) = query(
            "wmic",
            &["process", "where", &filter, "get", "Name", "/format:value"],
        )?
        else {
            return Ok(None);
        };
        Ok(values_of(&out, "Name").first().map(|s| s.to_string()))
    }

    fn exists(&self, pid: u32) -> Result<bool> {
        let filter = format!("PID eq {pid}");
        let Some(out) = query("tasklist", &["/FI", &filter, "/NH"])? else {
            return Ok(false);
        };
        // tasklist prints an INFO line when the filter matches nothing.
        Ok(out.split_whitespace().any(|tok| tok == pid.to_string()))
    }

    fn elapsed_secs(&self, _pid: u32) -> Result<Option<u64>> {
        // No whole-seconds elapsed query is assumed present; timeout
        // classification on Windows leans on the guard's own ceiling.
        Ok(None)
    }
}
