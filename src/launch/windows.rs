// src/launch/windows.rs

//! Windows detachment: a fire-and-forget `cmd /C start /b` launch.
//!
//! No external kill-after-timeout helper is assumed to exist here; the
//! runner's own guard enforces the execution ceiling in-process.

use std::process::{Command, Stdio};

use tracing::debug;

use crate::errors::{BgtaskError, Result};
use crate::launch::SpawnStrategy;

pub struct WindowsSpawn;

impl SpawnStrategy for WindowsSpawn {
    fn spawn_detached(&self, base: &str, _time_limit: Option<u64>) -> Result<()> {
        let line = format!("start /b {base} >nul 2>nul");
        debug!(%line, "spawning detached runner");

        Command::new("cmd")
            .arg("/C")
            .arg(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(BgtaskError::Spawn)?;
        Ok(())
    }
}
