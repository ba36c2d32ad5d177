// src/tasks.rs

//! Built-in tasks shipped with the reference runner. Small enough to be
//! readable end to end, varied enough to exercise every guard path.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::task::handler::{RegistryError, TaskHandler, TaskRegistry};

/// Write a string to a file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteFileTask {
    pub path: PathBuf,
    pub contents: String,
}

impl TaskHandler for WriteFileTask {
    const NAME: &'static str = "bgtask.write_file";

    fn execute(&self) -> anyhow::Result<()> {
        std::fs::write(&self.path, &self.contents)?;
        Ok(())
    }
}

/// Sleep for a while, then exit cleanly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepTask {
    pub millis: u64,
}

impl TaskHandler for SleepTask {
    const NAME: &'static str = "bgtask.sleep";

    fn execute(&self) -> anyhow::Result<()> {
        thread::sleep(Duration::from_millis(self.millis));
        Ok(())
    }
}

/// Sleep past its own time limit and record the timeout hook firing by
/// writing a marker file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutMarkerTask {
    pub path: PathBuf,
    pub message: String,
    pub sleep_ms: u64,
}

impl TaskHandler for TimeoutMarkerTask {
    const NAME: &'static str = "bgtask.timeout_marker";

    fn execute(&self) -> anyhow::Result<()> {
        thread::sleep(Duration::from_millis(self.sleep_ms));
        Ok(())
    }

    fn handle_timeout(&self) {
        let _ = std::fs::write(&self.path, &self.message);
    }
}

/// Always returns an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailingTask;

impl TaskHandler for FailingTask {
    const NAME: &'static str = "bgtask.failing";

    fn execute(&self) -> anyhow::Result<()> {
        anyhow::bail!("this task always fails")
    }
}

/// Always panics. Exists to prove a panicking body cannot take the guard
/// down with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PanicTask;

impl TaskHandler for PanicTask {
    const NAME: &'static str = "bgtask.panic";

    fn execute(&self) -> anyhow::Result<()> {
        panic!("this task always panics")
    }
}

/// Emits log lines and succeeds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoisyTask {
    pub label: String,
}

impl TaskHandler for NoisyTask {
    const NAME: &'static str = "bgtask.noisy";

    fn execute(&self) -> anyhow::Result<()> {
        info!(label = %self.label, "noisy task running");
        warn!(label = %self.label, "noisy task about to finish");
        Ok(())
    }
}

/// Bare-function variant of [`WriteFileTask`]. Registered under
/// `bgtask.write_file_fn`; args are `[path, contents]`.
pub fn write_file_fn(args: serde_json::Value) -> anyhow::Result<()> {
    let path = args
        .get(0)
        .and_then(|v| v.as_str())
        .ok_or_else(|| anyhow::anyhow!("missing path argument"))?;
    let contents = args.get(1).and_then(|v| v.as_str()).unwrap_or_default();
    std::fs::write(path, contents)?;
    Ok(())
}

/// Register every built-in task on a registry.
pub fn register_builtin(registry: &mut TaskRegistry) -> Result<(), RegistryError> {
    registry.register::<WriteFileTask>()?;
    registry.register::<SleepTask>()?;
    registry.register::<TimeoutMarkerTask>()?;
    registry.register::<FailingTask>()?;
    registry.register::<PanicTask>()?;
    registry.register::<NoisyTask>()?;
    registry.register_fn("bgtask.write_file_fn", write_file_fn)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registration_is_clean() {
        let mut registry = TaskRegistry::new();
        register_builtin(&mut registry).unwrap();
        let names = registry.registered_names();
        assert!(names.contains(&"bgtask.write_file"));
        assert!(names.contains(&"bgtask.write_file_fn"));
    }

    #[test]
    fn write_file_fn_requires_a_path() {
        let err = write_file_fn(serde_json::json!([])).unwrap_err();
        assert!(err.to_string().contains("missing path"));
    }
}
