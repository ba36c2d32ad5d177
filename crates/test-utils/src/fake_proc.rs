use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bgtask::errors::{BgtaskError, Result};
use bgtask::proc::ProcTable;

/// One entry in the fake process table.
#[derive(Debug, Clone)]
pub struct FakeProcess {
    pub cmdline: String,
    pub exe_name: String,
    pub elapsed_secs: u64,
}

/// An in-memory process table.
///
/// Clones share state, so a test can hand one clone to an
/// `AsyncTaskStatus` and keep mutating processes through the other.
#[derive(Debug, Clone, Default)]
pub struct FakeProcTable {
    procs: Arc<Mutex<HashMap<u32, FakeProcess>>>,
    fail: Arc<Mutex<bool>>,
}

impl FakeProcTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, pid: u32, proc: FakeProcess) {
        self.procs.lock().unwrap().insert(pid, proc);
    }

    /// Remove a process, as if it exited.
    pub fn remove(&self, pid: u32) {
        self.procs.lock().unwrap().remove(&pid);
    }

    /// Make every subsequent query fail, simulating broken OS tooling.
    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    fn check(&self) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(BgtaskError::ProcQuery(
                "fake process table failure".to_string(),
            ));
        }
        Ok(())
    }
}

impl ProcTable for FakeProcTable {
    fn pids_with_cmdline(&self, needle: &str) -> Result<Vec<u32>> {
        self.check()?;
        let procs = self.procs.lock().unwrap();
        let mut pids: Vec<u32> = procs
            .iter()
            .filter(|(_, p)| p.cmdline.contains(needle))
            .map(|(pid, _)| *pid)
            .collect();
        // Deterministic order for assertions.
        pids.sort_unstable();
        Ok(pids)
    }

    fn cmdline(&self, pid: u32) -> Result<Option<String>> {
        self.check()?;
        Ok(self
            .procs
            .lock()
            .unwrap()
            .get(&pid)
            .map(|p| p.cmdline.clone()))
    }

    fn exe_name(&self, pid: u32) -> Result<Option<String>> {
        self.check()?;
        Ok(self
            .procs
            .lock()
            .unwrap()
            .get(&pid)
            .map(|p| p.exe_name.clone()))
    }

    fn exists(&self, pid: u32) -> Result<bool> {
        self.check()?;
        Ok(self.procs.lock().unwrap().contains_key(&pid))
    }

    fn elapsed_secs(&self, pid: u32) -> Result<Option<u64>> {
        self.check()?;
        Ok(self
            .procs
            .lock()
            .unwrap()
            .get(&pid)
            .map(|p| p.elapsed_secs))
    }
}
