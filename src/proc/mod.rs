// src/proc/mod.rs

//! Process-table queries, one strategy per OS family.
//!
//! The status tracker and the runtime guard both ask the kernel about
//! other processes. Production code goes through the OS tools behind
//! [`ProcTable`]; tests inject an in-memory table instead.
//!
//! Each method asks for exactly one property. Combining several columns
//! in one delimited query would save round trips but makes parsing
//! sensitive to localization and padding quirks of the OS tooling; query
//! count is the cheaper currency here.

#[cfg(unix)]
pub mod unix;
#[cfg(windows)]
pub mod windows;

use crate::errors::Result;

/// Minimal process-table interface for liveness tracking and timeout
/// accounting.
///
/// "Could not ask the question" (missing or broken tooling) surfaces as a
/// [`ProcQuery`](crate::errors::BgtaskError::ProcQuery) error, which is
/// distinct from a clean "process not found".
pub trait ProcTable: Send + Sync {
    /// PIDs of all live processes whose full command line contains
    /// `needle`, in the OS listing order.
    fn pids_with_cmdline(&self, needle: &str) -> Result<Vec<u32>>;

    /// Full command line of `pid`, or `None` if the process is gone.
    fn cmdline(&self, pid: u32) -> Result<Option<String>>;

    /// Executable (image) name of `pid`, or `None` if the process is gone.
    fn exe_name(&self, pid: u32) -> Result<Option<String>>;

    /// Whether `pid` is still present in the process table.
    fn exists(&self, pid: u32) -> Result<bool>;

    /// Kernel-reported elapsed running time of `pid` in whole seconds,
    /// where the platform can report it.
    fn elapsed_secs(&self, pid: u32) -> Result<Option<u64>>;
}

/// The process table of the host OS.
pub fn os_proc_table() -> Box<dyn ProcTable> {
    #[cfg(unix)]
    {
        Box::new(unix::UnixProcTable)
    }
    #[cfg(windows)]
    {
        Box::new(windows::WindowsProcTable)
    }
}
