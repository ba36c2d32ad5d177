// src/errors.rs

//! Crate-wide error types.

use thiserror::Error;

use crate::task::codec::DecodeError;
use crate::task::handler::RegistryError;

#[derive(Error, Debug)]
pub enum BgtaskError {
    #[error("task IDs cannot be blank")]
    BlankTaskId,

    #[error("a time limit was requested, but no kill-after-timeout helper (timeout/gtimeout) was found on PATH")]
    MissingTimeoutHelper,

    #[error("time limit must be positive (use without_time_limit() to disable it)")]
    InvalidTimeLimit,

    #[error("failed to spawn detached runner: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("process table query failed: {0}")]
    ProcQuery(String),

    #[error("task payload could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BgtaskError>;
