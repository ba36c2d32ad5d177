// src/config.rs

//! Environment-derived settings.
//!
//! There is no config file: the envelope itself carries per-task policy,
//! and the only process-level knobs are the transport signing secret and
//! the log level (see [`crate::logging`]).

use crate::task::codec::Codec;

/// Env var holding the optional pre-shared transport signing secret.
///
/// When set, the launcher signs every envelope and the runner rejects
/// envelopes it cannot verify. Launcher and runner must agree on it.
pub const SECRET_ENV: &str = "BGTASK_SECRET";

#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Pre-shared secret for transport authentication, if configured.
    pub secret: Option<String>,
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        let secret = std::env::var(SECRET_ENV).ok().filter(|s| !s.is_empty());
        Self { secret }
    }

    /// Build the transport codec these settings describe.
    pub fn codec(&self) -> Codec {
        match &self.secret {
            Some(secret) => Codec::with_secret(secret.as_bytes()),
            None => Codec::new(),
        }
    }
}
