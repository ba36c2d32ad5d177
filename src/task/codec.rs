// src/task/codec.rs

//! Transport encoding for task envelopes.
//!
//! The envelope body (payload + time limit, never the task ID) is JSON,
//! optionally signed with a pre-shared secret, then base64-encoded so it
//! crosses a command-line boundary untouched regardless of embedded nulls
//! or control characters.
//!
//! Decoding fails closed: every malformed, mis-typed or unauthenticated
//! input becomes a typed [`DecodeError`], never a panic.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::task::{AsyncTask, TaskPayload};

/// Wire format marker; bump when the body layout changes.
pub(crate) const WIRE_FORMAT: &str = "bgtask.v1";

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("transport string is not valid base64")]
    InvalidEncoding,

    #[error("transport payload is malformed: {0}")]
    InvalidPayload(String),

    #[error("transport payload is not a bgtask envelope (found format '{0}')")]
    WrongType(String),

    #[error("transport payload failed sender verification")]
    Unauthorized,
}

#[derive(Serialize, Deserialize)]
struct Wire {
    format: String,
    body: String,
    sig: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct Body {
    payload: TaskPayload,
    time_limit: Option<u64>,
}

/// Encoder/decoder with an explicit, instance-local signing secret.
///
/// The secret is deliberately not ambient process state, so concurrent
/// tests (and multi-tenant embedders) can hold independent codecs.
#[derive(Debug, Clone, Default)]
pub struct Codec {
    secret: Option<Vec<u8>>,
}

impl Codec {
    /// A codec that neither signs nor verifies.
    pub fn new() -> Self {
        Self { secret: None }
    }

    /// A codec that signs on encode and rejects unverifiable envelopes on
    /// decode.
    pub fn with_secret(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: Some(secret.into()),
        }
    }

    /// Serialize an envelope into its transport string.
    ///
    /// The task ID is not part of the body; it travels as a separate
    /// command-line field.
    pub fn encode(&self, task: &AsyncTask) -> Result<String, serde_json::Error> {
        let body = serde_json::to_string(&Body {
            payload: task.payload().clone(),
            time_limit: task.time_limit(),
        })?;
        let sig = self.secret.as_deref().map(|key| digest_hex(key, &body));
        let wire = serde_json::to_vec(&Wire {
            format: WIRE_FORMAT.to_string(),
            body,
            sig,
        })?;
        Ok(B64.encode(wire))
    }

    /// Reconstruct an envelope from a transport string.
    pub fn decode(&self, transport: &str) -> Result<AsyncTask, DecodeError> {
        let raw = B64
            .decode(transport.trim())
            .map_err(|_| DecodeError::InvalidEncoding)?;
        let wire: Wire =
            serde_json::from_slice(&raw).map_err(|e| DecodeError::InvalidPayload(e.to_string()))?;

        if wire.format != WIRE_FORMAT {
            return Err(DecodeError::WrongType(wire.format));
        }

        if let Some(key) = self.secret.as_deref() {
            let expected = digest_hex(key, &wire.body);
            match wire.sig.as_deref() {
                Some(sig) if sig == expected => {}
                _ => return Err(DecodeError::Unauthorized),
            }
        }

        let body: Body = serde_json::from_str(&wire.body)
            .map_err(|e| DecodeError::InvalidPayload(e.to_string()))?;
        Ok(AsyncTask::from_wire(body.payload, body.time_limit))
    }
}

/// Hex keyed digest of the body: sha256(secret || body).
fn digest_hex(key: &[u8], body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.update(body.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
