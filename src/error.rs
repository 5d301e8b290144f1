//! Error types for the unoclient library.
//!
//! Every failure surfaces as a single [`UnoError`]. The variants fall into
//! three groups:
//!
//! * **Transport**: the remote call could not be completed: connection
//!   failure, HTTP status, an XML-RPC fault raised by unoserver, a malformed
//!   response, a deadline or a cancellation. See [`UnoError::is_transport`].
//! * **I/O**: a local input could not be read or the output could not be
//!   written. The offending path is always part of the message.
//! * **Configuration**: the caller handed us something we refuse to send
//!   (empty endpoint, unsupported scheme, empty path). Raised before any
//!   request leaves the process.
//!
//! The library never retries and never recovers; errors go back to the
//! caller as they are.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, UnoError>;

/// All errors returned by the unoclient library.
#[derive(Debug, Error)]
pub enum UnoError {
    // ── Transport errors ──────────────────────────────────────────────────
    /// The HTTP request could not be sent or its body could not be read.
    #[error("Failed to reach unoserver at '{endpoint}': {reason}")]
    Connection { endpoint: String, reason: String },

    /// unoserver answered with a non-success HTTP status.
    #[error("unoserver at '{endpoint}' returned HTTP {status}")]
    HttpStatus { endpoint: String, status: u16 },

    /// The remote procedure raised an exception, surfaced as an XML-RPC fault.
    #[error("Remote call '{method}' failed (fault {code}): {message}")]
    Fault {
        method: String,
        code: i32,
        message: String,
    },

    /// The response was not a well-formed XML-RPC reply of the expected shape.
    #[error("Malformed response to '{method}': {detail}")]
    Protocol { method: String, detail: String },

    /// The call exceeded the configured deadline.
    #[error("Remote call '{method}' timed out after {elapsed_ms}ms")]
    Timeout { method: String, elapsed_ms: u64 },

    /// The call was cancelled by the caller before a response arrived.
    #[error("Remote call '{method}' was cancelled")]
    Cancelled { method: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not read a local input document.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not create or write the local output document.
    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder or argument validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl UnoError {
    /// True for failures of the remote call itself, as opposed to local I/O
    /// or configuration problems.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            UnoError::Connection { .. }
                | UnoError::HttpStatus { .. }
                | UnoError::Fault { .. }
                | UnoError::Protocol { .. }
                | UnoError::Timeout { .. }
                | UnoError::Cancelled { .. }
        )
    }

    /// Shorthand for a [`UnoError::Protocol`] error.
    pub(crate) fn protocol(method: &str, detail: impl Into<String>) -> Self {
        UnoError::Protocol {
            method: method.to_string(),
            detail: detail.into(),
        }
    }
}
