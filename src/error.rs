//! Error types for the collection pipeline.
//!
//! None of these leave a collector: they are recorded and turned into
//! the next fallback tier. Only persistence of the combined snapshot
//! fails a cycle, and that path uses `anyhow`.

use std::fmt;

use thiserror::Error;

/// Failure category of a script execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionKind {
    /// No matching response within the execution bound.
    Timeout,
    /// Connection failed or dropped, or a frame could not be read.
    Transport,
    /// The page reported an exception while evaluating the script.
    ScriptException,
}

impl fmt::Display for ExecutionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutionKind::Timeout => "timeout",
            ExecutionKind::Transport => "transport",
            ExecutionKind::ScriptException => "script exception",
        };
        f.write_str(s)
    }
}

/// A script execution failed.
///
/// `payload` carries the raw diagnostic text (socket error, offending
/// frame, or the page's `exceptionDetails` JSON).
#[derive(Debug, Error)]
#[error("script execution failed ({kind}): {payload}")]
pub struct ExecutionError {
    pub kind: ExecutionKind,
    pub payload: String,
}

impl ExecutionError {
    pub fn timeout(payload: impl Into<String>) -> Self {
        Self {
            kind: ExecutionKind::Timeout,
            payload: payload.into(),
        }
    }

    pub fn transport(payload: impl Into<String>) -> Self {
        Self {
            kind: ExecutionKind::Transport,
            payload: payload.into(),
        }
    }

    pub fn script_exception(payload: impl Into<String>) -> Self {
        Self {
            kind: ExecutionKind::ScriptException,
            payload: payload.into(),
        }
    }
}

/// Reading a persisted snapshot failed.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("no cache file at {path}")]
    Miss { path: String },

    #[error("cache file {path} is not a valid snapshot: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("failed to read cache file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
