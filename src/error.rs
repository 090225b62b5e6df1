//! Error types for the time-series client.
//!
//! Three failure classes are kept apart:
//!
//! - [`TransportError`]: the command never produced a usable reply. This
//!   includes server rejections (`-ERR ...` / `-TSDB: ...` replies), whose
//!   text is carried verbatim.
//! - [`DecodeError`]: a reply arrived but its shape did not match what the
//!   operation expects. Every variant names the field or position that failed.
//! - [`Error::InvalidArgument`]: the call was rejected before anything was sent.

use std::io;
use thiserror::Error;

/// Result alias used by the client facade.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error returned by every [`Client`](crate::Client) operation.
#[derive(Debug, Error)]
pub enum Error {
    /// Connection, protocol, or server-side failure
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The reply did not have the expected shape
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
    /// The caller passed a parameter that cannot be put on the wire
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// The server's error text, if the store rejected the command.
    ///
    /// ```
    /// use redis_tsdb::{Error, TransportError};
    ///
    /// let message = "TSDB: compaction rule does not exist";
    /// let err = Error::from(TransportError::Server(message.to_string()));
    /// assert_eq!(err.server_message(), Some(message));
    /// ```
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Error::Transport(TransportError::Server(message)) => Some(message),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, Error::Decode(_))
    }
}

/// Failure to execute a command against the store.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Error reply from the server. Displayed exactly as the server sent it.
    #[error("{0}")]
    Server(String),
    /// Socket-level failure
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// Bytes on the wire were not valid RESP
    #[error("protocol error: {0}")]
    Protocol(String),
    /// The peer closed the connection before replying
    #[error("connection closed")]
    ConnectionClosed,
    /// Connecting took longer than the configured timeout
    #[error("timed out connecting to {0}")]
    ConnectTimeout(String),
    /// The transport was shut down
    #[error("connection pool closed")]
    PoolClosed,
}

/// A reply whose structure did not match the operation's expectations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("{field}: expected {expected}, got {found}")]
    UnexpectedType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("{field}: expected {expected} elements, got {found}")]
    WrongArity {
        field: String,
        expected: usize,
        found: usize,
    },
    #[error("missing field `{field}`")]
    MissingField { field: String },
    #[error("field `{field}` has no value")]
    DanglingField { field: String },
    #[error("{field}: `{value}` is not numeric")]
    NotNumeric { field: String, value: String },
    #[error("{field}: {value} is out of range")]
    OutOfRange { field: String, value: i64 },
    #[error("{field}: unknown aggregation type `{token}`")]
    UnknownAggregation { field: String, token: String },
}
