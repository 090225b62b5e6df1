//! Transport abstraction.
//!
//! The client only needs one capability from the outside world: execute a
//! command and hand back the untyped reply. Implementations:
//! - `TcpTransport`: pooled RESP connections over TCP
//! - `ScriptedTransport`: canned replies for tests

mod scripted;
mod tcp;

pub use scripted::ScriptedTransport;
pub use tcp::TcpTransport;

use crate::command::Command;
use crate::error::TransportError;
use crate::resp::RespValue;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by [`Transport::execute`]
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<RespValue, TransportError>> + Send + 'a>>;

/// Executes commands against the store.
///
/// Error replies must be returned as [`TransportError::Server`] with the
/// server's text untouched, never as `Ok(RespValue::Error(_))`.
pub trait Transport: Send + Sync {
    fn execute<'a>(&'a self, command: &'a Command) -> TransportFuture<'a>;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute<'a>(&'a self, command: &'a Command) -> TransportFuture<'a> {
        (**self).execute(command)
    }
}

/// Turn a top-level error reply into a transport error
pub(crate) fn server_error(reply: RespValue) -> Result<RespValue, TransportError> {
    match reply {
        RespValue::Error(message) => Err(TransportError::Server(message)),
        other => Ok(other),
    }
}
