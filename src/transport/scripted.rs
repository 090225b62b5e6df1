use super::{server_error, Transport, TransportFuture};
use crate::command::Command;
use crate::error::TransportError;
use crate::resp::RespValue;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Transport that answers from a queue of canned replies and records every
/// command it was asked to run.
///
/// Replies are consumed in FIFO order. Once the queue is empty every call
/// fails with [`TransportError::ConnectionClosed`].
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Result<RespValue, TransportError>>>,
    sent: Mutex<Vec<Command>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_replies(replies: impl IntoIterator<Item = RespValue>) -> Self {
        let transport = Self::new();
        for reply in replies {
            transport.push_reply(reply);
        }
        transport
    }

    /// Queue a reply. `RespValue::Error` is delivered as a server error,
    /// the same way the TCP transport does.
    pub fn push_reply(&self, reply: RespValue) {
        self.replies.lock().push_back(server_error(reply));
    }

    /// Queue a transport failure
    pub fn push_error(&self, error: TransportError) {
        self.replies.lock().push_back(Err(error));
    }

    /// Commands executed so far, oldest first
    pub fn sent(&self) -> Vec<Command> {
        self.sent.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }
}

impl Transport for ScriptedTransport {
    fn execute<'a>(&'a self, command: &'a Command) -> TransportFuture<'a> {
        Box::pin(async move {
            self.sent.lock().push(command.clone());
            self.replies
                .lock()
                .pop_front()
                .unwrap_or(Err(TransportError::ConnectionClosed))
        })
    }
}
