use super::{server_error, Transport, TransportFuture};
use crate::command::Command;
use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::resp::{RespCodec, RespValue};
use crossbeam::queue::ArrayQueue;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

type Connection = Framed<TcpStream, RespCodec>;

/// Pooled RESP-over-TCP transport.
///
/// Each call checks out its own connection, so concurrent calls never share
/// a socket. Connections are opened lazily and returned to a bounded idle
/// queue afterwards; a connection that hit an I/O or protocol error is
/// dropped instead. Server error replies leave the connection usable.
pub struct TcpTransport {
    config: ClientConfig,
    idle: ArrayQueue<Connection>,
    permits: Semaphore,
}

impl TcpTransport {
    pub fn new(config: ClientConfig) -> Self {
        TcpTransport {
            idle: ArrayQueue::new(config.idle_connections.max(1)),
            permits: Semaphore::new(config.max_connections.max(1)),
            config,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Number of connections waiting in the idle queue
    pub fn idle_connections(&self) -> usize {
        self.idle.len()
    }

    /// Stop accepting calls and drop idle connections. Calls already in
    /// flight finish normally.
    pub fn close(&self) {
        self.permits.close();
        while self.idle.pop().is_some() {}
    }

    async fn checkout(&self) -> Result<Connection, TransportError> {
        match self.idle.pop() {
            Some(conn) => Ok(conn),
            None => self.connect().await,
        }
    }

    fn checkin(&self, conn: Connection) {
        if self.permits.is_closed() {
            debug!("Transport closed, dropping connection to {}", self.config.addr);
            return;
        }
        if self.idle.push(conn).is_err() {
            debug!("Idle queue full, closing connection to {}", self.config.addr);
        }
        // close() may have drained the queue between the check and the push
        if self.permits.is_closed() {
            while self.idle.pop().is_some() {}
        }
    }

    async fn connect(&self) -> Result<Connection, TransportError> {
        let addr = &self.config.addr;
        let stream = tokio::time::timeout(self.config.connect_timeout(), TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::ConnectTimeout(addr.clone()))??;
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY on {}: {}", addr, e);
        }
        info!("Connected to {}", addr);

        let mut conn = Framed::new(stream, RespCodec::new());
        if let Some(name) = &self.config.client_name {
            round_trip(&mut conn, &Command::client_setname(name))
                .await
                .and_then(server_error)?;
        }
        Ok(conn)
    }
}

async fn round_trip(conn: &mut Connection, command: &Command) -> Result<RespValue, TransportError> {
    conn.send(command).await?;
    match conn.next().await {
        Some(reply) => reply,
        None => Err(TransportError::ConnectionClosed),
    }
}

impl Transport for TcpTransport {
    fn execute<'a>(&'a self, command: &'a Command) -> TransportFuture<'a> {
        Box::pin(async move {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|_| TransportError::PoolClosed)?;
            let mut conn = self.checkout().await?;

            match round_trip(&mut conn, command).await {
                Ok(reply) => {
                    self.checkin(conn);
                    server_error(reply)
                }
                Err(e) => {
                    warn!("Discarding connection to {}: {}", self.config.addr, e);
                    Err(e)
                }
            }
        })
    }
}

impl std::fmt::Debug for TcpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpTransport")
            .field("addr", &self.config.addr)
            .field("idle", &self.idle.len())
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}
