//! Typed client facade.
//!
//! Every operation is one independent round trip: build the command, hand it
//! to the transport, decode the reply. Transport errors are returned as they
//! came; nothing is retried or cached.

use crate::aggregation::AggregationType;
use crate::command::Command;
use crate::config::ClientConfig;
use crate::decode::{decode_data_points, decode_key_info, decode_status};
use crate::error::Result;
use crate::resp::RespValue;
use crate::transport::{TcpTransport, Transport};
use crate::types::{DataPoint, KeyInfo};
use std::time::Duration;
use tracing::debug;

/// Client for the time-series module.
///
/// `Client` is `Send + Sync` whenever its transport is, and every method
/// takes `&self`, so one instance can be shared across tasks.
#[derive(Debug)]
pub struct Client<T = TcpTransport> {
    transport: T,
}

impl Client<TcpTransport> {
    /// Client over a pooled TCP transport. Connections are opened on first
    /// use, so this never fails.
    pub fn connect(config: ClientConfig) -> Self {
        Client::new(TcpTransport::new(config))
    }
}

impl<T: Transport> Client<T> {
    pub fn new(transport: T) -> Self {
        Client { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    async fn execute(&self, command: &Command) -> Result<RespValue> {
        debug!("{} {:?}", command.name(), command.args());
        let reply = self.transport.execute(command).await?;
        debug!("{} reply: {}", command.name(), reply.kind());
        Ok(reply)
    }

    /// Create `key` with the given retention window and chunk size.
    ///
    /// Retention must be a whole number of seconds; anything else is
    /// rejected before it reaches the server.
    pub async fn create_key(
        &self,
        key: &str,
        retention: Duration,
        max_samples_per_chunk: u64,
    ) -> Result<()> {
        let command = Command::create_key(key, retention, max_samples_per_chunk)?;
        let reply = self.execute(&command).await?;
        Ok(decode_status(&reply)?)
    }

    /// Downsample `source_key` into the existing `dest_key`.
    pub async fn create_rule(
        &self,
        source_key: &str,
        aggregation: AggregationType,
        bucket_size_secs: u64,
        dest_key: &str,
    ) -> Result<()> {
        let command = Command::create_rule(source_key, aggregation, bucket_size_secs, dest_key)?;
        let reply = self.execute(&command).await?;
        Ok(decode_status(&reply)?)
    }

    /// Remove the rule from `source_key` to `dest_key`. If there is none the
    /// server's `TSDB: compaction rule does not exist` error is returned.
    pub async fn delete_rule(&self, source_key: &str, dest_key: &str) -> Result<()> {
        let reply = self
            .execute(&Command::delete_rule(source_key, dest_key))
            .await?;
        Ok(decode_status(&reply)?)
    }

    /// Append a sample
    pub async fn add(&self, key: &str, timestamp: i64, value: f64) -> Result<()> {
        let reply = self.execute(&Command::add(key, timestamp, value)).await?;
        Ok(decode_status(&reply)?)
    }

    /// Samples with `from <= timestamp <= to`, oldest first
    pub async fn range(&self, key: &str, from: i64, to: i64) -> Result<Vec<DataPoint>> {
        let reply = self.execute(&Command::range(key, from, to)).await?;
        Ok(decode_data_points(&reply)?)
    }

    /// Samples in `[from, to]` aggregated into buckets of
    /// `bucket_size_secs` by the server
    pub async fn agg_range(
        &self,
        key: &str,
        from: i64,
        to: i64,
        aggregation: AggregationType,
        bucket_size_secs: u64,
    ) -> Result<Vec<DataPoint>> {
        let command = Command::agg_range(key, from, to, aggregation, bucket_size_secs)?;
        let reply = self.execute(&command).await?;
        Ok(decode_data_points(&reply)?)
    }

    pub async fn info(&self, key: &str) -> Result<KeyInfo> {
        let reply = self.execute(&Command::info(key)).await?;
        Ok(decode_key_info(&reply)?)
    }
}
