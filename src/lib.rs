//! Typed async client for the Redis time-series module.
//!
//! ```no_run
//! use redis_tsdb::{AggregationType, Client, ClientConfig};
//! use std::time::Duration;
//!
//! # async fn run() -> redis_tsdb::Result<()> {
//! let client = Client::connect(ClientConfig::new("127.0.0.1:6379"));
//! client.create_key("temp", Duration::from_secs(3600), 360).await?;
//! client.create_key("temp_avg", Duration::from_secs(3600), 360).await?;
//! client.create_rule("temp", AggregationType::Avg, 60, "temp_avg").await?;
//! client.add("temp", 1_500_000_000, 21.5).await?;
//!
//! let points = client.range("temp", 1_500_000_000, 1_500_000_060).await?;
//! let info = client.info("temp").await?;
//! # Ok(())
//! # }
//! ```

pub mod aggregation;
pub mod client;
pub mod command;
pub mod config;
pub mod decode;
pub mod error;
pub mod resp;
pub mod transport;
mod types;

pub use aggregation::AggregationType;
pub use client::Client;
pub use command::Command;
pub use config::{ClientConfig, ConfigError};
pub use error::{DecodeError, Error, Result, TransportError};
pub use resp::{RespCodec, RespValue};
pub use transport::{ScriptedTransport, TcpTransport, Transport, TransportFuture};
pub use types::{DataPoint, KeyInfo, Rule};
