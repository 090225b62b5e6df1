//! Command construction for the time-series module.
//!
//! Every public operation has one pure constructor here that turns typed
//! parameters into a command name plus ordered argument tokens:
//!
//! | Operation     | Wire form                                             |
//! |---------------|-------------------------------------------------------|
//! | `create_key`  | `TS.CREATE key retentionSecs maxSamplesPerChunk`      |
//! | `create_rule` | `TS.CREATERULE source agg bucketSizeSecs dest`        |
//! | `delete_rule` | `TS.DELETERULE source dest`                           |
//! | `add`         | `TS.ADD key timestamp value`                          |
//! | `range`       | `TS.RANGE key from to`                                |
//! | `agg_range`   | `TS.RANGE key from to agg bucketSizeSecs`             |
//! | `info`        | `TS.INFO key`                                         |
//!
//! Only two parameters are checked locally, because neither can be
//! expressed on the wire: retention must be a whole number of seconds and
//! bucket sizes must be non-zero. Everything else is left to the server.

use crate::aggregation::AggregationType;
use crate::error::{Error, Result};
use std::time::Duration;

pub const TS_CREATE: &str = "TS.CREATE";
pub const TS_CREATERULE: &str = "TS.CREATERULE";
pub const TS_DELETERULE: &str = "TS.DELETERULE";
pub const TS_ADD: &str = "TS.ADD";
pub const TS_RANGE: &str = "TS.RANGE";
pub const TS_INFO: &str = "TS.INFO";
pub const CLIENT: &str = "CLIENT";

/// A command ready to be executed by a [`Transport`](crate::Transport).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    name: &'static str,
    args: Vec<String>,
}

impl Command {
    pub fn new(name: &'static str) -> Self {
        Command {
            name,
            args: Vec::new(),
        }
    }

    /// Append one argument token
    pub fn arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Create a series with the given retention window and chunk size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `retention` has a sub-second
    /// remainder; it is never truncated or rounded.
    pub fn create_key(
        key: &str,
        retention: Duration,
        max_samples_per_chunk: u64,
    ) -> Result<Command> {
        let retention_secs = retention_to_secs(retention)?;
        Ok(Command::new(TS_CREATE)
            .arg(key)
            .arg(retention_secs)
            .arg(max_samples_per_chunk))
    }

    /// Downsample `source_key` into `dest_key`. The destination must already
    /// exist; the server enforces that.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `bucket_size_secs` is zero.
    pub fn create_rule(
        source_key: &str,
        aggregation: AggregationType,
        bucket_size_secs: u64,
        dest_key: &str,
    ) -> Result<Command> {
        check_bucket_size(bucket_size_secs)?;
        Ok(Command::new(TS_CREATERULE)
            .arg(source_key)
            .arg(aggregation.token())
            .arg(bucket_size_secs)
            .arg(dest_key))
    }

    pub fn delete_rule(source_key: &str, dest_key: &str) -> Command {
        Command::new(TS_DELETERULE).arg(source_key).arg(dest_key)
    }

    /// Append a sample. Timestamp and value are forwarded untouched; the
    /// value uses the shortest representation that parses back to the
    /// same `f64`.
    pub fn add(key: &str, timestamp: i64, value: f64) -> Command {
        Command::new(TS_ADD).arg(key).arg(timestamp).arg(value)
    }

    /// Raw samples with `from <= timestamp <= to`
    pub fn range(key: &str, from: i64, to: i64) -> Command {
        Command::new(TS_RANGE).arg(key).arg(from).arg(to)
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `bucket_size_secs` is zero.
    pub fn agg_range(
        key: &str,
        from: i64,
        to: i64,
        aggregation: AggregationType,
        bucket_size_secs: u64,
    ) -> Result<Command> {
        check_bucket_size(bucket_size_secs)?;
        Ok(Command::range(key, from, to)
            .arg(aggregation.token())
            .arg(bucket_size_secs))
    }

    pub fn info(key: &str) -> Command {
        Command::new(TS_INFO).arg(key)
    }

    /// `CLIENT SETNAME`, sent once on every new pooled connection
    pub fn client_setname(name: &str) -> Command {
        Command::new(CLIENT).arg("SETNAME").arg(name)
    }
}

fn retention_to_secs(retention: Duration) -> Result<u64> {
    if retention.subsec_nanos() != 0 {
        return Err(Error::InvalidArgument(format!(
            "retention {:?} is not a whole number of seconds",
            retention
        )));
    }
    Ok(retention.as_secs())
}

fn check_bucket_size(bucket_size_secs: u64) -> Result<()> {
    if bucket_size_secs == 0 {
        return Err(Error::InvalidArgument(
            "bucket size must be at least one second".to_string(),
        ));
    }
    Ok(())
}
