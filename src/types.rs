//! Domain values decoded from store replies

use crate::aggregation::AggregationType;
use serde::{Deserialize, Serialize};

/// Compaction rule from a source key into `dest_key`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rule {
    pub dest_key: String,
    /// Bucket width in seconds, always >= 1
    pub bucket_size_secs: u64,
    pub aggregation: AggregationType,
}

/// Metadata reported by `TS.INFO`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KeyInfo {
    pub chunk_count: u64,
    pub max_samples_per_chunk: u64,
    /// Unix seconds of the newest sample, 0 if the key is empty
    pub last_timestamp: i64,
    pub retention_secs: u64,
    /// Rules in the order the server reported them
    pub rules: Vec<Rule>,
}

/// One sample of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Unix seconds
    pub timestamp: i64,
    pub value: f64,
}

impl DataPoint {
    pub fn new(timestamp: i64, value: f64) -> Self {
        DataPoint { timestamp, value }
    }
}
