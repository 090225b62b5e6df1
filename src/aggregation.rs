//! Aggregation types understood by the time-series module.

use crate::error::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Aggregation applied when downsampling into buckets, either by a
/// compaction rule or by an aggregated range query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationType {
    #[serde(rename = "avg")]
    Avg,
    #[serde(rename = "sum")]
    Sum,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "max")]
    Max,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "first")]
    First,
    #[serde(rename = "last")]
    Last,
    /// Population standard deviation
    #[serde(rename = "std.p")]
    StdP,
    /// Sample standard deviation
    #[serde(rename = "std.s")]
    StdS,
    /// Population variance
    #[serde(rename = "var.p")]
    VarP,
    /// Sample variance
    #[serde(rename = "var.s")]
    VarS,
    /// Difference between max and min
    #[serde(rename = "range")]
    Range,
}

impl AggregationType {
    /// Every aggregation type, in declaration order.
    pub const ALL: [AggregationType; 12] = [
        AggregationType::Avg,
        AggregationType::Sum,
        AggregationType::Min,
        AggregationType::Max,
        AggregationType::Count,
        AggregationType::First,
        AggregationType::Last,
        AggregationType::StdP,
        AggregationType::StdS,
        AggregationType::VarP,
        AggregationType::VarS,
        AggregationType::Range,
    ];

    /// Canonical wire token sent in commands
    pub fn token(self) -> &'static str {
        match self {
            AggregationType::Avg => "avg",
            AggregationType::Sum => "sum",
            AggregationType::Min => "min",
            AggregationType::Max => "max",
            AggregationType::Count => "count",
            AggregationType::First => "first",
            AggregationType::Last => "last",
            AggregationType::StdP => "std.p",
            AggregationType::StdS => "std.s",
            AggregationType::VarP => "var.p",
            AggregationType::VarS => "var.s",
            AggregationType::Range => "range",
        }
    }

    /// Resolve a wire token. The server reports tokens upper-case
    /// (`AVG`, `STD.P`), so matching ignores ASCII case.
    pub fn from_token(token: &str) -> Option<AggregationType> {
        match token.to_ascii_lowercase().as_str() {
            "avg" => Some(AggregationType::Avg),
            "sum" => Some(AggregationType::Sum),
            "min" => Some(AggregationType::Min),
            "max" => Some(AggregationType::Max),
            "count" => Some(AggregationType::Count),
            "first" => Some(AggregationType::First),
            "last" => Some(AggregationType::Last),
            "std.p" => Some(AggregationType::StdP),
            "std.s" => Some(AggregationType::StdS),
            "var.p" => Some(AggregationType::VarP),
            "var.s" => Some(AggregationType::VarS),
            "range" => Some(AggregationType::Range),
            _ => None,
        }
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for AggregationType {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AggregationType::from_token(s).ok_or_else(|| DecodeError::UnknownAggregation {
            field: "aggregation".to_string(),
            token: s.to_string(),
        })
    }
}
