//! Reply decoding.
//!
//! One hand-written function per target type. Each checks the reply's shape
//! before looking at its contents and reports failures as [`DecodeError`]
//! naming the offending field or position (`rules[1].aggregation`,
//! `points[7].value`, ...).
//!
//! Numeric fields are accepted either as RESP integers or as numeric text,
//! since module versions differ in which they send. Nothing else is coerced.

use crate::aggregation::AggregationType;
use crate::error::DecodeError;
use crate::resp::RespValue;
use crate::types::{DataPoint, KeyInfo, Rule};
use std::collections::HashMap;
use std::fmt;

pub const LAST_TIMESTAMP: &str = "lastTimestamp";
pub const RETENTION_SECS: &str = "retentionSecs";
pub const CHUNK_COUNT: &str = "chunkCount";
pub const MAX_SAMPLES_PER_CHUNK: &str = "maxSamplesPerChunk";
pub const RULES: &str = "rules";

const INFO: &str = "TS.INFO";
const POINTS: &str = "points";

/// Position inside a nested reply, rendered only when an error is built
#[derive(Clone, Copy)]
struct Path<'a> {
    parent: &'a str,
    index: usize,
    member: Option<&'static str>,
}

impl<'a> Path<'a> {
    fn new(parent: &'a str, index: usize) -> Self {
        Path {
            parent,
            index,
            member: None,
        }
    }

    fn member(self, member: &'static str) -> Self {
        Path {
            member: Some(member),
            ..self
        }
    }
}

impl fmt::Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.member {
            Some(member) => write!(f, "{}[{}].{}", self.parent, self.index, member),
            None => write!(f, "{}[{}]", self.parent, self.index),
        }
    }
}

/// Reply to a write command (`TS.CREATE`, `TS.CREATERULE`, `TS.DELETERULE`,
/// `TS.ADD`). Any status, integer, or bulk string counts as success.
pub fn decode_status(reply: &RespValue) -> Result<(), DecodeError> {
    match reply {
        RespValue::SimpleString(_) | RespValue::Integer(_) | RespValue::BulkString(Some(_)) => {
            Ok(())
        }
        other => Err(unexpected(&"reply", "status or integer", other)),
    }
}

/// `TS.INFO` reply: alternating field names and values, rules last.
///
/// Unknown fields are skipped so that servers reporting extra metadata
/// still decode.
pub fn decode_key_info(reply: &RespValue) -> Result<KeyInfo, DecodeError> {
    let entries = expect_array(reply, &INFO)?;
    if entries.len() % 2 != 0 {
        let field = entries
            .last()
            .and_then(|last| text(last, &INFO).ok())
            .unwrap_or("?");
        return Err(DecodeError::DanglingField {
            field: field.to_string(),
        });
    }

    let mut fields: HashMap<&str, &RespValue> = HashMap::with_capacity(entries.len() / 2);
    for (index, pair) in entries.chunks_exact(2).enumerate() {
        let name = text(&pair[0], &Path::new(INFO, index * 2))?;
        fields.insert(name, &pair[1]);
    }

    let field = |name: &'static str| {
        fields
            .get(name)
            .copied()
            .ok_or_else(|| DecodeError::MissingField {
                field: name.to_string(),
            })
    };

    Ok(KeyInfo {
        chunk_count: unsigned(field(CHUNK_COUNT)?, &CHUNK_COUNT)?,
        max_samples_per_chunk: unsigned(field(MAX_SAMPLES_PER_CHUNK)?, &MAX_SAMPLES_PER_CHUNK)?,
        last_timestamp: integer(field(LAST_TIMESTAMP)?, &LAST_TIMESTAMP)?,
        retention_secs: unsigned(field(RETENTION_SECS)?, &RETENTION_SECS)?,
        rules: decode_rules(field(RULES)?)?,
    })
}

/// The rules sub-array of `TS.INFO`: one `[dest, bucketSizeSecs, agg]`
/// array per rule, in server order.
pub fn decode_rules(reply: &RespValue) -> Result<Vec<Rule>, DecodeError> {
    let entries = expect_array(reply, &RULES)?;
    let mut rules = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let at = Path::new(RULES, index);
        let parts = expect_array(entry, &at)?;
        if parts.len() != 3 {
            return Err(DecodeError::WrongArity {
                field: at.to_string(),
                expected: 3,
                found: parts.len(),
            });
        }

        let dest_key = text(&parts[0], &at.member("dest_key"))?.to_string();

        let bucket_at = at.member("bucket_size_secs");
        let bucket_size_secs = unsigned(&parts[1], &bucket_at)?;
        if bucket_size_secs == 0 {
            return Err(DecodeError::OutOfRange {
                field: bucket_at.to_string(),
                value: 0,
            });
        }

        let agg_at = at.member("aggregation");
        let token = text(&parts[2], &agg_at)?;
        let aggregation =
            AggregationType::from_token(token).ok_or_else(|| DecodeError::UnknownAggregation {
                field: agg_at.to_string(),
                token: token.to_string(),
            })?;

        rules.push(Rule {
            dest_key,
            bucket_size_secs,
            aggregation,
        });
    }

    Ok(rules)
}

/// `TS.RANGE` reply: `[timestamp, value]` pairs in server order. An empty
/// or nil array is an empty result.
pub fn decode_data_points(reply: &RespValue) -> Result<Vec<DataPoint>, DecodeError> {
    if let RespValue::Array(None) = reply {
        return Ok(Vec::new());
    }
    let entries = expect_array(reply, &POINTS)?;
    let mut points = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        let at = Path::new(POINTS, index);
        let parts = expect_array(entry, &at)?;
        if parts.len() != 2 {
            return Err(DecodeError::WrongArity {
                field: at.to_string(),
                expected: 2,
                found: parts.len(),
            });
        }

        points.push(DataPoint {
            timestamp: integer(&parts[0], &at.member("timestamp"))?,
            value: float(&parts[1], &at.member("value"))?,
        });
    }

    Ok(points)
}

fn unexpected(field: &dyn fmt::Display, expected: &'static str, found: &RespValue) -> DecodeError {
    DecodeError::UnexpectedType {
        field: field.to_string(),
        expected,
        found: found.kind(),
    }
}

fn expect_array<'a>(
    value: &'a RespValue,
    field: &dyn fmt::Display,
) -> Result<&'a [RespValue], DecodeError> {
    match value {
        RespValue::Array(Some(elements)) => Ok(elements),
        other => Err(unexpected(field, "array", other)),
    }
}

fn text<'a>(value: &'a RespValue, field: &dyn fmt::Display) -> Result<&'a str, DecodeError> {
    match value {
        RespValue::SimpleString(s) => Ok(s),
        RespValue::BulkString(Some(data)) => {
            std::str::from_utf8(data).map_err(|_| unexpected(field, "UTF-8 text", value))
        }
        other => Err(unexpected(field, "string", other)),
    }
}

fn integer(value: &RespValue, field: &dyn fmt::Display) -> Result<i64, DecodeError> {
    match value {
        RespValue::Integer(n) => Ok(*n),
        RespValue::SimpleString(_) | RespValue::BulkString(Some(_)) => {
            let raw = text(value, field)?;
            raw.parse::<i64>().map_err(|_| DecodeError::NotNumeric {
                field: field.to_string(),
                value: raw.to_string(),
            })
        }
        other => Err(unexpected(field, "integer", other)),
    }
}

fn unsigned(value: &RespValue, field: &dyn fmt::Display) -> Result<u64, DecodeError> {
    let n = integer(value, field)?;
    u64::try_from(n).map_err(|_| DecodeError::OutOfRange {
        field: field.to_string(),
        value: n,
    })
}

fn float(value: &RespValue, field: &dyn fmt::Display) -> Result<f64, DecodeError> {
    match value {
        RespValue::Integer(n) => Ok(*n as f64),
        RespValue::SimpleString(_) | RespValue::BulkString(Some(_)) => {
            let raw = text(value, field)?;
            raw.parse::<f64>().map_err(|_| DecodeError::NotNumeric {
                field: field.to_string(),
                value: raw.to_string(),
            })
        }
        other => Err(unexpected(field, "number", other)),
    }
}
