//! In-memory stand-in for a server running the time-series module.
//!
//! Speaks the same `TS.*` commands and reply shapes as the real module so
//! the client can be exercised end to end without a live server. Rules are
//! recorded and reported by `TS.INFO` but not applied to incoming samples.

#![allow(dead_code)]

use parking_lot::Mutex;
use redis_tsdb::{AggregationType, Command, RespValue, Transport, TransportError, TransportFuture};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const RULE_DOES_NOT_EXIST: &str = "TSDB: compaction rule does not exist";
pub const KEY_DOES_NOT_EXIST: &str = "TSDB: the key does not exist";
pub const KEY_EXISTS: &str = "TSDB: key already exists";

struct Series {
    retention_secs: u64,
    max_samples_per_chunk: u64,
    samples: BTreeMap<i64, f64>,
    rules: Vec<(String, u64, AggregationType)>,
}

#[derive(Default)]
pub struct FakeTimeSeriesStore {
    series: Mutex<HashMap<String, Series>>,
    commands: AtomicUsize,
}

impl FakeTimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands executed so far
    pub fn command_count(&self) -> usize {
        self.commands.load(Ordering::SeqCst)
    }

    fn handle(&self, command: &Command) -> Result<RespValue, String> {
        let args = command.args();
        let mut all = self.series.lock();

        match command.name() {
            "TS.CREATE" => {
                let [key, retention, chunk] = args else {
                    return Err(wrong_arity("ts.create"));
                };
                if all.contains_key(key) {
                    return Err(KEY_EXISTS.to_string());
                }
                all.insert(
                    key.clone(),
                    Series {
                        retention_secs: parse(retention, "retentionSecs")?,
                        max_samples_per_chunk: parse(chunk, "maxSamplesPerChunk")?,
                        samples: BTreeMap::new(),
                        rules: Vec::new(),
                    },
                );
                Ok(RespValue::ok())
            }
            "TS.CREATERULE" => {
                let [source, agg, bucket, dest] = args else {
                    return Err(wrong_arity("ts.createrule"));
                };
                let aggregation = AggregationType::from_token(agg)
                    .ok_or_else(|| "TSDB: Unknown aggregation type".to_string())?;
                let bucket: u64 = parse(bucket, "bucketSizeSeconds")?;
                if !all.contains_key(dest) {
                    return Err(KEY_DOES_NOT_EXIST.to_string());
                }
                let series = all.get_mut(source).ok_or(KEY_DOES_NOT_EXIST)?;
                if series.rules.iter().any(|(d, _, _)| d == dest) {
                    return Err("TSDB: the destination key already has a rule".to_string());
                }
                series.rules.push((dest.clone(), bucket, aggregation));
                Ok(RespValue::ok())
            }
            "TS.DELETERULE" => {
                let [source, dest] = args else {
                    return Err(wrong_arity("ts.deleterule"));
                };
                let series = all.get_mut(source).ok_or(KEY_DOES_NOT_EXIST)?;
                let before = series.rules.len();
                series.rules.retain(|(d, _, _)| d != dest);
                if series.rules.len() == before {
                    return Err(RULE_DOES_NOT_EXIST.to_string());
                }
                Ok(RespValue::ok())
            }
            "TS.ADD" => {
                let [key, timestamp, value] = args else {
                    return Err(wrong_arity("ts.add"));
                };
                let series = all.get_mut(key).ok_or(KEY_DOES_NOT_EXIST)?;
                let timestamp: i64 = parse(timestamp, "timestamp")?;
                let value: f64 = parse(value, "value")?;
                if let Some((&last, _)) = series.samples.last_key_value() {
                    if timestamp < last {
                        return Err("TSDB: timestamp is too old".to_string());
                    }
                }
                series.samples.insert(timestamp, value);
                Ok(RespValue::Integer(timestamp))
            }
            "TS.RANGE" => {
                let (key, from, to, aggregation) = match args {
                    [key, from, to] => (key, from, to, None),
                    [key, from, to, agg, bucket] => {
                        let aggregation = AggregationType::from_token(agg)
                            .ok_or_else(|| "TSDB: Unknown aggregation type".to_string())?;
                        let bucket: i64 = parse(bucket, "bucketSizeSeconds")?;
                        (key, from, to, Some((aggregation, bucket)))
                    }
                    _ => return Err(wrong_arity("ts.range")),
                };
                let series = all.get(key).ok_or(KEY_DOES_NOT_EXIST)?;
                let from: i64 = parse(from, "fromTimestamp")?;
                let to: i64 = parse(to, "toTimestamp")?;
                if from > to {
                    return Ok(RespValue::empty_array());
                }
                let window = series.samples.range(from..=to).map(|(&ts, &v)| (ts, v));

                let points: Vec<(i64, f64)> = match aggregation {
                    None => window.collect(),
                    Some((aggregation, bucket)) => {
                        let mut buckets: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
                        for (ts, v) in window {
                            buckets.entry(ts - ts.rem_euclid(bucket)).or_default().push(v);
                        }
                        buckets
                            .into_iter()
                            .map(|(start, values)| (start, aggregate(aggregation, &values)))
                            .collect()
                    }
                };

                Ok(RespValue::array(
                    points
                        .into_iter()
                        .map(|(ts, v)| {
                            RespValue::array(vec![
                                RespValue::Integer(ts),
                                RespValue::bulk(v.to_string()),
                            ])
                        })
                        .collect(),
                ))
            }
            "TS.INFO" => {
                let [key] = args else {
                    return Err(wrong_arity("ts.info"));
                };
                let series = all.get(key).ok_or(KEY_DOES_NOT_EXIST)?;
                let sample_count = series.samples.len() as u64;
                let chunk_count = sample_count
                    .div_ceil(series.max_samples_per_chunk.max(1))
                    .max(1);
                let last_timestamp = series
                    .samples
                    .last_key_value()
                    .map(|(&ts, _)| ts)
                    .unwrap_or(0);
                let rules = series
                    .rules
                    .iter()
                    .map(|(dest, bucket, agg)| {
                        RespValue::array(vec![
                            RespValue::bulk(dest.as_str()),
                            RespValue::Integer(*bucket as i64),
                            RespValue::SimpleString(agg.token().to_ascii_uppercase()),
                        ])
                    })
                    .collect();

                Ok(RespValue::array(vec![
                    status("lastTimestamp"),
                    RespValue::Integer(last_timestamp),
                    status("retentionSecs"),
                    RespValue::Integer(series.retention_secs as i64),
                    status("chunkCount"),
                    RespValue::Integer(chunk_count as i64),
                    status("maxSamplesPerChunk"),
                    RespValue::Integer(series.max_samples_per_chunk as i64),
                    status("rules"),
                    RespValue::array(rules),
                ]))
            }
            other => Err(format!("ERR unknown command '{}'", other)),
        }
    }
}

impl Transport for FakeTimeSeriesStore {
    fn execute<'a>(&'a self, command: &'a Command) -> TransportFuture<'a> {
        self.commands.fetch_add(1, Ordering::SeqCst);
        let result = self.handle(command).map_err(TransportError::Server);
        Box::pin(async move { result })
    }
}

fn status(s: &str) -> RespValue {
    RespValue::SimpleString(s.to_string())
}

fn wrong_arity(command: &str) -> String {
    format!("ERR wrong number of arguments for '{}' command", command)
}

fn parse<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, String> {
    raw.parse()
        .map_err(|_| format!("TSDB: invalid {}", what))
}

fn aggregate(aggregation: AggregationType, values: &[f64]) -> f64 {
    let n = values.len() as f64;
    let sum: f64 = values.iter().sum();
    let mean = sum / n;
    let squares: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    match aggregation {
        AggregationType::Avg => mean,
        AggregationType::Sum => sum,
        AggregationType::Min => min,
        AggregationType::Max => max,
        AggregationType::Count => n,
        AggregationType::First => values[0],
        AggregationType::Last => values[values.len() - 1],
        AggregationType::Range => max - min,
        AggregationType::VarP => squares / n,
        AggregationType::VarS => squares / (n - 1.0),
        AggregationType::StdP => (squares / n).sqrt(),
        AggregationType::StdS => (squares / (n - 1.0)).sqrt(),
    }
}
