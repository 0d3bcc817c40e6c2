//! Payload documents - YAML → Payload
//!
//! ```yaml
//! entries:
//!   p1: 1                                      # immediate value
//!   p2: { value: 2, delay_ms: 10 }             # deferred value
//!   p3: { reject: "timeout", delay_ms: 20 }    # deferred rejection
//!   p4: { inject: [p2], op: sum, add: 1 }      # dependent producer
//! ```
//!
//! Built-in ops: `sum`, `concat`, `collect`, `fail`. Every producer may carry
//! `delay_ms`. Objects without `inject`, or other than exactly `value`/`reject`
//! plus `delay_ms`, are plain values.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{Rejection, Result, StagehandError};
use crate::payload::{deferred, inject, ready, Args, Entry, Outcome, Payload};

/// Parsed document: ordered raw entries
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PayloadDocument {
    #[serde(default)]
    pub entries: IndexMap<String, Value>,
}

/// Built-in producer operation
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// Numeric sum of every argument plus `add`; `null` counts as zero
    Sum { add: f64 },
    /// String arguments joined with `sep`; other values use their JSON text
    Concat { sep: String },
    /// Array of every argument
    Collect,
    /// Reject with `message`
    Fail { message: String },
}

impl Op {
    pub fn apply(&self, args: &Args) -> Outcome {
        match self {
            Op::Sum { add } => {
                let mut total = *add;
                for (index, value) in args.iter().enumerate() {
                    total += match value {
                        Value::Null => 0.0,
                        other => other.as_f64().ok_or_else(|| {
                            Rejection::from(format!("sum: argument {} is not a number", index))
                        })?,
                    };
                }
                Ok(number(total))
            }
            Op::Concat { sep } => {
                let parts: Vec<String> = args
                    .iter()
                    .map(|value| match value {
                        Value::String(s) => s.clone(),
                        Value::Null => String::new(),
                        other => other.to_string(),
                    })
                    .collect();
                Ok(Value::String(parts.join(sep)))
            }
            Op::Collect => Ok(Value::Array(args.as_slice().to_vec())),
            Op::Fail { message } => Err(Rejection::from(message.as_str())),
        }
    }
}

/// Integral sums stay integers
fn number(total: f64) -> Value {
    if total.fract() == 0.0 && total.abs() < i64::MAX as f64 {
        Value::from(total as i64)
    } else {
        serde_json::Number::from_f64(total)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProducerSpec {
    inject: Vec<String>,
    op: String,
    #[serde(default)]
    add: Option<f64>,
    #[serde(default)]
    sep: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    delay_ms: Option<u64>,
}

impl PayloadDocument {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| StagehandError::ParseError {
            details: e.to_string(),
        })
    }

    /// Build the payload, validating every producer entry
    pub fn into_payload(self) -> Result<Payload> {
        let mut payload = Payload::with_capacity(self.entries.len());
        for (key, raw) in self.entries {
            let entry = build_entry(&key, raw)?;
            payload.insert(key, entry);
        }
        Ok(payload)
    }
}

fn build_entry(key: &str, raw: Value) -> Result<Entry> {
    let Value::Object(map) = raw else {
        return Ok(ready(raw));
    };

    if map.contains_key("inject") {
        return build_producer(key, map);
    }

    match deferred_parts(&map) {
        Some((outcome, delay)) => Ok(deferred(async move {
            tokio::time::sleep(delay).await;
            outcome
        })),
        None => Ok(ready(Value::Object(map))),
    }
}

/// `{value, delay_ms}` or `{reject, delay_ms}`
fn deferred_parts(map: &Map<String, Value>) -> Option<(Outcome, Duration)> {
    if map.len() != 2 {
        return None;
    }
    let delay = Duration::from_millis(map.get("delay_ms")?.as_u64()?);
    if let Some(value) = map.get("value") {
        return Some((Ok(value.clone()), delay));
    }
    map.get("reject")
        .map(|reason| (Err(Rejection::new(reason.clone())), delay))
}

fn build_producer(key: &str, map: Map<String, Value>) -> Result<Entry> {
    let spec: ProducerSpec =
        serde_json::from_value(Value::Object(map)).map_err(|e| StagehandError::InvalidDocument {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

    let op = match spec.op.as_str() {
        "sum" => Op::Sum {
            add: spec.add.unwrap_or(0.0),
        },
        "concat" => Op::Concat {
            sep: spec.sep.unwrap_or_default(),
        },
        "collect" => Op::Collect,
        "fail" => Op::Fail {
            message: spec.message.unwrap_or_else(|| format!("{} failed", key)),
        },
        other => {
            return Err(StagehandError::UnknownOp {
                key: key.to_string(),
                op: other.to_string(),
            })
        }
    };

    let op = Arc::new(op);
    let delay = spec.delay_ms.map(Duration::from_millis);
    Ok(inject(move |args: Args| {
        let op = Arc::clone(&op);
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            op.apply(&args)
        }
    })
    .on(&spec.inject))
}
