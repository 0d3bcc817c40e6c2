//! Payload Module - named entries awaiting resolution
//!
//! A payload maps keys to [`Entry`] values. Each entry is one of:
//! - `Ready`: an immediate plain value
//! - `Deferred`: a promise-like future producing a value
//! - `Dependent`: a producer tagged with the keys it needs (see [`inject`])
//!
//! ```text
//! Payload { p1: Ready(1), p2: Deferred(..), p3: Dependent([p2], f) }
//!                          │
//!                          ▼ Resolver::run
//! Resolved { p1: 1, p2: <p2>, p3: f(<p2>) }
//! ```

mod inject;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

pub use inject::{get_deps, has_deps, inject, inject_fn, DepVec, Dependent, Injector, Producer};

use crate::error::Rejection;

/// Outcome of one asynchronous entry
pub type Outcome = std::result::Result<Value, Rejection>;

/// A boxed future producing an [`Outcome`]
pub type Pending = BoxFuture<'static, Outcome>;

/// Positional arguments handed to a dependent producer.
///
/// Resolved dependency values come first, in declaration order, followed by
/// the extra arguments given to the resolver.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(Vec<Value>);

static NULL: Value = Value::Null;

impl Args {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    /// Argument at `index`, or `Null` when absent
    pub fn get(&self, index: usize) -> &Value {
        self.0.get(index).unwrap_or(&NULL)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }
}

impl From<Vec<Value>> for Args {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

impl<'a> IntoIterator for &'a Args {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// One named slot of a payload
pub enum Entry {
    /// Immediate plain value
    Ready(Value),
    /// Promise-like value
    Deferred(Pending),
    /// Producer fed with the resolved values of its dependencies
    Dependent(Dependent),
}

impl Entry {
    /// True for dependent producers
    pub fn is_callable(&self) -> bool {
        matches!(self, Entry::Dependent(_))
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Entry::Ready(_))
    }

    /// True for promise-like entries
    pub fn is_deferred(&self) -> bool {
        matches!(self, Entry::Deferred(_))
    }

    fn kind(&self) -> &'static str {
        match self {
            Entry::Ready(_) => "ready",
            Entry::Deferred(_) => "deferred",
            Entry::Dependent(_) => "dependent",
        }
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Entry::Ready(value) => f.debug_tuple("Ready").field(value).finish(),
            Entry::Deferred(_) => f.write_str("Deferred(..)"),
            Entry::Dependent(dependent) => f.debug_tuple("Dependent").field(dependent).finish(),
        }
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Entry::Ready(value)
    }
}

impl From<Dependent> for Entry {
    fn from(dependent: Dependent) -> Self {
        Entry::Dependent(dependent)
    }
}

/// Immediate entry
pub fn ready(value: impl Into<Value>) -> Entry {
    Entry::Ready(value.into())
}

/// Promise-like entry driven by `future`
pub fn deferred<F>(future: F) -> Entry
where
    F: Future<Output = Outcome> + Send + 'static,
{
    Entry::Deferred(future.boxed())
}

/// Promise-like entry that fails with `reason`
pub fn reject(reason: impl Into<Rejection>) -> Entry {
    let reason = reason.into();
    Entry::Deferred(futures::future::ready(Err(reason)).boxed())
}

/// Ordered mapping of entry keys to entries
#[derive(Debug, Default)]
pub struct Payload {
    entries: IndexMap<Arc<str>, Entry>,
}

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(capacity),
        }
    }

    /// Insert an entry, returning the one previously stored under `key`
    pub fn insert(&mut self, key: impl Into<Arc<str>>, entry: Entry) -> Option<Entry> {
        self.entries.insert(key.into(), entry)
    }

    /// Builder form of [`Payload::insert`]
    pub fn with(mut self, key: impl Into<Arc<str>>, entry: Entry) -> Self {
        self.insert(key, entry);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in insertion order
    pub fn keys(&self) -> impl Iterator<Item = &Arc<str>> {
        self.entries.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Entry)> {
        self.entries.iter()
    }

    /// At least one entry is promise-like
    pub fn contains_deferred(&self) -> bool {
        self.entries.values().any(Entry::is_deferred)
    }

    /// At least one entry needs the resolver (deferred or dependent)
    pub fn needs_resolution(&self) -> bool {
        self.entries.values().any(|e| !e.is_ready())
    }

    /// Copy of the ready entries as a JSON object
    pub fn ready_values(&self) -> Value {
        let map = self
            .entries
            .iter()
            .filter_map(|(key, entry)| match entry {
                Entry::Ready(value) => Some((key.to_string(), value.clone())),
                _ => None,
            })
            .collect();
        Value::Object(map)
    }

    /// Plain values as a JSON object; entries that are not ready are skipped
    pub fn into_value(self) -> Value {
        let map = self
            .entries
            .into_iter()
            .filter_map(|(key, entry)| match entry {
                Entry::Ready(value) => Some((key.to_string(), value)),
                other => {
                    tracing::debug!(key = %key, kind = other.kind(), "skipping unresolved entry");
                    None
                }
            })
            .collect();
        Value::Object(map)
    }

    pub(crate) fn into_entries(self) -> IndexMap<Arc<str>, Entry> {
        self.entries
    }
}

impl<K: Into<Arc<str>>> FromIterator<(K, Entry)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, Entry)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, e)| (k.into(), e)).collect(),
        }
    }
}

/// Fully resolved payload: every key maps to a plain value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Resolved {
    values: IndexMap<Arc<str>, Value>,
}

impl Resolved {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Arc<str>> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &Value)> {
        self.values.iter()
    }

    /// New snapshot holding this one's values plus `stage`
    pub(crate) fn merged(&self, stage: Vec<(Arc<str>, Value)>) -> Self {
        let mut values = self.values.clone();
        values.extend(stage);
        Self { values }
    }

    /// Reorder to follow `order`; keys missing from the snapshot are skipped
    pub(crate) fn ordered(mut self, order: &[Arc<str>]) -> Self {
        let values = order
            .iter()
            .filter_map(|key| self.values.swap_remove_entry(key.as_ref()))
            .collect();
        Self { values }
    }

    pub fn into_value(self) -> Value {
        Value::Object(
            self.values
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

impl From<Resolved> for Value {
    fn from(resolved: Resolved) -> Self {
        resolved.into_value()
    }
}

impl<K: Into<Arc<str>>> FromIterator<(K, Value)> for Resolved {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn args_get_out_of_range_is_null() {
        let args = Args::new(vec![json!(1)]);
        assert_eq!(args.get(0), &json!(1));
        assert_eq!(args.get(3), &Value::Null);
    }

    #[test]
    fn entry_predicates() {
        let plain = ready(1);
        let promise = deferred(async { Ok(json!(2)) });
        let producer = inject_fn(|_| Ok(json!(3))).on(["p1"]);

        assert!(plain.is_ready() && !plain.is_callable() && !plain.is_deferred());
        assert!(promise.is_deferred() && !promise.is_ready());
        assert!(producer.is_callable() && !producer.is_deferred());
    }

    #[test]
    fn contains_deferred_only_counts_promises() {
        let plain = Payload::new()
            .with("a", ready(1))
            .with("b", inject_fn(|_| Ok(Value::Null)).on(["a"]));
        assert!(!plain.contains_deferred());
        assert!(plain.needs_resolution());

        let async_payload = Payload::new().with("a", deferred(async { Ok(json!(1)) }));
        assert!(async_payload.contains_deferred());
    }

    #[test]
    fn ready_payload_needs_no_resolution() {
        let payload = Payload::new().with("a", ready(1)).with("b", ready("x"));
        assert!(!payload.needs_resolution());
        assert_eq!(payload.into_value(), json!({"a": 1, "b": "x"}));
    }

    #[test]
    fn ready_values_skip_pending_entries() {
        let payload = Payload::new()
            .with("a", ready(1))
            .with("b", deferred(async { Ok(json!(2)) }))
            .with("c", inject_fn(|_| Ok(Value::Null)).on(["a"]));
        assert_eq!(payload.ready_values(), json!({"a": 1}));
        assert_eq!(payload.len(), 3);
    }

    #[test]
    fn payload_preserves_insertion_order() {
        let payload: Payload = vec![("z", ready(1)), ("a", ready(2)), ("m", ready(3))]
            .into_iter()
            .collect();
        let keys: Vec<&str> = payload.keys().map(|k| k.as_ref()).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn resolved_ordered_follows_given_order() {
        let resolved: Resolved = vec![("b", json!(2)), ("a", json!(1))].into_iter().collect();
        let order: Vec<Arc<str>> = vec![Arc::from("a"), Arc::from("b"), Arc::from("c")];
        let ordered = resolved.ordered(&order);
        let keys: Vec<&str> = ordered.keys().map(|k| k.as_ref()).collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn merged_leaves_previous_snapshot_untouched() {
        let first: Resolved = vec![("a", json!(1))].into_iter().collect();
        let second = first.merged(vec![(Arc::from("b"), json!(2))]);
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
        assert_eq!(second.get("b"), Some(&json!(2)));
    }

    #[test]
    fn resolved_serializes_as_object() {
        let resolved: Resolved = vec![("a", json!(1)), ("b", json!([1, 2]))]
            .into_iter()
            .collect();
        assert_eq!(
            serde_json::to_value(&resolved).unwrap(),
            json!({"a": 1, "b": [1, 2]})
        );
    }
}
