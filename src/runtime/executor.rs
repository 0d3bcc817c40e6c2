//! Entry execution - turns one payload entry into a single future

use futures::FutureExt;
use serde_json::Value;

use crate::payload::{Args, Entry, Pending, Resolved};

/// Build the future that settles `entry`.
///
/// Ready values and deferred entries pass through. A dependent producer is
/// called with the values of its dependencies looked up in `snapshot` (`Null`
/// for names the snapshot lacks), followed by `extra` in order.
pub fn execute(entry: Entry, snapshot: &Resolved, extra: &[Value]) -> Pending {
    match entry {
        Entry::Ready(value) => futures::future::ready(Ok(value)).boxed(),
        Entry::Deferred(pending) => pending,
        Entry::Dependent(dependent) => {
            let mut values = Vec::with_capacity(dependent.names().len() + extra.len());
            values.extend(
                dependent
                    .names()
                    .iter()
                    .map(|name| snapshot.get(name).cloned().unwrap_or(Value::Null)),
            );
            values.extend_from_slice(extra);
            dependent.call(Args::new(values))
        }
    }
}
