//! Action Module - status-reporting actions and mutation handlers
//!
//! ```text
//! Action::dispatch(commit, args)
//!     │  creator(args) → ActionPayload
//!     ├── Deferred ─────────► pending, then success | error
//!     ├── Record (async) ───► pending, Resolver::run, then success | error
//!     └── anything else ────► success
//!                               │
//!                               ▼ Commit::commit(type, Mutation)
//!                        Store → MutationTable → MutationHandler
//! ```
//!
//! - `create`: [`Action`] and [`ActionPayload`]
//! - `handle`: [`MutationHandler`] and [`MutationTable`]
//! - `store`: [`Store`], a minimal state container implementing [`Commit`]

mod create;
mod handle;
mod store;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use create::{Action, ActionPayload, PayloadCreator};
pub use handle::{HandlerFn, MutationHandler, MutationTable, StatusHandlers};
pub use store::Store;

/// Progress of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pending,
    Success,
    Error,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Success => "success",
            Status::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an action commits: a status tag plus its payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    #[serde(rename = "__status__")]
    pub status: Status,
    #[serde(rename = "__payload__")]
    pub payload: Value,
}

impl Mutation {
    pub fn new(status: Status, payload: Value) -> Self {
        Self { status, payload }
    }

    pub fn pending() -> Self {
        Self::new(Status::Pending, Value::Null)
    }

    /// `pending` carrying partial data
    pub fn pending_with(payload: Value) -> Self {
        Self::new(Status::Pending, payload)
    }

    pub fn success(payload: Value) -> Self {
        Self::new(Status::Success, payload)
    }

    pub fn error(reason: Value) -> Self {
        Self::new(Status::Error, reason)
    }
}

/// Sink receiving every mutation an action commits
pub trait Commit: Send + Sync {
    fn commit(&self, action_type: &str, mutation: Mutation);
}

impl<F> Commit for F
where
    F: Fn(&str, Mutation) + Send + Sync,
{
    fn commit(&self, action_type: &str, mutation: Mutation) {
        self(action_type, mutation)
    }
}
