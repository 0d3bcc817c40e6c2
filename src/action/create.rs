//! Action wrapper - reports pending/success/error around a payload creator

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::error::StagehandError;
use crate::payload::{Outcome, Payload, Pending};
use crate::runtime::Resolver;

use super::{Commit, Mutation, Status};

/// What a payload creator produced
pub enum ActionPayload {
    /// Plain value, committed as-is
    Value(Value),
    /// Single asynchronous value
    Deferred(Pending),
    /// Record of entries, resolved by the [`Resolver`] when any entry is not ready
    Record(Payload),
}

impl ActionPayload {
    pub fn deferred<F>(future: F) -> Self
    where
        F: Future<Output = Outcome> + Send + 'static,
    {
        ActionPayload::Deferred(future.boxed())
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, ActionPayload::Deferred(_))
    }

    pub fn is_record(&self) -> bool {
        matches!(self, ActionPayload::Record(_))
    }
}

impl fmt::Debug for ActionPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionPayload::Value(value) => f.debug_tuple("Value").field(value).finish(),
            ActionPayload::Deferred(_) => f.write_str("Deferred(..)"),
            ActionPayload::Record(payload) => f.debug_tuple("Record").field(payload).finish(),
        }
    }
}

impl From<Value> for ActionPayload {
    fn from(value: Value) -> Self {
        ActionPayload::Value(value)
    }
}

impl From<Payload> for ActionPayload {
    fn from(payload: Payload) -> Self {
        ActionPayload::Record(payload)
    }
}

/// Builds the payload from the dispatch arguments
pub type PayloadCreator = Arc<dyn Fn(&[Value]) -> ActionPayload + Send + Sync>;

/// A named action with its payload creator
#[derive(Clone)]
pub struct Action {
    action_type: Arc<str>,
    creator: PayloadCreator,
    resolver: Resolver,
}

impl Action {
    /// Action whose payload is its first argument (`Null` without arguments)
    pub fn new(action_type: impl Into<Arc<str>>) -> Self {
        Self::with_creator(action_type, |args: &[Value]| {
            ActionPayload::Value(args.first().cloned().unwrap_or(Value::Null))
        })
    }

    pub fn with_creator<F>(action_type: impl Into<Arc<str>>, creator: F) -> Self
    where
        F: Fn(&[Value]) -> ActionPayload + Send + Sync + 'static,
    {
        Self {
            action_type: action_type.into(),
            creator: Arc::new(creator),
            resolver: Resolver::default(),
        }
    }

    /// Use `resolver` for record payloads
    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn action_type(&self) -> &str {
        &self.action_type
    }

    /// Create the payload from `args` and commit its progress.
    ///
    /// Asynchronous payloads commit `pending` first and exactly one terminal
    /// mutation afterwards; everything else commits `success` right away.
    /// A record's `pending` carries its already-ready entries.
    /// Returns the terminal status.
    #[instrument(skip_all, fields(action = %self.action_type))]
    pub async fn dispatch<C>(&self, commit: &C, args: &[Value]) -> Status
    where
        C: Commit + ?Sized,
    {
        match (self.creator)(args) {
            ActionPayload::Deferred(pending) => {
                self.commit(commit, Mutation::pending());
                match tokio::spawn(pending).await {
                    Ok(Ok(value)) => self.commit(commit, Mutation::success(value)),
                    Ok(Err(rejection)) => {
                        warn!(reason = %rejection, "deferred payload rejected");
                        self.commit(commit, Mutation::error(rejection.into_reason()))
                    }
                    Err(e) => {
                        let e = StagehandError::EntryPanicked {
                            key: self.action_type.to_string(),
                            details: e.to_string(),
                        };
                        warn!(error = %e, "deferred payload panicked");
                        self.commit(commit, Mutation::error(e.reason()))
                    }
                }
            }
            ActionPayload::Record(payload) if payload.needs_resolution() => {
                self.commit(commit, Mutation::pending_with(payload.ready_values()));
                match self.resolver.run(payload, args).await {
                    Ok(resolved) => self.commit(commit, Mutation::success(resolved.into_value())),
                    Err(e) => {
                        warn!(error = %e, "payload resolution failed");
                        self.commit(commit, Mutation::error(e.reason()))
                    }
                }
            }
            ActionPayload::Record(payload) => {
                self.commit(commit, Mutation::success(payload.into_value()))
            }
            ActionPayload::Value(value) => self.commit(commit, Mutation::success(value)),
        }
    }

    fn commit<C>(&self, commit: &C, mutation: Mutation) -> Status
    where
        C: Commit + ?Sized,
    {
        let status = mutation.status;
        debug!(status = %status, "commit");
        commit.commit(&self.action_type, mutation);
        status
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("action_type", &self.action_type)
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}
