//! Mutation handlers - apply committed mutations to state
//!
//! A handler is either a single function run on `success` only, or a table of
//! optional per-status functions. A [`MutationTable`] maps action types to
//! handlers.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

use super::{Mutation, Status};

/// Function applying a mutation payload to state
pub type HandlerFn<S> = Box<dyn Fn(&mut S, &Value) + Send + Sync>;

/// Optional handler per status
pub struct StatusHandlers<S> {
    pending: Option<HandlerFn<S>>,
    success: Option<HandlerFn<S>>,
    error: Option<HandlerFn<S>>,
}

impl<S> Default for StatusHandlers<S> {
    fn default() -> Self {
        Self {
            pending: None,
            success: None,
            error: None,
        }
    }
}

impl<S> StatusHandlers<S> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut S, &Value) + Send + Sync + 'static,
    {
        self.pending = Some(Box::new(f));
        self
    }

    pub fn success<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut S, &Value) + Send + Sync + 'static,
    {
        self.success = Some(Box::new(f));
        self
    }

    pub fn error<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut S, &Value) + Send + Sync + 'static,
    {
        self.error = Some(Box::new(f));
        self
    }

    fn get(&self, status: Status) -> Option<&HandlerFn<S>> {
        match status {
            Status::Pending => self.pending.as_ref(),
            Status::Success => self.success.as_ref(),
            Status::Error => self.error.as_ref(),
        }
    }
}

/// Applies one action type's mutations
pub enum MutationHandler<S> {
    /// Runs on `success` only
    SuccessOnly(HandlerFn<S>),
    /// Runs the handler registered for the mutation's status
    ByStatus(StatusHandlers<S>),
}

impl<S> MutationHandler<S> {
    pub fn success_only<F>(f: F) -> Self
    where
        F: Fn(&mut S, &Value) + Send + Sync + 'static,
    {
        MutationHandler::SuccessOnly(Box::new(f))
    }

    pub fn by_status(handlers: StatusHandlers<S>) -> Self {
        MutationHandler::ByStatus(handlers)
    }

    /// Apply `mutation`; returns whether a handler ran
    pub fn handle(&self, state: &mut S, mutation: &Mutation) -> bool {
        let handler = match self {
            MutationHandler::SuccessOnly(f) => (mutation.status == Status::Success).then_some(f),
            MutationHandler::ByStatus(handlers) => handlers.get(mutation.status),
        };
        match handler {
            Some(f) => {
                f(state, &mutation.payload);
                true
            }
            None => false,
        }
    }
}

impl<S> From<StatusHandlers<S>> for MutationHandler<S> {
    fn from(handlers: StatusHandlers<S>) -> Self {
        MutationHandler::ByStatus(handlers)
    }
}

/// Handlers keyed by action type
pub struct MutationTable<S> {
    handlers: FxHashMap<Arc<str>, MutationHandler<S>>,
}

impl<S> Default for MutationTable<S> {
    fn default() -> Self {
        Self {
            handlers: FxHashMap::default(),
        }
    }
}

impl<S> MutationTable<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `action_type`, replacing any previous one
    pub fn on(mut self, action_type: impl Into<Arc<str>>, handler: impl Into<MutationHandler<S>>) -> Self {
        self.handlers.insert(action_type.into(), handler.into());
        self
    }

    pub fn contains(&self, action_type: &str) -> bool {
        self.handlers.contains_key(action_type)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Route `mutation` to the handler of `action_type`.
    ///
    /// Returns false when no handler is registered for `action_type`.
    pub fn apply(&self, state: &mut S, action_type: &str, mutation: &Mutation) -> bool {
        match self.handlers.get(action_type) {
            Some(handler) => {
                handler.handle(state, mutation);
                true
            }
            None => false,
        }
    }
}
