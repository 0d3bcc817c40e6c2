//! Store - minimal state container driven by committed mutations

use parking_lot::Mutex;
use tracing::warn;

use super::{Commit, Mutation, MutationTable};

/// Guarded state plus the handlers that mutate it
pub struct Store<S> {
    state: Mutex<S>,
    mutations: MutationTable<S>,
}

impl<S> Store<S> {
    pub fn new(state: S, mutations: MutationTable<S>) -> Self {
        Self {
            state: Mutex::new(state),
            mutations,
        }
    }

    /// Read the state in place
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.state.lock())
    }

    pub fn into_inner(self) -> S {
        self.state.into_inner()
    }
}

impl<S: Clone> Store<S> {
    /// Snapshot of the current state
    pub fn state(&self) -> S {
        self.state.lock().clone()
    }
}

impl<S: Send> Commit for Store<S> {
    fn commit(&self, action_type: &str, mutation: Mutation) {
        let mut state = self.state.lock();
        if !self.mutations.apply(&mut state, action_type, &mutation) {
            warn!(action = action_type, status = %mutation.status, "no mutation registered");
        }
    }
}
