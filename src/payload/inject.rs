//! Dependency tags for producer entries
//!
//! `inject(body).on(["p2", "p3"])` builds a dependent entry whose body receives
//! the resolved values of `p2` and `p3` (in that order) as its leading arguments.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use smallvec::SmallVec;

use super::{Args, Entry, Outcome, Pending};

/// Stack-allocated names: most producers depend on 0-4 entries
pub type DepVec = SmallVec<[Arc<str>; 4]>;

/// Shared producer body
pub type Producer = Arc<dyn Fn(Args) -> Pending + Send + Sync>;

/// Producer together with the names of the entries it depends on
#[derive(Clone)]
pub struct Dependent {
    names: DepVec,
    body: Producer,
}

impl Dependent {
    /// Dependency names in declaration order
    pub fn names(&self) -> &[Arc<str>] {
        &self.names
    }

    /// Replace the dependency list
    pub fn retag<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.names = collect_names(names);
    }

    /// Invoke the body
    pub fn call(&self, args: Args) -> Pending {
        (self.body)(args)
    }
}

impl fmt::Debug for Dependent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependent")
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

/// First half of the two-step tagging form: `inject(body).on(names)`
#[derive(Clone)]
pub struct Injector {
    body: Producer,
}

impl Injector {
    pub fn from_producer(body: Producer) -> Self {
        Self { body }
    }

    pub fn producer(&self) -> &Producer {
        &self.body
    }

    /// Attach `names` and produce the payload entry
    pub fn on<I, S>(self, names: I) -> Entry
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Entry::Dependent(Dependent {
            names: collect_names(names),
            body: self.body,
        })
    }
}

/// Tag an asynchronous producer
pub fn inject<F, Fut>(body: F) -> Injector
where
    F: Fn(Args) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
{
    Injector {
        body: Arc::new(move |args| body(args).boxed()),
    }
}

/// Tag a synchronous producer
///
/// The body runs when the returned future is first polled, not when it is built.
pub fn inject_fn<F>(body: F) -> Injector
where
    F: Fn(Args) -> Outcome + Send + Sync + 'static,
{
    let body = Arc::new(body);
    Injector {
        body: Arc::new(move |args| {
            let body = Arc::clone(&body);
            async move { body(args) }.boxed()
        }),
    }
}

/// Dependency names of a dependent entry, `None` for anything else
pub fn get_deps(entry: &Entry) -> Option<&[Arc<str>]> {
    match entry {
        Entry::Dependent(dependent) => Some(dependent.names()),
        _ => None,
    }
}

/// True iff `entry` is dependent and names at least one dependency
pub fn has_deps(entry: &Entry) -> bool {
    get_deps(entry).is_some_and(|names| !names.is_empty())
}

fn collect_names<I, S>(names: I) -> DepVec
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names.into_iter().map(|n| Arc::from(n.as_ref())).collect()
}
