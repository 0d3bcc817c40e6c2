//! Resolver - staged payload resolution with tokio
//!
//! Stages run one after another; the entries of a stage are spawned together and
//! joined all-or-nothing. Each finished stage produces a fresh snapshot that the
//! next stage reads its dependencies from.

use std::sync::Arc;

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::{ResolverConfig, UnplannablePolicy};
use crate::dag::StagePlan;
use crate::error::{Result, StagehandError};
use crate::payload::{Payload, Resolved};

use super::executor::execute;

/// Resolves payloads stage by stage
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Plan `payload`, applying the unplannable policy
    pub fn plan(&self, payload: &Payload) -> Result<StagePlan> {
        let plan = StagePlan::build(payload);
        if !plan.is_complete() {
            match self.config.unplannable {
                UnplannablePolicy::Reject => plan.ensure_complete()?,
                UnplannablePolicy::Drop => warn!(
                    unplanned = plan.unplanned().len(),
                    cycle = %plan.cycle_path(),
                    "dropping entries that can never be planned"
                ),
            }
        }
        Ok(plan)
    }

    /// Resolve every entry of `payload`, feeding `args` to each producer after
    /// its dependency values.
    ///
    /// Must be called from within a tokio runtime. On the first rejection the
    /// remaining stages are skipped; siblings already running are left to
    /// finish on their own and their results are discarded.
    #[instrument(skip_all, fields(entries = payload.len(), args = args.len()))]
    pub async fn run(&self, payload: Payload, args: &[Value]) -> Result<Resolved> {
        let plan = self.plan(&payload)?;
        let order: Vec<Arc<str>> = payload.keys().cloned().collect();
        let mut entries = payload.into_entries();
        let extra: Arc<[Value]> = Arc::from(args);
        let mut snapshot = Arc::new(Resolved::default());

        for (depth, stage) in plan.stages().iter().enumerate() {
            debug!(stage = depth, width = stage.len(), "resolving stage");

            let mut joins = Vec::with_capacity(stage.len());
            for key in stage {
                let Some(entry) = entries.swap_remove(key.as_ref()) else {
                    continue;
                };
                // Producer bodies run inside the task so a panic surfaces as a JoinError
                let handle = {
                    let snapshot = Arc::clone(&snapshot);
                    let extra = Arc::clone(&extra);
                    tokio::spawn(async move { execute(entry, &snapshot, &extra).await })
                };
                let key = Arc::clone(key);

                joins.push(async move {
                    match handle.await {
                        Ok(Ok(value)) => Ok((key, value)),
                        Ok(Err(reason)) => Err(StagehandError::EntryRejected {
                            key: key.to_string(),
                            reason,
                        }),
                        Err(e) => Err(StagehandError::EntryPanicked {
                            key: key.to_string(),
                            details: e.to_string(),
                        }),
                    }
                });
            }

            let values = try_join_all(joins).await.inspect_err(|e| {
                debug!(stage = depth, error = %e, "stage failed");
            })?;
            snapshot = Arc::new(snapshot.merged(values));
        }

        if !entries.is_empty() {
            debug!(skipped = entries.len(), "unplanned entries left unresolved");
        }

        let snapshot = Arc::try_unwrap(snapshot).unwrap_or_else(|shared| (*shared).clone());
        Ok(snapshot.ordered(&order))
    }
}
