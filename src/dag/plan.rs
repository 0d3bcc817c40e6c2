//! StagePlan - topological layering of payload entries
//!
//! Entries are indexed into an arena (id → dependency ids) and layered with an
//! iterative fixed-point loop:
//! - Stage 0: entries without a dependency list (ready, deferred, untagged producers)
//! - Stage k: entries whose in-payload dependencies all sit in stages < k
//!
//! Names that are not keys of the payload are dropped while indexing, so they
//! never hold an entry back. Entries that never become eligible are reported as
//! unplanned, together with one dependency cycle among them.

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::StagehandError;
use crate::payload::{get_deps, Payload};

/// In-payload dependency ids, `None` when the entry carries no dependency list
type IdDeps = Option<SmallVec<[usize; 4]>>;

struct Arena {
    keys: Vec<Arc<str>>,
    deps: Vec<IdDeps>,
}

impl Arena {
    fn index(payload: &Payload) -> Self {
        let keys: Vec<Arc<str>> = payload.keys().cloned().collect();
        let ids: FxHashMap<&str, usize> = keys
            .iter()
            .enumerate()
            .map(|(id, key)| (key.as_ref(), id))
            .collect();

        let deps = payload
            .iter()
            .map(|(_, entry)| match get_deps(entry) {
                Some(names) if !names.is_empty() => Some(
                    names
                        .iter()
                        .filter_map(|name| ids.get(name.as_ref()).copied())
                        .collect(),
                ),
                _ => None,
            })
            .collect();

        Self { keys, deps }
    }

    fn dependencies(&self, id: usize) -> impl Iterator<Item = usize> + '_ {
        self.deps[id].iter().flatten().copied()
    }
}

/// Ordered stages of payload keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagePlan {
    stages: Vec<Vec<Arc<str>>>,
    unplanned: Vec<Arc<str>>,
    /// One dependency cycle among the unplanned keys, first key repeated at the end
    cycle: Vec<Arc<str>>,
}

impl StagePlan {
    /// Layer the entries of `payload` into stages
    pub fn build(payload: &Payload) -> Self {
        let arena = Arena::index(payload);
        let count = arena.keys.len();
        let mut stage_of: Vec<Option<usize>> = vec![None; count];
        let mut stage_ids: Vec<Vec<usize>> = Vec::new();

        let first: Vec<usize> = (0..count).filter(|&id| arena.deps[id].is_none()).collect();
        if !first.is_empty() {
            for &id in &first {
                stage_of[id] = Some(0);
            }
            stage_ids.push(first);
        }

        loop {
            let current = stage_ids.len();
            let eligible: Vec<usize> = (0..count)
                .filter(|&id| stage_of[id].is_none())
                .filter(|&id| arena.dependencies(id).all(|dep| stage_of[dep].is_some()))
                .collect();

            if eligible.is_empty() {
                break;
            }
            for &id in &eligible {
                stage_of[id] = Some(current);
            }
            stage_ids.push(eligible);
        }

        let unplanned_ids: Vec<usize> = (0..count).filter(|&id| stage_of[id].is_none()).collect();
        let cycle = unplanned_ids
            .first()
            .map(|&start| find_cycle(&arena, &stage_of, start))
            .unwrap_or_default();

        let key = |id: usize| Arc::clone(&arena.keys[id]);
        Self {
            stages: stage_ids
                .into_iter()
                .map(|ids| ids.into_iter().map(key).collect())
                .collect(),
            unplanned: unplanned_ids.into_iter().map(key).collect(),
            cycle: cycle.into_iter().map(key).collect(),
        }
    }

    pub fn stages(&self) -> &[Vec<Arc<str>>] {
        &self.stages
    }

    /// Number of stages
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Keys that never became eligible (cycle or dependency on one)
    pub fn unplanned(&self) -> &[Arc<str>] {
        &self.unplanned
    }

    /// True when every key was assigned to a stage
    pub fn is_complete(&self) -> bool {
        self.unplanned.is_empty()
    }

    /// Stage index of `key`
    pub fn depth_of(&self, key: &str) -> Option<usize> {
        self.stages
            .iter()
            .position(|stage| stage.iter().any(|k| k.as_ref() == key))
    }

    /// Cycle path such as `a → b → a`, empty for complete plans
    pub fn cycle_path(&self) -> String {
        self.cycle
            .iter()
            .map(|k| k.as_ref())
            .collect::<Vec<_>>()
            .join(" → ")
    }

    /// Fail with `CycleDetected` when some keys were left unplanned
    pub fn ensure_complete(&self) -> Result<(), StagehandError> {
        if self.is_complete() {
            return Ok(());
        }
        Err(StagehandError::CycleDetected {
            cycle: self.cycle_path(),
            unplanned: self.unplanned.iter().map(|k| k.to_string()).collect(),
        })
    }
}

impl fmt::Display for StagePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (depth, stage) in self.stages.iter().enumerate() {
            let keys: Vec<&str> = stage.iter().map(|k| k.as_ref()).collect();
            writeln!(f, "[{}] {}", depth, keys.join(", "))?;
        }
        if !self.unplanned.is_empty() {
            let keys: Vec<&str> = self.unplanned.iter().map(|k| k.as_ref()).collect();
            writeln!(f, "[unplanned] {}", keys.join(", "))?;
        }
        Ok(())
    }
}

/// Walk unplanned dependencies from `start` until a key repeats.
///
/// Every unplanned entry has at least one unplanned dependency, so the walk
/// always closes a cycle.
fn find_cycle(arena: &Arena, stage_of: &[Option<usize>], start: usize) -> Vec<usize> {
    let mut position: FxHashMap<usize, usize> = FxHashMap::default();
    let mut path: Vec<usize> = Vec::new();
    let mut current = start;

    loop {
        if let Some(&at) = position.get(&current) {
            let mut cycle = path.split_off(at);
            cycle.push(current);
            return cycle;
        }
        position.insert(current, path.len());
        path.push(current);

        match arena.dependencies(current).find(|&dep| stage_of[dep].is_none()) {
            Some(next) => current = next,
            None => return path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{deferred, inject_fn, ready, Entry};
    use serde_json::{json, Value};

    fn producer(names: &[&str]) -> Entry {
        inject_fn(|_| Ok(Value::Null)).on(names.iter().copied())
    }

    fn stage_keys(plan: &StagePlan) -> Vec<Vec<&str>> {
        plan.stages()
            .iter()
            .map(|s| s.iter().map(|k| k.as_ref()).collect())
            .collect()
    }

    #[test]
    fn independent_entries_share_one_stage() {
        let payload = Payload::new()
            .with("a", deferred(async { Ok(json!(1)) }))
            .with("b", deferred(async { Ok(json!(2)) }))
            .with("c", ready(3));
        let plan = StagePlan::build(&payload);
        assert_eq!(stage_keys(&plan), vec![vec!["a", "b", "c"]]);
        assert!(plan.is_complete());
    }

    #[test]
    fn chain_is_layered_in_order() {
        let payload = Payload::new()
            .with("p1", ready(1))
            .with("p2", ready(2))
            .with("p3", producer(&["p2"]))
            .with("p4", producer(&["p3"]));
        let plan = StagePlan::build(&payload);
        assert_eq!(
            stage_keys(&plan),
            vec![vec!["p1", "p2"], vec!["p3"], vec!["p4"]]
        );
        assert_eq!(plan.depth_of("p4"), Some(2));
        assert_eq!(plan.depth_of("missing"), None);
    }

    #[test]
    fn declaration_order_does_not_matter() {
        let payload = Payload::new()
            .with("p4", producer(&["p3"]))
            .with("p3", producer(&["p1"]))
            .with("p1", ready(1));
        let plan = StagePlan::build(&payload);
        assert_eq!(stage_keys(&plan), vec![vec!["p1"], vec!["p3"], vec!["p4"]]);
    }

    #[test]
    fn foreign_names_are_satisfied() {
        let payload = Payload::new()
            .with("a", ready(1))
            .with("b", producer(&["a", "nowhere"]))
            .with("c", producer(&["ghost"]));
        let plan = StagePlan::build(&payload);
        assert_eq!(stage_keys(&plan), vec![vec!["a"], vec!["b", "c"]]);
    }

    #[test]
    fn untagged_producer_lands_in_first_stage() {
        let payload = Payload::new()
            .with("a", producer(&[]))
            .with("b", producer(&["a"]));
        let plan = StagePlan::build(&payload);
        assert_eq!(stage_keys(&plan), vec![vec!["a"], vec!["b"]]);
    }

    #[test]
    fn empty_payload_has_no_stages() {
        let plan = StagePlan::build(&Payload::new());
        assert!(plan.is_empty());
        assert!(plan.is_complete());
    }

    #[test]
    fn cycle_leaves_keys_unplanned() {
        let payload = Payload::new()
            .with("root", ready(1))
            .with("a", producer(&["b"]))
            .with("b", producer(&["a"]))
            .with("c", producer(&["b"]));
        let plan = StagePlan::build(&payload);

        assert_eq!(stage_keys(&plan), vec![vec!["root"]]);
        let unplanned: Vec<&str> = plan.unplanned().iter().map(|k| k.as_ref()).collect();
        assert_eq!(unplanned, vec!["a", "b", "c"]);
        assert_eq!(plan.cycle_path(), "a → b → a");

        let err = plan.ensure_complete().unwrap_err();
        assert!(err.to_string().contains("STG-010"));
    }

    #[test]
    fn self_dependency_is_cycle() {
        let payload = Payload::new().with("a", producer(&["a"]));
        let plan = StagePlan::build(&payload);
        assert!(plan.is_empty());
        assert_eq!(plan.cycle_path(), "a → a");
    }

    #[test]
    fn dependent_on_cycle_reports_the_cycle_only() {
        let payload = Payload::new()
            .with("tail", producer(&["x"]))
            .with("x", producer(&["y"]))
            .with("y", producer(&["x"]));
        let plan = StagePlan::build(&payload);
        assert_eq!(plan.cycle_path(), "x → y → x");
    }

    #[test]
    fn display_lists_stages() {
        let payload = Payload::new()
            .with("a", ready(1))
            .with("b", producer(&["a"]));
        let plan = StagePlan::build(&payload);
        assert_eq!(plan.to_string(), "[0] a\n[1] b\n");
    }
}
