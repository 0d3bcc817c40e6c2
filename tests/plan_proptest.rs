//! Property-Based Testing for stage planning
//!
//! Random acyclic payloads where every key may depend on earlier keys
//! (plus the occasional foreign name). Properties:
//! - every key lands in exactly one stage
//! - every in-payload dependency sits in a strictly earlier stage
//! - a dependent sits right after its deepest dependency
//! - closing a back edge always leaves the plan incomplete

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::Value;
use stagehand::{inject_fn, ready, Payload, StagePlan};

/// Dependency lists by position; `usize::MAX` marks a foreign name
fn arb_dag() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (1usize..24).prop_flat_map(|size| {
        (0..size)
            .map(|i| {
                let earlier = if i == 0 {
                    Just(Vec::new()).boxed()
                } else {
                    prop::collection::vec(
                        prop_oneof![9 => 0..i, 1 => Just(usize::MAX)],
                        0..4,
                    )
                    .boxed()
                };
                prop_oneof![1 => Just(Vec::new()), 3 => earlier]
            })
            .collect::<Vec<_>>()
    })
}

fn key(i: usize) -> String {
    if i == usize::MAX {
        "foreign".to_string()
    } else {
        format!("k{}", i)
    }
}

fn build_payload(deps: &[Vec<usize>]) -> Payload {
    deps.iter()
        .enumerate()
        .map(|(i, names)| {
            let entry = if names.is_empty() {
                ready(i as u64)
            } else {
                inject_fn(|_| Ok(Value::Null)).on(names.iter().map(|&d| key(d)))
            };
            (key(i), entry)
        })
        .collect()
}

proptest! {
    /// Property: every key is planned exactly once
    #[test]
    fn every_key_planned_once(deps in arb_dag()) {
        let plan = StagePlan::build(&build_payload(&deps));

        prop_assert!(plan.is_complete());
        let mut seen = HashSet::new();
        for stage in plan.stages() {
            prop_assert!(!stage.is_empty());
            for k in stage {
                prop_assert!(seen.insert(k.to_string()), "{} planned twice", k);
            }
        }
        prop_assert_eq!(seen.len(), deps.len());
    }

    /// Property: dependencies resolve in earlier stages
    #[test]
    fn dependencies_precede_dependents(deps in arb_dag()) {
        let plan = StagePlan::build(&build_payload(&deps));

        for (i, names) in deps.iter().enumerate() {
            let depth = plan.depth_of(&key(i)).unwrap();
            let in_payload: Vec<usize> = names
                .iter()
                .copied()
                .filter(|&d| d != usize::MAX)
                .collect();

            for &d in &in_payload {
                let dep_depth = plan.depth_of(&key(d)).unwrap();
                prop_assert!(dep_depth < depth, "k{} at {} but dependency k{} at {}", i, depth, d, dep_depth);
            }

            // Stages are minimal: one after the deepest dependency
            if let Some(deepest) = in_payload.iter().map(|&d| plan.depth_of(&key(d)).unwrap()).max() {
                prop_assert_eq!(depth, deepest + 1);
            }
        }
    }

    /// Property: a back edge from the first key closes a cycle
    #[test]
    fn back_edge_leaves_plan_incomplete(deps in arb_dag()) {
        let last = deps.len() - 1;
        prop_assume!(last > 0);

        let mut cyclic = deps.clone();
        cyclic[0] = vec![last];
        cyclic[last].push(0);
        let plan = StagePlan::build(&build_payload(&cyclic));

        prop_assert!(!plan.is_complete());
        prop_assert!(plan.unplanned().iter().any(|k| k.as_ref() == "k0"));
        prop_assert!(plan.ensure_complete().is_err());
    }
}
