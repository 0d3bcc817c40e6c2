//! DAG Module - stage planning for payload entries
//!
//! Contains the stage planner:
//! - `plan`: StagePlan built from a payload's dependency tags
//!
//! A StagePlan is immutable after construction; the resolver only reads it.

mod plan;

pub use plan::StagePlan;
