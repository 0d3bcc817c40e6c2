//! Runtime Module - payload resolution
//!
//! Contains the runtime execution components:
//! - `runner`: stage-by-stage resolution with tokio concurrency
//! - `executor`: turns a single entry into a future
//!
//! This module represents the "how" - runtime execution.
//! For the stage layout, see the `dag` module.

mod executor;
mod runner;

// Re-export public types
pub use executor::execute;
pub use runner::Resolver;
