//! Stagehand - status-reporting actions with staged async payload resolution
//!
//! ## Module Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        DOMAIN MODEL                          │
//! │  payload/   Entry (Ready | Deferred | Dependent), inject()   │
//! │  document   YAML → Payload                                   │
//! └──────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      APPLICATION LAYER                       │
//! │  dag/       Stage planning (StagePlan)                       │
//! │  runtime/   Staged resolution (Resolver, execute)            │
//! │  action/    Action, MutationHandler, MutationTable, Store    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use serde_json::json;
//! use stagehand::{deferred, inject_fn, ready, Payload, Resolver};
//!
//! # async fn demo() -> stagehand::error::Result<()> {
//! let payload = Payload::new()
//!     .with("p1", ready(1))
//!     .with("p2", deferred(async { Ok(json!(2)) }))
//!     .with(
//!         "p3",
//!         inject_fn(|args| Ok(json!(args.get(0).as_i64().unwrap_or(0) + 1))).on(["p2"]),
//!     );
//!
//! let resolved = Resolver::default().run(payload, &[]).await?;
//! assert_eq!(resolved.get("p3"), Some(&json!(3)));
//! # Ok(())
//! # }
//! ```

// ═══════════════════════════════════════════════════════════════
// DOMAIN MODEL
// ═══════════════════════════════════════════════════════════════
pub mod document;
pub mod payload;

// ═══════════════════════════════════════════════════════════════
// APPLICATION LAYER
// ═══════════════════════════════════════════════════════════════
pub mod action;
pub mod dag;
pub mod runtime;

// ═══════════════════════════════════════════════════════════════
// CROSS-CUTTING - Error handling, configuration
// ═══════════════════════════════════════════════════════════════
pub mod config;
pub mod error;

// ═══════════════════════════════════════════════════════════════
// PUBLIC API RE-EXPORTS
// ═══════════════════════════════════════════════════════════════

pub use error::{Rejection, StagehandError};

pub use config::{ResolverConfig, StagehandConfig, UnplannablePolicy};

pub use payload::{
    deferred, get_deps, has_deps, inject, inject_fn, ready, reject, Args, Dependent, Entry,
    Injector, Payload, Resolved,
};

pub use dag::StagePlan;

pub use runtime::{execute, Resolver};

pub use action::{
    Action, ActionPayload, Commit, Mutation, MutationHandler, MutationTable, Status,
    StatusHandlers, Store,
};

pub use document::PayloadDocument;
