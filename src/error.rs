// The #[error] attribute from thiserror uses struct fields via string interpolation,
// but Rust's unused_assignments lint doesn't recognize this.
#![allow(unused_assignments)]

//! Stagehand Error Types with Error Codes
//!
//! Error code ranges:
//! - STG-000-009: Document errors
//! - STG-010-019: Planning errors
//! - STG-020-029: Resolution errors
//! - STG-030-039: Configuration errors
//! - STG-090-099: IO/serialization errors

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StagehandError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// Reason a deferred value or producer failed.
///
/// Carried as a JSON value so the action wrapper can report it verbatim.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{}", display_reason(.0))]
pub struct Rejection(pub Value);

impl Rejection {
    pub fn new(reason: impl Into<Value>) -> Self {
        Self(reason.into())
    }

    pub fn reason(&self) -> &Value {
        &self.0
    }

    pub fn into_reason(self) -> Value {
        self.0
    }
}

impl From<Value> for Rejection {
    fn from(reason: Value) -> Self {
        Self(reason)
    }
}

impl From<&str> for Rejection {
    fn from(reason: &str) -> Self {
        Self(Value::String(reason.to_string()))
    }
}

impl From<String> for Rejection {
    fn from(reason: String) -> Self {
        Self(Value::String(reason))
    }
}

fn display_reason(reason: &Value) -> String {
    match reason {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// All error variants are part of the public API.
#[derive(Error, Debug, Diagnostic)]
#[diagnostic(url(docsrs))]
pub enum StagehandError {
    // ═══════════════════════════════════════════
    // DOCUMENT ERRORS (000-009)
    // ═══════════════════════════════════════════
    #[error("[STG-001] Failed to parse payload document: {details}")]
    #[diagnostic(
        code(stagehand::parse_error),
        help("Check YAML syntax: indentation and quoting")
    )]
    ParseError { details: String },

    #[error("[STG-002] Invalid entry '{key}': {reason}")]
    #[diagnostic(code(stagehand::invalid_document))]
    InvalidDocument { key: String, reason: String },

    #[error("[STG-003] Entry '{key}' uses unknown op '{op}'")]
    #[diagnostic(
        code(stagehand::unknown_op),
        help("Supported ops: sum, concat, collect, fail")
    )]
    UnknownOp { key: String, op: String },

    // ═══════════════════════════════════════════
    // PLANNING ERRORS (010-019)
    // ═══════════════════════════════════════════
    #[error("[STG-010] Cycle detected in payload dependencies: {cycle}")]
    #[diagnostic(
        code(stagehand::cycle_detected),
        help("Break the cycle, or set `unplannable = \"drop\"` to skip these entries")
    )]
    CycleDetected {
        cycle: String,
        unplanned: Vec<String>,
    },

    // ═══════════════════════════════════════════
    // RESOLUTION ERRORS (020-029)
    // ═══════════════════════════════════════════
    #[error("[STG-020] Entry '{key}' rejected: {reason}")]
    #[diagnostic(code(stagehand::entry_rejected))]
    EntryRejected { key: String, reason: Rejection },

    #[error("[STG-021] Entry '{key}' panicked: {details}")]
    #[diagnostic(code(stagehand::entry_panicked))]
    EntryPanicked { key: String, details: String },

    // ═══════════════════════════════════════════
    // CONFIG ERRORS (030-039)
    // ═══════════════════════════════════════════
    #[error("[STG-030] Configuration error: {reason}")]
    #[diagnostic(code(stagehand::config_error))]
    ConfigError { reason: String },

    // ═══════════════════════════════════════════
    // IO / SERIALIZATION (090-099)
    // ═══════════════════════════════════════════
    #[error("[STG-090] IO error: {0}")]
    #[diagnostic(code(stagehand::io))]
    Io(#[from] std::io::Error),

    #[error("[STG-091] JSON error: {0}")]
    #[diagnostic(code(stagehand::json))]
    Json(#[from] serde_json::Error),

    #[error("[STG-092] YAML error: {0}")]
    #[diagnostic(code(stagehand::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

impl StagehandError {
    /// Reason to report through the `error` status.
    ///
    /// Rejections keep their value as-is; everything else becomes its message.
    pub fn reason(&self) -> Value {
        match self {
            Self::EntryRejected { reason, .. } => reason.reason().clone(),
            other => Value::String(other.to_string()),
        }
    }

    /// Stable error code, e.g. `STG-020`
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseError { .. } => "STG-001",
            Self::InvalidDocument { .. } => "STG-002",
            Self::UnknownOp { .. } => "STG-003",
            Self::CycleDetected { .. } => "STG-010",
            Self::EntryRejected { .. } => "STG-020",
            Self::EntryPanicked { .. } => "STG-021",
            Self::ConfigError { .. } => "STG-030",
            Self::Io(_) => "STG-090",
            Self::Json(_) => "STG-091",
            Self::Yaml(_) => "STG-092",
        }
    }
}

impl FixSuggestion for StagehandError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            StagehandError::ParseError { .. } => Some("Check YAML syntax: indentation and quoting"),
            StagehandError::InvalidDocument { .. } => {
                Some("Use a plain value, {value, delay_ms}, or {inject, op}")
            }
            StagehandError::UnknownOp { .. } => Some("Supported ops: sum, concat, collect, fail"),
            StagehandError::CycleDetected { .. } => {
                Some("Remove the circular inject: list, or configure unplannable = \"drop\"")
            }
            StagehandError::EntryRejected { .. } => None,
            StagehandError::EntryPanicked { .. } => Some("A producer panicked; check its body"),
            StagehandError::ConfigError { .. } => {
                Some("Check ~/.config/stagehand/config.toml syntax")
            }
            StagehandError::Io(_) => Some("Check file path and permissions"),
            StagehandError::Json(_) => Some("Check JSON syntax"),
            StagehandError::Yaml(_) => Some("Check YAML syntax"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_display_carries_code() {
        let err = StagehandError::CycleDetected {
            cycle: "a → b → a".to_string(),
            unplanned: vec!["a".to_string(), "b".to_string()],
        };
        assert!(err.to_string().contains("STG-010"));
        assert!(err.to_string().contains("a → b → a"));
        assert_eq!(err.code(), "STG-010");
    }

    #[test]
    fn rejection_reason_is_reported_verbatim() {
        let err = StagehandError::EntryRejected {
            key: "p3".to_string(),
            reason: Rejection::new(json!({"status": 500})),
        };
        assert_eq!(err.reason(), json!({"status": 500}));
    }

    #[test]
    fn non_rejection_reason_is_message() {
        let err = StagehandError::EntryPanicked {
            key: "p1".to_string(),
            details: "boom".to_string(),
        };
        assert_eq!(err.reason(), json!("[STG-021] Entry 'p1' panicked: boom"));
    }

    #[test]
    fn rejection_display_unquotes_strings() {
        assert_eq!(Rejection::from("timeout").to_string(), "timeout");
        assert_eq!(Rejection::new(json!(42)).to_string(), "42");
    }

    #[test]
    fn rejected_entry_has_no_fix() {
        let err = StagehandError::EntryRejected {
            key: "x".to_string(),
            reason: Rejection::from("nope"),
        };
        assert!(err.fix_suggestion().is_none());
        assert!(StagehandError::ConfigError {
            reason: "bad".into()
        }
        .fix_suggestion()
        .is_some());
    }
}
