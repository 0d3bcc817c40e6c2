//! Stagehand Configuration Module
//!
//! Config is stored in `~/.config/stagehand/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`STAGEHAND_UNPLANNABLE`)
//! 2. Config file (`~/.config/stagehand/config.toml`)
//! 3. Defaults

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StagehandError};

/// Environment variable overriding [`ResolverConfig::unplannable`]
pub const UNPLANNABLE_ENV: &str = "STAGEHAND_UNPLANNABLE";

/// What the resolver does with entries that can never be planned
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UnplannablePolicy {
    /// Fail with `CycleDetected` before executing anything
    #[default]
    Reject,
    /// Skip the unplanned entries; they are absent from the resolved payload
    Drop,
}

impl FromStr for UnplannablePolicy {
    type Err = StagehandError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "drop" => Ok(Self::Drop),
            other => Err(StagehandError::ConfigError {
                reason: format!("Unknown unplannable policy '{}' (use reject or drop)", other),
            }),
        }
    }
}

impl fmt::Display for UnplannablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reject => f.write_str("reject"),
            Self::Drop => f.write_str("drop"),
        }
    }
}

/// Resolver settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ResolverConfig {
    #[serde(default)]
    pub unplannable: UnplannablePolicy,
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StagehandConfig {
    #[serde(default)]
    pub resolver: ResolverConfig,
}

impl StagehandConfig {
    /// Returns `~/.config/stagehand/` on Unix, `%APPDATA%/stagehand/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stagehand")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| StagehandError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| StagehandError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir).map_err(|e| StagehandError::ConfigError {
                    reason: format!("Failed to create config directory: {}", e),
                })?;
            }
        }

        let content = toml::to_string_pretty(self).map_err(|e| StagehandError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, content).map_err(|e| StagehandError::ConfigError {
            reason: format!("Failed to write config file: {}", e),
        })?;

        Ok(())
    }

    /// Merge with environment variables
    ///
    /// Environment variables take precedence over config file values.
    /// Unparseable values are logged and ignored.
    pub fn with_env(mut self) -> Self {
        if let Ok(raw) = std::env::var(UNPLANNABLE_ENV) {
            if !raw.is_empty() {
                match raw.parse() {
                    Ok(policy) => self.resolver.unplannable = policy,
                    Err(e) => tracing::warn!(var = UNPLANNABLE_ENV, error = %e, "ignoring"),
                }
            }
        }
        self
    }
}
