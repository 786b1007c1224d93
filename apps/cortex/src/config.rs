//! # Configuration
//!
//! Optional `cortex.toml` at the brain root, or an explicit file given with
//! `--config`. Every key is optional:
//!
//! ```toml
//! [analysis]
//! stale_days = 30
//!
//! [search]
//! backend = "indexed"   # or "substring"
//! ```

use cortex_core::primitives::DEFAULT_STALE_DAYS;
use cortex_core::{CortexOptions, SearchMode};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up at the brain root.
pub const CONFIG_FILE: &str = "cortex.toml";

/// Errors from the configuration layer.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config '{path}': {reason}")]
    Read { path: PathBuf, reason: String },

    #[error("Invalid config '{path}': {reason}")]
    Parse { path: PathBuf, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub stale_days: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stale_days: DEFAULT_STALE_DAYS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    pub backend: SearchMode,
}

/// Parsed `cortex.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub search: SearchConfig,
}

impl AppConfig {
    /// Parse configuration text. `origin` is only used in error messages.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|e| ConfigError::Parse {
            path: origin.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Engine options derived from this configuration.
    #[must_use]
    pub fn options(&self) -> CortexOptions {
        CortexOptions {
            stale_days: self.analysis.stale_days,
            search: self.search.backend,
        }
    }
}

/// Load the configuration for `root`.
///
/// An explicit path must exist. Without one, `<root>/cortex.toml` is used if
/// present and defaults apply otherwise.
pub fn load_config(root: &Path, explicit: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let (path, required) = match explicit {
        Some(path) => (path.to_path_buf(), true),
        None => (root.join(CONFIG_FILE), false),
    };

    let text = match std::fs::read_to_string(&path) {
        Ok(text) => text,
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(AppConfig::default());
        }
        Err(e) => {
            return Err(ConfigError::Read {
                path,
                reason: e.to_string(),
            });
        }
    };

    let config = AppConfig::from_toml(&text, &path)?;
    tracing::debug!(path = %path.display(), ?config, "config loaded");
    Ok(config)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let config = AppConfig::from_toml("", Path::new("cortex.toml")).expect("parse");
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.options(), CortexOptions::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml("[search]\nbackend = \"substring\"\n", Path::new("x"))
            .expect("parse");
        assert_eq!(config.search.backend, SearchMode::Substring);
        assert_eq!(config.analysis.stale_days, DEFAULT_STALE_DAYS);
    }

    #[test]
    fn typos_are_rejected() {
        let err = AppConfig::from_toml("[analysis]\nstale_dayz = 3\n", Path::new("x"));
        assert!(matches!(err, Err(ConfigError::Parse { .. })));
        let err = AppConfig::from_toml("[search]\nbackend = \"fts\"\n", Path::new("x"));
        assert!(matches!(err, Err(ConfigError::Parse { .. })));
    }
}
