//! Configuration for document resolution.
//!
//! This module defines the `Config` struct that tunes how a document is
//! resolved and how the result is rendered. The configuration can be
//! created programmatically, loaded from a YAML or TOML file, or discovered in
//! the user's configuration directory.
//!
//! # Examples
//!
//! ```no_run
//! use swaggerfold_core::config::Config;
//!
//! # #[tokio::main]
//! # async fn main() -> swaggerfold_core::Result<()> {
//! // Build a config programmatically
//! let mut config = Config::default();
//! config.max_depth = 32;
//!
//! // Or load one from a file
//! let config = Config::from_file("swaggerfold.yaml").await?;
//! # Ok(())
//! # }
//! ```

// Internal imports (std, crate)
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

// External imports (alphabetized)
use serde::{Deserialize, Serialize};
use tokio::fs;

/// Default cap on schema nesting during normalization.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Configuration for resolving a Swagger document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Deepest schema nesting the normalizer follows before dropping a fragment
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Also fall back to path-level `responses` when an operation has none.
    /// Parameters always consult the path level; responses only do when this is set.
    #[serde(default)]
    pub path_level_responses: bool,

    /// Format used when rendering the resolved document
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Whether rendered output is pretty-printed
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            path_level_responses: false,
            output_format: OutputFormat::default(),
            pretty: default_pretty(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML or TOML file, chosen by extension
    pub async fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let config = if is_toml(path) {
            toml::from_str(&content)?
        } else {
            serde_yaml::from_str(&content)?
        };
        log::debug!("loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let path = path.as_ref();
        let content = if is_toml(path) {
            toml::to_string_pretty(self)?
        } else {
            serde_yaml::to_string(self)?
        };
        fs::write(path, content).await?;
        Ok(())
    }

    /// Load the first configuration file found in the user's config directory,
    /// or the defaults when there is none.
    pub async fn discover() -> crate::Result<Self> {
        for candidate in Self::candidates() {
            if fs::try_exists(&candidate).await? {
                return Self::from_file(&candidate).await;
            }
        }
        Ok(Self::default())
    }

    fn candidates() -> Vec<PathBuf> {
        let Some(dir) = dirs::config_dir() else {
            return Vec::new();
        };
        let dir = dir.join("swaggerfold");
        ["config.yaml", "config.yml", "config.toml"]
            .iter()
            .map(|name| dir.join(name))
            .collect()
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("toml")
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_pretty() -> bool {
    true
}
