//! Per-dataset configuration
//!
//! Read from `.dataset/config.toml` in the dataset root:
//!
//! ```toml
//! [status]
//! untracked = "normal"
//! submodules = "no"
//!
//! [save]
//! message = "Recorded changes"
//! to_git = false
//! ```
//!
//! Every key is optional. Command-line options take precedence.

use ds_fs::{ConfigStore, DatasetPath, RepoPath};
use ds_git::{SubmoduleMode, UntrackedMode};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Defaults for status queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub untracked: UntrackedMode,
    pub submodules: SubmoduleMode,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            untracked: UntrackedMode::Normal,
            submodules: SubmoduleMode::No,
        }
    }
}

/// Defaults for saving.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    pub message: Option<String>,
    pub to_git: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub status: StatusConfig,
    pub save: SaveConfig,
}

impl DatasetConfig {
    /// Load the configuration of the dataset at `root`, or defaults if it has none.
    pub fn load(root: &DatasetPath) -> Result<Self> {
        let path = root.join(RepoPath::DatasetConfigFile.as_str());
        let config = ConfigStore::new().load_or_default(&path)?;
        tracing::debug!(path = %path, "Loaded dataset configuration");
        Ok(config)
    }
}
