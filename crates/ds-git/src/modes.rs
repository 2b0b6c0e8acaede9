//! Query modes for untracked content and nested repositories

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// If and how untracked content is reported for a working-tree listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UntrackedMode {
    /// Untracked content is not reported at all.
    No,
    /// An untracked directory is reported as one entry, without descending.
    Normal,
    /// Every file inside untracked directories is reported individually.
    #[default]
    All,
}

impl FromStr for UntrackedMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "no" => Ok(Self::No),
            "normal" => Ok(Self::Normal),
            "all" => Ok(Self::All),
            _ => Err(Error::AmbiguousUntrackedMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for UntrackedMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::No => write!(f, "no"),
            Self::Normal => write!(f, "normal"),
            Self::All => write!(f, "all"),
        }
    }
}

/// How nested repositories take part in a status query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmoduleMode {
    /// Inspect every nested repository exhaustively.
    #[default]
    No,
    /// Stop at the first nested repository found to be modified.
    Other,
    /// Ignore nested repositories entirely.
    All,
}

impl FromStr for SubmoduleMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "no" => Ok(Self::No),
            "other" => Ok(Self::Other),
            "all" => Ok(Self::All),
            _ => Err(Error::AmbiguousSubmoduleMode {
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for SubmoduleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::No => write!(f, "no"),
            Self::Other => write!(f, "other"),
            Self::All => write!(f, "all"),
        }
    }
}
