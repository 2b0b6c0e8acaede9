//! Content and status records keyed by path

use std::fmt;

use ds_fs::DatasetPath;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Logical nature of a piece of content.
///
/// This reflects what the content *is* to a user, not how git stores it: a
/// symlink into the content store is a `File`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Symlink,
    Dataset,
    Directory,
}

impl EntryType {
    /// Map a git mode code onto an entry type, if it is one git tracks.
    pub fn from_mode(mode: &str) -> Option<Self> {
        match mode {
            "100644" | "100755" => Some(Self::File),
            "120000" => Some(Self::Symlink),
            "160000" => Some(Self::Dataset),
            _ => None,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Symlink => write!(f, "symlink"),
            Self::Dataset => write!(f, "dataset"),
            Self::Directory => write!(f, "directory"),
        }
    }
}

/// Content-store properties of a file whose payload lives outside git.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnnexProps {
    /// Content key identifying the payload.
    pub key: String,
    /// Payload size in bytes, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytesize: Option<u64>,
    /// Key backend name (e.g. `SHA256E`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<String>,
    /// Whether the payload is present in the local object store. `None` until probed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_content: Option<bool>,
    /// Resolved location of the payload in the object store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objloc: Option<DatasetPath>,
    /// Hash directory under the mixed-case layout, as reported by the store.
    #[serde(skip)]
    pub hashdir_mixed: Option<String>,
    /// Hash directory under the lower-case layout, as reported by the store.
    #[serde(skip)]
    pub hashdir_lower: Option<String>,
}

/// One entry of a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentRecord {
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Object id recorded by git; `None` for untracked content.
    pub gitshasum: Option<String>,
    #[serde(flatten)]
    pub annex: Option<AnnexProps>,
}

impl ContentRecord {
    pub fn new(entry_type: EntryType, gitshasum: Option<String>) -> Self {
        Self {
            entry_type,
            gitshasum,
            annex: None,
        }
    }
}

/// Ordered mapping from path to content record.
///
/// Order follows the underlying listing and carries no meaning.
pub type Snapshot = IndexMap<DatasetPath, ContentRecord>;

/// Computed state of a path when comparing two snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Added,
    Untracked,
    Clean,
    Deleted,
    Modified,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "added"),
            Self::Untracked => write!(f, "untracked"),
            Self::Clean => write!(f, "clean"),
            Self::Deleted => write!(f, "deleted"),
            Self::Modified => write!(f, "modified"),
        }
    }
}

/// One entry of a [`StatusMap`]: a content record plus its computed state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub state: State,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Retained only for `clean` and `added` content, and for staged deletions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitshasum: Option<String>,
    #[serde(flatten)]
    pub annex: Option<AnnexProps>,
}

impl StatusRecord {
    pub fn new(state: State, entry_type: EntryType) -> Self {
        Self {
            state,
            entry_type,
            gitshasum: None,
            annex: None,
        }
    }

    pub fn with_gitshasum(mut self, gitshasum: Option<String>) -> Self {
        self.gitshasum = gitshasum;
        self
    }

    pub fn is_clean(&self) -> bool {
        self.state == State::Clean
    }
}

/// Ordered mapping from path to status record.
pub type StatusMap = IndexMap<DatasetPath, StatusRecord>;
