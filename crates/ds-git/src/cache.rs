//! Per-invocation memo of backend queries and opened repositories
//!
//! A [`StatusCache`] is created by the top-level caller and threaded through
//! every recursive status query. It lives no longer than that call tree, so
//! nothing in it can go stale across invocations. It is not shareable between
//! threads; a concurrent caller needs one cache per query tree.

use std::collections::{HashMap, HashSet};

use ds_fs::DatasetPath;

use crate::Result;
use crate::modes::UntrackedMode;
use crate::repo::GitRepo;
use crate::snapshot::Snapshot;

/// What a cached query asked the backend for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryLabel {
    /// A content listing
    ContentInfo,
    /// The set of paths modified on disk
    Modified,
}

/// Identity of one backend query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub repo: DatasetPath,
    pub label: QueryLabel,
    pub paths: Option<Vec<DatasetPath>>,
    pub reference: Option<String>,
    pub untracked: Option<UntrackedMode>,
}

impl QueryKey {
    pub fn new(
        repo: &DatasetPath,
        label: QueryLabel,
        paths: Option<&[DatasetPath]>,
        reference: Option<&str>,
        untracked: Option<UntrackedMode>,
    ) -> Self {
        Self {
            repo: repo.clone(),
            label,
            paths: paths.map(<[DatasetPath]>::to_vec),
            reference: reference.map(str::to_string),
            untracked,
        }
    }
}

/// Memo of snapshots, modification sets and repository handles.
#[derive(Default)]
pub struct StatusCache {
    snapshots: HashMap<QueryKey, Snapshot>,
    modified: HashMap<QueryKey, HashSet<DatasetPath>>,
    repos: HashMap<DatasetPath, GitRepo>,
}

impl StatusCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached snapshot for `key`, computing it on first use.
    pub fn snapshot(
        &mut self,
        key: QueryKey,
        compute: impl FnOnce() -> Result<Snapshot>,
    ) -> Result<Snapshot> {
        if let Some(hit) = self.snapshots.get(&key) {
            tracing::trace!(repo = %key.repo, reference = ?key.reference, "Snapshot cache hit");
            return Ok(hit.clone());
        }
        let snapshot = compute()?;
        self.snapshots.insert(key, snapshot.clone());
        Ok(snapshot)
    }

    /// Return the cached modification set for `key`, computing it on first use.
    pub fn modified(
        &mut self,
        key: QueryKey,
        compute: impl FnOnce() -> Result<HashSet<DatasetPath>>,
    ) -> Result<HashSet<DatasetPath>> {
        if let Some(hit) = self.modified.get(&key) {
            return Ok(hit.clone());
        }
        let modified = compute()?;
        self.modified.insert(key, modified.clone());
        Ok(modified)
    }

    /// Handle for the nested repository at `path`, opened through `parent`.
    ///
    /// Repeated requests for the same location share one handle.
    pub fn nested_repo(&mut self, parent: &GitRepo, path: &DatasetPath) -> Result<GitRepo> {
        if let Some(repo) = self.repos.get(path) {
            return Ok(repo.clone());
        }
        let repo = GitRepo::new(parent.backend().open_nested(path)?);
        self.repos.insert(path.clone(), repo.clone());
        Ok(repo)
    }

    /// Number of memoized backend query results.
    pub fn len(&self) -> usize {
        self.snapshots.len() + self.modified.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
