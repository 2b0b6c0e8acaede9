//! Save orchestration: stage, register, remove and commit changes
//!
//! A save runs in fixed phases. Each phase may queue result events; the run is
//! an iterator so callers observe events as the phases complete and can stop
//! early. A backend failure ends the run after it is yielded.

use std::collections::VecDeque;

use ds_fs::{DatasetPath, RepoPath};

use crate::backend::{AddOptions, BackendOutcome, CommitOutcome};
use crate::cache::StatusCache;
use crate::modes::{SubmoduleMode, UntrackedMode};
use crate::repo::{DiffOptions, GitRepo};
use crate::result::{Action, ResultRecord};
use crate::snapshot::{EntryType, State, StatusMap, StatusRecord};
use crate::Result;

/// Commit message used when none is given.
pub const DEFAULT_MESSAGE: &str = "Recorded changes";

/// Stages content on behalf of a save.
///
/// A plain repository hands everything to git; a content-store-aware one
/// decides per path where content goes.
pub trait ContentAdder {
    fn add_content(&self, paths: &[String], options: &AddOptions) -> Result<Vec<BackendOutcome>>;
}

/// What to save.
#[derive(Debug, Clone)]
pub struct SaveRequest {
    pub message: Option<String>,
    /// Restrict the save to these paths. `Some(vec![])` saves nothing.
    pub paths: Option<Vec<DatasetPath>>,
    /// Precomputed status to save instead of querying one.
    pub status: Option<StatusMap>,
    pub untracked: UntrackedMode,
    pub submodules: SubmoduleMode,
    pub add: AddOptions,
    /// Tag the new state with this name.
    pub version_tag: Option<String>,
}

impl Default for SaveRequest {
    fn default() -> Self {
        Self {
            message: None,
            paths: None,
            status: None,
            untracked: UntrackedMode::Normal,
            submodules: SubmoduleMode::No,
            add: AddOptions::default(),
            version_tag: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Prepare,
    Register,
    Add,
    Remove,
    Commit,
    Tag,
    Done,
}

/// A running save. Iterating drives it to completion.
pub struct SaveRun<'a> {
    repo: &'a GitRepo,
    adder: &'a dyn ContentAdder,
    request: SaveRequest,
    status: StatusMap,
    phase: Phase,
    pending: VecDeque<ResultRecord>,
}

impl<'a> SaveRun<'a> {
    pub fn new(repo: &'a GitRepo, adder: &'a dyn ContentAdder, request: SaveRequest) -> Self {
        Self {
            repo,
            adder,
            request,
            status: StatusMap::new(),
            phase: Phase::Prepare,
            pending: VecDeque::new(),
        }
    }

    fn emit(&mut self, record: ResultRecord) {
        self.pending.push_back(record.with_refds(self.repo.root()));
    }

    fn rel_paths<'s>(&self, paths: impl Iterator<Item = &'s DatasetPath>) -> Result<Vec<String>> {
        paths.map(|path| self.repo.relative(path)).collect()
    }

    /// Determine what needs saving.
    fn prepare(&mut self) -> Result<()> {
        self.phase = Phase::Register;
        let paths = self.request.paths.as_deref();
        let status = match self.request.status.take() {
            Some(given) => match paths {
                Some(paths) => given
                    .into_iter()
                    .filter(|(path, _)| paths.iter().any(|p| path.starts_with(p)))
                    .collect(),
                None => given,
            },
            None if paths.is_some_and(<[DatasetPath]>::is_empty) => StatusMap::new(),
            None => {
                let options = DiffOptions {
                    paths,
                    untracked: self.request.untracked,
                    submodules: self.request.submodules,
                };
                self.repo
                    .diffstatus("HEAD", None, options, &mut StatusCache::new())?
            }
        };
        self.status = status
            .into_iter()
            .filter(|(_, record)| !record.is_clean())
            .collect();
        if self.status.is_empty() {
            tracing::debug!(repo = %self.repo.root(), "Nothing to save");
            self.phase = Phase::Done;
        }
        Ok(())
    }

    /// Register untracked directories that are repositories of their own.
    fn register_nested(&mut self) -> Result<()> {
        self.phase = Phase::Add;
        let candidates: Vec<DatasetPath> = self
            .status
            .iter()
            .filter(|(_, r)| r.state == State::Untracked && r.entry_type == EntryType::Directory)
            .map(|(path, _)| path.clone())
            .collect();
        if candidates.is_empty() {
            return Ok(());
        }
        // an exhaustive listing only stops at a directory when git sees a repository there
        let listing = self
            .repo
            .content_info(Some(&candidates), None, UntrackedMode::All)?;
        let mut registered = false;
        for (path, record) in &listing {
            if record.entry_type != EntryType::Directory {
                continue;
            }
            let rel = self.repo.relative(path)?;
            match self.repo.backend().add_submodule(&rel) {
                Ok(()) => {
                    tracing::info!(path = %path, "Registered nested repository");
                    registered = true;
                    if let Some(entry) = self.status.get_mut(path) {
                        entry.entry_type = EntryType::Dataset;
                    }
                    self.emit(ResultRecord::ok(Action::AddSubmodule, path.clone()).with_type(EntryType::Dataset));
                }
                Err(e) => self.emit(ResultRecord::error(Action::AddSubmodule, path.clone(), e.to_string())),
            }
        }
        if registered {
            let gitmodules = self.repo.root().join(RepoPath::GitModules.as_str());
            self.status
                .insert(gitmodules, StatusRecord::new(State::Modified, EntryType::File));
        }
        Ok(())
    }

    /// Stage modified and untracked content.
    ///
    /// Nested repositories and their registry are always recorded by git;
    /// everything else goes through the content adder.
    fn add(&mut self) -> Result<()> {
        self.phase = Phase::Remove;
        let gitmodules = self.repo.root().join(RepoPath::GitModules.as_str());
        let (structural, content): (Vec<_>, Vec<_>) = self
            .status
            .iter()
            .filter(|(_, r)| matches!(r.state, State::Modified | State::Untracked))
            .partition(|(path, r)| r.entry_type == EntryType::Dataset || **path == gitmodules);
        let structural = self.rel_paths(structural.into_iter().map(|(path, _)| path))?;
        let content = self.rel_paths(content.into_iter().map(|(path, _)| path))?;

        let mut outcomes = Vec::new();
        if !structural.is_empty() {
            tracing::debug!(repo = %self.repo.root(), count = structural.len(), "Recording nested repositories");
            outcomes.extend(self.repo.backend().add(&structural, &AddOptions::default())?);
        }
        if !content.is_empty() {
            tracing::debug!(repo = %self.repo.root(), count = content.len(), "Adding content");
            outcomes.extend(self.adder.add_content(&content, &self.request.add)?);
        }
        let root = self.repo.root().clone();
        for outcome in outcomes {
            self.emit(ResultRecord::from_outcome(&root, outcome));
        }
        Ok(())
    }

    /// Stage deletions that are not staged yet.
    fn remove(&mut self) -> Result<()> {
        self.phase = Phase::Commit;
        let to_remove = self.rel_paths(
            self.status
                .iter()
                .filter(|(_, r)| r.state == State::Deleted && r.gitshasum.is_none())
                .map(|(path, _)| path),
        )?;
        if to_remove.is_empty() {
            return Ok(());
        }
        tracing::debug!(repo = %self.repo.root(), count = to_remove.len(), "Removing content");
        let outcomes = self.repo.backend().remove(&to_remove)?;
        let root = self.repo.root().clone();
        for outcome in outcomes {
            self.emit(ResultRecord::from_outcome(&root, outcome));
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        self.phase = Phase::Tag;
        let to_commit = self.rel_paths(self.status.keys())?;
        let message = self
            .request
            .message
            .clone()
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string());
        let root = self.repo.root().clone();
        match self.repo.backend().commit(&to_commit, &message)? {
            CommitOutcome::Committed { revision } => {
                tracing::info!(repo = %root, revision = %revision, "Saved changes");
                self.emit(
                    ResultRecord::ok(Action::Save, root)
                        .with_type(EntryType::Dataset)
                        .with_gitshasum(revision),
                );
            }
            CommitOutcome::NothingToCommit => {
                self.emit(ResultRecord::not_needed(Action::Save, root).with_type(EntryType::Dataset));
            }
        }
        Ok(())
    }

    fn tag(&mut self) -> Result<()> {
        self.phase = Phase::Done;
        let Some(name) = self.request.version_tag.clone() else {
            return Ok(());
        };
        let root = self.repo.root().clone();
        match self.repo.backend().tag(&name) {
            Ok(()) => self.emit(ResultRecord::ok(Action::Tag, root).with_message(name)),
            Err(e) => self.emit(ResultRecord::error(Action::Tag, root, e.to_string())),
        }
        Ok(())
    }
}

impl Iterator for SaveRun<'_> {
    type Item = Result<ResultRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Some(Ok(record));
            }
            let step = match self.phase {
                Phase::Prepare => self.prepare(),
                Phase::Register => self.register_nested(),
                Phase::Add => self.add(),
                Phase::Remove => self.remove(),
                Phase::Commit => self.commit(),
                Phase::Tag => self.tag(),
                Phase::Done => return None,
            };
            if let Err(e) = step {
                self.phase = Phase::Done;
                return Some(Err(e));
            }
        }
    }
}

impl std::iter::FusedIterator for SaveRun<'_> {}
