//! Diff/status reconciliation between two snapshots

use ds_fs::DatasetPath;

use crate::cache::{QueryKey, QueryLabel, StatusCache};
use crate::modes::{SubmoduleMode, UntrackedMode};
use crate::repo::{DiffOptions, GitRepo};
use crate::snapshot::{ContentRecord, EntryType, Snapshot, State, StatusMap, StatusRecord};
use crate::{Error, Result};

impl GitRepo {
    /// Compare the state at `from` with the state at `to`, or with the working
    /// tree when `to` is `None`, reporting every path including clean ones.
    ///
    /// Nested repositories recorded as clean are inspected further unless
    /// `options.submodules` says otherwise. All backend listings go through
    /// `cache`, so a query tree lists each repository at most once per
    /// distinct query.
    pub fn diffstatus(
        &self,
        from: &str,
        to: Option<&str>,
        options: DiffOptions<'_>,
        cache: &mut StatusCache,
    ) -> Result<StatusMap> {
        let root = self.root().clone();
        let paths = options.paths;

        let (to_state, modified) = match to {
            None => {
                let key = QueryKey::new(
                    &root,
                    QueryLabel::ContentInfo,
                    paths,
                    None,
                    Some(options.untracked),
                );
                let to_state =
                    cache.snapshot(key, || self.content_info(paths, None, options.untracked))?;
                let key = QueryKey::new(&root, QueryLabel::Modified, paths, None, None);
                let modified = cache.modified(key, || self.modified_paths(paths))?;
                (to_state, Some(modified))
            }
            Some(reference) => {
                let key = QueryKey::new(&root, QueryLabel::ContentInfo, paths, Some(reference), None);
                let to_state = cache.snapshot(key, || self.recorded_state(paths, reference))?;
                (to_state, None)
            }
        };
        let key = QueryKey::new(&root, QueryLabel::ContentInfo, paths, Some(from), None);
        let from_state = cache.snapshot(key, || self.recorded_state(paths, from))?;

        let mut status = StatusMap::with_capacity(to_state.len());
        for (path, to_record) in &to_state {
            let state = match from_state.get(path) {
                None if to_record.gitshasum.is_some() => State::Added,
                None => State::Untracked,
                Some(from_record)
                    if from_record.gitshasum == to_record.gitshasum
                        && !modified.as_ref().is_some_and(|m| m.contains(path)) =>
                {
                    if options.submodules == SubmoduleMode::All
                        && to_record.entry_type == EntryType::Dataset
                    {
                        continue;
                    }
                    present_or_deleted(path, State::Clean)
                }
                Some(_) => present_or_deleted(path, State::Modified),
            };
            status.insert(path.clone(), status_record(state, to_record));
        }
        for (path, from_record) in &from_state {
            if !to_state.contains_key(path) {
                let record = StatusRecord::new(State::Deleted, from_record.entry_type)
                    .with_gitshasum(from_record.gitshasum.clone());
                status.insert(path.clone(), record);
            }
        }

        if options.submodules != SubmoduleMode::All {
            self.inspect_nested(&mut status, options, cache)?;
        }
        Ok(status)
    }

    /// Snapshot of the tree recorded at `reference`.
    ///
    /// `HEAD` on an unborn branch has no recorded content.
    fn recorded_state(&self, paths: Option<&[DatasetPath]>, reference: &str) -> Result<Snapshot> {
        if reference == "HEAD" && self.head_revision()?.is_none() {
            tracing::debug!(repo = %self.root(), "HEAD is unborn, nothing recorded");
            return Ok(Snapshot::new());
        }
        self.content_info(paths, Some(reference), UntrackedMode::All)
    }

    /// Re-evaluate nested repositories that look clean from the outside.
    fn inspect_nested(
        &self,
        status: &mut StatusMap,
        options: DiffOptions<'_>,
        cache: &mut StatusCache,
    ) -> Result<()> {
        for (path, record) in status.iter_mut() {
            if record.entry_type != EntryType::Dataset || record.state != State::Clean {
                continue;
            }
            let Some((nested, head)) = open_nested(self, path, cache)? else {
                continue;
            };
            let changed = if record.gitshasum != head {
                true
            } else {
                let nested_options = DiffOptions {
                    paths: None,
                    untracked: options.untracked,
                    submodules: SubmoduleMode::Other,
                };
                let nested_status = nested.diffstatus("HEAD", None, nested_options, cache)?;
                nested_status.values().any(|r| !r.is_clean())
            };
            if changed {
                tracing::debug!(path = %path, "Nested repository has changes");
                record.state = State::Modified;
                record.gitshasum = None;
                if options.submodules == SubmoduleMode::Other {
                    break;
                }
            }
        }
        Ok(())
    }
}

/// Open the nested repository at `path` and read its head revision.
///
/// Locations that hold no valid repository are skipped.
fn open_nested(
    parent: &GitRepo,
    path: &DatasetPath,
    cache: &mut StatusCache,
) -> Result<Option<(GitRepo, Option<String>)>> {
    let nested = match cache.nested_repo(parent, path) {
        Ok(nested) => nested,
        Err(Error::InvalidNestedRepository { reason, .. }) => {
            tracing::debug!(path = %path, reason = %reason, "Skipping nested location");
            return Ok(None);
        }
        Err(e) => return Err(e),
    };
    match nested.head_revision() {
        Ok(head) => Ok(Some((nested, head))),
        Err(Error::Git(e)) => {
            tracing::debug!(path = %path, error = %e, "Skipping unreadable nested repository");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn present_or_deleted(path: &DatasetPath, present: State) -> State {
    if path.exists_or_symlink() {
        present
    } else {
        State::Deleted
    }
}

fn status_record(state: State, record: &ContentRecord) -> StatusRecord {
    let gitshasum = match state {
        State::Clean | State::Added => record.gitshasum.clone(),
        _ => None,
    };
    StatusRecord {
        state,
        entry_type: record.entry_type,
        gitshasum,
        annex: record.annex.clone(),
    }
}
