//! `save` over a dataset hierarchy
//!
//! Nested datasets are saved before the repository that contains them, so the
//! parent records their new revisions.

use std::path::PathBuf;

use ds_fs::{DatasetPath, io};
use ds_git::{
    Action, AddOptions, DiffOptions, EntryType, ResultRecord, SaveRequest, State, StatusCache,
    SubmoduleMode, UntrackedMode,
};
use indexmap::IndexMap;

use crate::dataset::{Dataset, DatasetRepo, is_repository_root};
use crate::routing::{owning_repository, route};
use crate::status::within_limit;
use crate::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct SaveOptions {
    pub message: Option<String>,
    /// Read the commit message from this file.
    pub message_file: Option<PathBuf>,
    /// Paths to save; `None` saves everything.
    pub paths: Option<Vec<PathBuf>>,
    pub version_tag: Option<String>,
    pub recursive: bool,
    /// Deepest nesting level to descend to; negative or `None` is unlimited.
    pub recursion_limit: Option<i32>,
    /// Only save changes to content that is already tracked.
    pub updated: bool,
    /// Defaults to the dataset configuration.
    pub to_git: Option<bool>,
}

/// Settings shared by every repository saved in one call.
struct SavePlan<'a> {
    ds: &'a Dataset,
    message: Option<String>,
    untracked: UntrackedMode,
    add: AddOptions,
    recursive: bool,
    recursion_limit: Option<i32>,
}

impl SavePlan<'_> {
    /// Save one repository, its modified nested datasets first.
    fn save_repo(
        &self,
        root: &DatasetPath,
        paths: Option<Vec<DatasetPath>>,
        depth: usize,
        version_tag: Option<String>,
        results: &mut Vec<ResultRecord>,
    ) -> Result<()> {
        let repo = DatasetRepo::open(root)?;
        let mut paths = paths;
        if self.recursive && within_limit(self.recursion_limit, depth + 1) {
            let options = DiffOptions {
                paths: paths.as_deref(),
                untracked: self.untracked,
                submodules: SubmoduleMode::No,
            };
            let status = repo.repository().status(options, &mut StatusCache::new())?;
            let nested: Vec<DatasetPath> = status
                .iter()
                .filter(|(path, r)| {
                    r.entry_type == EntryType::Dataset
                        && r.state == State::Modified
                        && is_repository_root(path)
                })
                .map(|(path, _)| path.clone())
                .collect();
            for path in nested {
                self.save_repo(&path, None, depth + 1, None, results)?;
                if let Some(paths) = paths.as_mut() {
                    if !paths.contains(&path) {
                        paths.push(path);
                    }
                }
            }
        }

        let request = SaveRequest {
            message: self.message.clone(),
            paths,
            untracked: self.untracked,
            add: self.add.clone(),
            version_tag,
            ..SaveRequest::default()
        };
        tracing::debug!(repo = %root, depth, "Saving repository");
        for record in repo.repository().save(request) {
            let mut record = record?;
            record.path = record.path.as_ref().map(|p| self.ds.to_user(p));
            results.push(record.with_refds(self.ds.path()));
        }
        Ok(())
    }
}

/// Record the current state of the dataset, or of the requested paths in it.
pub fn save(ds: &Dataset, options: &SaveOptions) -> Result<Vec<ResultRecord>> {
    let message = match (&options.message, &options.message_file) {
        (Some(_), Some(_)) => return Err(Error::ConflictingMessage),
        (None, Some(file)) => Some(io::read_text(&ds.resolve(file))?.trim_end().to_string()),
        (Some(message), None) => Some(message.clone()),
        (None, None) => ds.config().save.message.clone(),
    };
    let plan = SavePlan {
        ds,
        message,
        untracked: if options.updated {
            UntrackedMode::No
        } else {
            UntrackedMode::Normal
        },
        add: AddOptions {
            to_git: options.to_git.or(ds.config().save.to_git),
            update: options.updated,
        },
        recursive: options.recursive,
        recursion_limit: options.recursion_limit,
    };

    let routing = route(ds, options.paths.as_deref(), Action::Save);
    let mut results = routing.errors;
    let mut pending: IndexMap<DatasetPath, (Option<Vec<DatasetPath>>, usize)> = routing
        .targets
        .into_values()
        .map(|t| (t.root, (t.paths, t.depth)))
        .collect();
    if pending.is_empty() {
        return Ok(results);
    }

    // innermost repositories first; each one is then recorded in its parent
    while let Some(root) = pending
        .keys()
        .max_by_key(|root| root.as_str().split('/').count())
        .cloned()
    {
        let Some((paths, depth)) = pending.shift_remove(&root) else {
            break;
        };
        let version_tag = (root == *ds.root()).then(|| options.version_tag.clone()).flatten();
        plan.save_repo(&root, paths, depth, version_tag, &mut results)?;
        if root != *ds.root() {
            let (owner, owner_depth) = owning_repository(ds.root(), &root);
            let entry = pending
                .entry(owner)
                .or_insert_with(|| (Some(Vec::new()), owner_depth));
            if let Some(paths) = entry.0.as_mut() {
                paths.push(root.clone());
            }
        }
    }
    Ok(results)
}
