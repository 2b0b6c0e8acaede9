//! `status` and `diff` over a dataset hierarchy

use std::collections::VecDeque;
use std::path::PathBuf;

use ds_git::{
    Action, DiffOptions, EntryType, ResultRecord, StatusCache, StatusMap, SubmoduleMode,
    UntrackedMode,
};

use crate::Result;
use crate::dataset::{Dataset, DatasetRepo, is_repository_root};
use crate::routing::{Target, route};

/// Which content-store properties to report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AnnexReport {
    #[default]
    None,
    /// Key, size and backend
    Basic,
    /// Basic properties plus local availability
    Availability,
}

#[derive(Debug, Clone, Default)]
pub struct StatusOptions {
    /// Paths to report on; `None` reports on the whole dataset.
    pub paths: Option<Vec<PathBuf>>,
    /// Defaults to the dataset configuration.
    pub untracked: Option<UntrackedMode>,
    /// Defaults to the dataset configuration.
    pub submodules: Option<SubmoduleMode>,
    pub recursive: bool,
    /// Deepest nesting level to descend to; negative or `None` is unlimited.
    pub recursion_limit: Option<i32>,
    pub annex: AnnexReport,
}

#[derive(Debug, Clone)]
pub struct DiffRequest {
    pub from: String,
    /// Compare against the working tree when `None`.
    pub to: Option<String>,
    pub paths: Option<Vec<PathBuf>>,
    pub untracked: Option<UntrackedMode>,
    pub submodules: Option<SubmoduleMode>,
}

impl Default for DiffRequest {
    fn default() -> Self {
        Self {
            from: "HEAD".to_string(),
            to: None,
            paths: None,
            untracked: None,
            submodules: None,
        }
    }
}

/// True if a repository `depth` levels down may be visited.
pub(crate) fn within_limit(limit: Option<i32>, depth: usize) -> bool {
    match limit {
        Some(limit) if limit >= 0 => depth <= limit as usize,
        _ => true,
    }
}

/// Result events for a status map, in the dataset's path space.
fn report(ds: &Dataset, action: Action, status: &StatusMap) -> impl Iterator<Item = ResultRecord> {
    status.iter().map(move |(path, record)| {
        ResultRecord::from_status(action, &ds.to_user(path), record).with_refds(ds.path())
    })
}

/// Report the state of the dataset, or of the requested paths in it.
pub fn status(ds: &Dataset, options: &StatusOptions) -> Result<Vec<ResultRecord>> {
    let untracked = options.untracked.unwrap_or(ds.config().status.untracked);
    let submodules = options.submodules.unwrap_or(ds.config().status.submodules);
    let routing = route(ds, options.paths.as_deref(), Action::Status);
    let mut results = routing.errors;
    let mut cache = StatusCache::new();
    let mut queue: VecDeque<Target> = routing.targets.into_values().collect();

    while let Some(target) = queue.pop_front() {
        let repo = DatasetRepo::open(&target.root)?;
        let diff_options = DiffOptions {
            paths: target.paths.as_deref(),
            untracked,
            submodules,
        };
        let mut status = repo.repository().status(diff_options, &mut cache)?;
        if let Some(annex) = repo.annex() {
            match options.annex {
                AnnexReport::None => {}
                AnnexReport::Basic => annex.annotate(&mut status, diff_options.paths, false)?,
                AnnexReport::Availability => {
                    annex.annotate(&mut status, diff_options.paths, true)?
                }
            }
        }
        results.extend(report(ds, Action::Status, &status));

        if options.recursive && within_limit(options.recursion_limit, target.depth + 1) {
            for (path, record) in &status {
                if record.entry_type == EntryType::Dataset
                    && record.state != ds_git::State::Deleted
                    && is_repository_root(path)
                {
                    tracing::debug!(path = %path, depth = target.depth + 1, "Descending into nested dataset");
                    queue.push_back(Target {
                        root: path.clone(),
                        paths: None,
                        depth: target.depth + 1,
                    });
                }
            }
        }
    }
    Ok(results)
}

/// Report what differs between two states of the dataset.
pub fn diff(ds: &Dataset, request: &DiffRequest) -> Result<Vec<ResultRecord>> {
    let untracked = request.untracked.unwrap_or(ds.config().status.untracked);
    let submodules = request.submodules.unwrap_or(ds.config().status.submodules);
    let routing = route(ds, request.paths.as_deref(), Action::Diff);
    let mut results = routing.errors;
    let mut cache = StatusCache::new();

    for target in routing.targets.values() {
        let repo = DatasetRepo::open(&target.root)?;
        let diff_options = DiffOptions {
            paths: target.paths.as_deref(),
            untracked,
            submodules,
        };
        let changes = repo.repository().diff(
            &request.from,
            request.to.as_deref(),
            diff_options,
            &mut cache,
        )?;
        results.extend(report(ds, Action::Diff, &changes));
    }
    Ok(results)
}
