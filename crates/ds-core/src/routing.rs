//! Assignment of requested paths to the repositories that own them

use std::path::PathBuf;

use ds_fs::DatasetPath;
use ds_git::{Action, ResultRecord};
use indexmap::IndexMap;

use crate::dataset::{Dataset, is_repository_root};

/// Message of the result reported for a requested path outside the dataset.
pub const NOT_UNDERNEATH: &str = "path not underneath this dataset";

/// One repository to query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Canonical repository root
    pub root: DatasetPath,
    /// Paths to query in it; `None` means everything.
    pub paths: Option<Vec<DatasetPath>>,
    /// Number of repository boundaries between the dataset root and `root`
    pub depth: usize,
}

/// Requested paths grouped by owning repository, plus rejections.
#[derive(Debug, Default)]
pub struct Routing {
    pub targets: IndexMap<DatasetPath, Target>,
    pub errors: Vec<ResultRecord>,
}

/// Innermost repository that owns `path`, and its depth below `top`.
///
/// The root of a nested repository is owned by its parent; it is an entry
/// there.
pub fn owning_repository(top: &DatasetPath, path: &DatasetPath) -> (DatasetPath, usize) {
    let mut owner: Option<DatasetPath> = None;
    let mut depth = 0;
    let mut cursor = path.parent();
    while let Some(dir) = cursor {
        if dir == *top || !dir.starts_with(top) {
            break;
        }
        if is_repository_root(&dir) {
            owner.get_or_insert_with(|| dir.clone());
            depth += 1;
        }
        cursor = dir.parent();
    }
    (owner.unwrap_or_else(|| top.clone()), depth)
}

/// Drop duplicates and paths beneath another requested path.
fn collapse(mut paths: Vec<DatasetPath>) -> Vec<DatasetPath> {
    paths.sort();
    paths.dedup();
    let mut kept: Vec<DatasetPath> = Vec::with_capacity(paths.len());
    for path in paths {
        if !kept.iter().any(|k| path.starts_with(k)) {
            kept.push(path);
        }
    }
    kept
}

/// Route `requested` paths of `ds` to their repositories.
///
/// `None` targets the whole dataset; so does requesting the dataset root.
pub fn route(ds: &Dataset, requested: Option<&[PathBuf]>, action: Action) -> Routing {
    let top = ds.root();
    let mut routing = Routing::default();
    let Some(requested) = requested else {
        routing.targets.insert(
            top.clone(),
            Target {
                root: top.clone(),
                paths: None,
                depth: 0,
            },
        );
        return routing;
    };

    let mut inside = Vec::with_capacity(requested.len());
    for input in requested {
        let path = ds.resolve(input);
        if path.starts_with(top) {
            inside.push(path);
        } else {
            routing.errors.push(
                ResultRecord::error(action, path, NOT_UNDERNEATH)
                    .with_refds(ds.path()),
            );
        }
    }

    for path in collapse(inside) {
        let (root, depth) = owning_repository(top, &path);
        let target = routing.targets.entry(root.clone()).or_insert_with(|| Target {
            root: root.clone(),
            paths: Some(Vec::new()),
            depth,
        });
        if path == root {
            target.paths = None;
        } else if let Some(paths) = target.paths.as_mut() {
            paths.push(path);
        }
    }
    tracing::debug!(
        targets = routing.targets.len(),
        rejected = routing.errors.len(),
        "Routed requested paths"
    );
    routing
}
