//! Normalization of raw git listings into snapshots

use std::collections::HashSet;
use std::sync::LazyLock;

use ds_fs::DatasetPath;
use regex::Regex;

use crate::snapshot::{ContentRecord, EntryType, Snapshot};

/// Matches both `ls-files --stage` (`mode sha stage\tpath`) and
/// `ls-tree` (`mode type sha\tpath`) records.
static PROPS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+) (\S+) (\S+)\t(.*)$").unwrap());

/// Which command produced a listing; decides where the object id sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// `ls-files --stage` output for the working tree
    Worktree,
    /// `ls-tree` output for a recorded reference
    Tree,
}

/// Parse a NUL-separated listing into a snapshot rooted at `root`.
///
/// Lines that do not carry git properties are untracked paths; their type is
/// taken from the filesystem.
pub fn parse_listing(root: &DatasetPath, raw: &str, kind: ListingKind) -> Snapshot {
    let mut snapshot = Snapshot::new();
    for line in raw.split('\0').filter(|line| !line.is_empty()) {
        let (path, record) = match PROPS_PATTERN.captures(line) {
            Some(props) => {
                let path = root.join(&props[4]);
                let sha = match kind {
                    ListingKind::Worktree => &props[2],
                    ListingKind::Tree => &props[3],
                };
                let entry_type = match EntryType::from_mode(&props[1]) {
                    Some(EntryType::Symlink) if points_into_object_store(&path) => EntryType::File,
                    Some(entry_type) => entry_type,
                    None => inspect_type(&path),
                };
                (path, ContentRecord::new(entry_type, Some(sha.to_string())))
            }
            None => {
                let path = root.join(line);
                let entry_type = inspect_type(&path);
                (path, ContentRecord::new(entry_type, None))
            }
        };
        snapshot.insert(path, record);
    }
    snapshot
}

/// Parse a NUL-separated list of bare paths.
pub fn parse_paths(root: &DatasetPath, raw: &str) -> HashSet<DatasetPath> {
    raw.split('\0')
        .filter(|line| !line.is_empty())
        .map(|line| root.join(line))
        .collect()
}

/// Classify untracked content by looking at the filesystem.
fn inspect_type(path: &DatasetPath) -> EntryType {
    if path.is_symlink() {
        EntryType::Symlink
    } else if path.is_dir() {
        EntryType::Directory
    } else {
        EntryType::File
    }
}

/// Symlink hops followed before giving up on a chain.
const MAX_LINK_HOPS: usize = 40;

/// True if the symlink chain starting at `path` ends in a content-store
/// object directory.
///
/// A final target that does not exist is taken lexically, so a link to
/// content that is not present locally still counts: its symlink nature is a
/// storage detail either way.
fn points_into_object_store(path: &DatasetPath) -> bool {
    let mut current = path.clone();
    for _ in 0..MAX_LINK_HOPS {
        let Ok(target) = std::fs::read_link(current.to_native()) else {
            let resolved = current.as_str();
            return resolved.contains("/.git/") && resolved.contains("/annex/objects/");
        };
        let Some(parent) = current.parent() else {
            return false;
        };
        current = DatasetPath::resolve(&parent, target);
    }
    false
}
