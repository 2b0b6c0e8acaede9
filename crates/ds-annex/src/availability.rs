//! Local availability of content-store payloads
//!
//! A payload is present when its key file exists in the repository's object
//! store. Two hash-directory layouts are in use; the mixed-case one is tried
//! first.

use ds_fs::{DatasetPath, RepoPath};
use ds_git::AnnexProps;

/// Hash-directory layout of an object store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashLayout {
    Mixed,
    Lower,
}

impl HashLayout {
    /// Probe order.
    pub const ALL: [HashLayout; 2] = [HashLayout::Mixed, HashLayout::Lower];

    fn hashdir<'p>(&self, props: &'p AnnexProps) -> Option<&'p str> {
        match self {
            Self::Mixed => props.hashdir_mixed.as_deref(),
            Self::Lower => props.hashdir_lower.as_deref(),
        }
    }
}

/// The object store of one repository.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects: DatasetPath,
}

impl ObjectStore {
    /// Object store inside the git directory `git_dir`.
    pub fn new(git_dir: &DatasetPath) -> Self {
        Self {
            objects: git_dir.join(RepoPath::AnnexObjects.as_str()),
        }
    }

    pub fn objects(&self) -> &DatasetPath {
        &self.objects
    }

    /// Where the payload for `key` lives under `hashdir`.
    pub fn object_path(&self, hashdir: &str, key: &str) -> DatasetPath {
        self.objects.join(hashdir).join(key).join(key)
    }

    /// Location of the payload described by `props`, if it is present.
    ///
    /// Only a regular file counts; a directory of the same name does not.
    pub fn locate(&self, props: &AnnexProps) -> Option<DatasetPath> {
        HashLayout::ALL.iter().find_map(|layout| {
            let candidate = self.object_path(layout.hashdir(props)?, &props.key);
            candidate.is_file().then_some(candidate)
        })
    }
}

/// Record `has_content` and `objloc` on every record that has not been probed.
///
/// Hash-directory hints are consumed. Probing an already probed record is a
/// no-op, so applying this twice changes nothing.
pub fn mark_availability<'a>(store: &ObjectStore, records: impl IntoIterator<Item = &'a mut AnnexProps>) {
    let mut probed = 0usize;
    for props in records {
        if props.has_content.is_some() {
            continue;
        }
        let location = store.locate(props);
        props.has_content = Some(location.is_some());
        props.objloc = location;
        props.hashdir_mixed = None;
        props.hashdir_lower = None;
        probed += 1;
    }
    tracing::trace!(store = %store.objects, probed, "Marked content availability");
}
