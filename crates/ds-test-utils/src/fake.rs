//! In-memory backends that record every request made against them.
//!
//! Realism level: **FAKE** - listings are canned, but paths live in a real
//! temporary directory so existence checks behave as on a real dataset.
//!
//! Use for: reconciler and save tests that assert on which backend queries
//! were made, or that need situations hard to produce with a real git.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::rc::Rc;

use ds_annex::{AnnexBackend, AnnexEntry};
use ds_fs::DatasetPath;
use ds_git::{AddOptions, BackendOutcome, CommitOutcome, GitBackend, UntrackedMode};

/// A request received by a fake backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    LsFiles { paths: Option<Vec<String>>, untracked: UntrackedMode },
    LsTree { paths: Option<Vec<String>>, reference: String },
    LsModified { paths: Option<Vec<String>> },
    Add { paths: Vec<String>, options: AddOptions },
    Remove { paths: Vec<String> },
    Commit { paths: Vec<String>, message: String },
    AddSubmodule { path: String },
    Tag { name: String },
    Find { paths: Option<Vec<String>> },
    FindRef { reference: String },
}

impl FakeCall {
    /// True for read-only listing queries.
    pub fn is_listing(&self) -> bool {
        matches!(
            self,
            Self::LsFiles { .. } | Self::LsTree { .. } | Self::LsModified { .. }
        )
    }
}

#[derive(Debug, Clone)]
struct TrackedEntry {
    path: String,
    mode: String,
    sha: String,
}

fn selected(path: &str, paths: Option<&[String]>) -> bool {
    let path = path.trim_end_matches('/');
    paths.is_none_or(|paths| {
        paths.iter().any(|p| {
            p == "." || path == p || path.starts_with(&format!("{p}/"))
        })
    })
}

/// Canned git backend over a temporary directory.
///
/// Build it up with the `with_*` methods, then share it as an `Rc` so the
/// test can inspect [`calls`](FakeGit::calls) afterwards.
#[derive(Debug)]
pub struct FakeGit {
    root: DatasetPath,
    head: Option<String>,
    index: Vec<TrackedEntry>,
    trees: HashMap<String, Vec<TrackedEntry>>,
    untracked_normal: Vec<String>,
    untracked_all: Vec<String>,
    modified: Vec<String>,
    nested: HashMap<DatasetPath, Rc<FakeGit>>,
    failing_submodules: Vec<String>,
    calls: RefCell<Vec<FakeCall>>,
}

impl FakeGit {
    /// An empty repository rooted at `root`, which must exist.
    pub fn new(root: impl AsRef<std::path::Path>) -> Self {
        Self {
            root: DatasetPath::canonical(root).unwrap(),
            head: Some("0000000000000000000000000000000000000001".to_string()),
            index: Vec::new(),
            trees: HashMap::from([("HEAD".to_string(), Vec::new())]),
            untracked_normal: Vec::new(),
            untracked_all: Vec::new(),
            modified: Vec::new(),
            nested: HashMap::new(),
            failing_submodules: Vec::new(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn touch(&self, rel: &str) {
        let path = self.root.join(rel).to_native();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, rel).unwrap();
    }

    fn tree_mut(&mut self, reference: &str) -> &mut Vec<TrackedEntry> {
        self.trees.entry(reference.to_string()).or_default()
    }

    pub fn with_head(mut self, revision: Option<&str>) -> Self {
        self.head = revision.map(str::to_string);
        self
    }

    /// Record `rel` in the index with `sha`, without touching `HEAD` or disk.
    pub fn with_index_entry(mut self, rel: &str, mode: &str, sha: &str) -> Self {
        self.index.push(TrackedEntry {
            path: rel.to_string(),
            mode: mode.to_string(),
            sha: sha.to_string(),
        });
        self
    }

    /// Record `rel` in the tree at `reference` with `sha`.
    pub fn with_tree_entry(mut self, reference: &str, rel: &str, mode: &str, sha: &str) -> Self {
        self.tree_mut(reference).push(TrackedEntry {
            path: rel.to_string(),
            mode: mode.to_string(),
            sha: sha.to_string(),
        });
        self
    }

    /// A committed, unmodified file present on disk.
    pub fn with_clean_file(self, rel: &str, sha: &str) -> Self {
        self.touch(rel);
        self.with_index_entry(rel, "100644", sha)
            .with_tree_entry("HEAD", rel, "100644", sha)
    }

    /// A committed file whose on-disk content changed.
    pub fn with_modified_file(mut self, rel: &str, sha: &str) -> Self {
        self.modified.push(rel.to_string());
        self.with_clean_file(rel, sha)
    }

    /// A file staged but not yet committed.
    pub fn with_added_file(self, rel: &str, sha: &str) -> Self {
        self.touch(rel);
        self.with_index_entry(rel, "100644", sha)
    }

    /// An untracked file on disk.
    pub fn with_untracked_file(mut self, rel: &str) -> Self {
        self.touch(rel);
        self.untracked_normal.push(rel.to_string());
        self.untracked_all.push(rel.to_string());
        self
    }

    /// An untracked directory holding `files`; collapsed in normal mode.
    pub fn with_untracked_dir(mut self, rel: &str, files: &[&str]) -> Self {
        fs::create_dir_all(self.root.join(rel).to_native()).unwrap();
        self.untracked_normal.push(format!("{rel}/"));
        for file in files {
            let path = format!("{rel}/{file}");
            self.touch(&path);
            self.untracked_all.push(path);
        }
        self
    }

    /// An untracked directory that git reports as a repository of its own.
    pub fn with_untracked_repo(mut self, rel: &str) -> Self {
        fs::create_dir_all(self.root.join(rel).join(".git").to_native()).unwrap();
        self.untracked_normal.push(format!("{rel}/"));
        self.untracked_all.push(format!("{rel}/"));
        self
    }

    /// A registered nested repository recorded at `sha`, with its directory on disk.
    pub fn with_submodule(self, rel: &str, sha: &str) -> Self {
        fs::create_dir_all(self.root.join(rel).to_native()).unwrap();
        self.with_index_entry(rel, "160000", sha)
            .with_tree_entry("HEAD", rel, "160000", sha)
    }

    /// Make `nested` openable at `rel`.
    pub fn with_nested(mut self, rel: &str, nested: Rc<FakeGit>) -> Self {
        self.nested.insert(self.root.join(rel), nested);
        self
    }

    /// Make registering a nested repository at `rel` fail.
    pub fn with_failing_submodule(mut self, rel: &str) -> Self {
        self.failing_submodules.push(rel.to_string());
        self
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.borrow().clone()
    }

    /// Number of listing queries received.
    pub fn listing_calls(&self) -> usize {
        self.calls.borrow().iter().filter(|c| c.is_listing()).count()
    }

    fn record(&self, call: FakeCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl GitBackend for FakeGit {
    fn root(&self) -> &DatasetPath {
        &self.root
    }

    fn git_dir(&self) -> ds_git::Result<DatasetPath> {
        Ok(self.root.join(".git"))
    }

    fn ls_files(&self, paths: Option<&[String]>, untracked: UntrackedMode) -> ds_git::Result<String> {
        self.record(FakeCall::LsFiles {
            paths: paths.map(<[String]>::to_vec),
            untracked,
        });
        let mut out = String::new();
        for entry in self.index.iter().filter(|e| selected(&e.path, paths)) {
            out.push_str(&format!("{} {} 0\t{}\0", entry.mode, entry.sha, entry.path));
        }
        let untracked_entries: &[String] = match untracked {
            UntrackedMode::No => &[],
            UntrackedMode::Normal => &self.untracked_normal,
            UntrackedMode::All => &self.untracked_all,
        };
        for path in untracked_entries.iter().filter(|p| selected(p, paths)) {
            out.push_str(path);
            out.push('\0');
        }
        Ok(out)
    }

    fn ls_tree(&self, paths: Option<&[String]>, reference: &str) -> ds_git::Result<String> {
        self.record(FakeCall::LsTree {
            paths: paths.map(<[String]>::to_vec),
            reference: reference.to_string(),
        });
        let Some(tree) = self.trees.get(reference) else {
            return Err(ds_git::Error::backend(
                format!("git ls-tree {reference}"),
                128,
                format!("fatal: Not a valid object name {reference}"),
            ));
        };
        let mut out = String::new();
        // like git, a path inside a nested repository reports the nested repository itself
        let contains_requested = |entry: &TrackedEntry| {
            entry.mode == "160000"
                && paths.is_some_and(|paths| {
                    paths.iter().any(|p| p.starts_with(&format!("{}/", entry.path)))
                })
        };
        for entry in tree
            .iter()
            .filter(|e| selected(&e.path, paths) || contains_requested(e))
        {
            let kind = if entry.mode == "160000" { "commit" } else { "blob" };
            out.push_str(&format!("{} {} {}\t{}\0", entry.mode, kind, entry.sha, entry.path));
        }
        Ok(out)
    }

    fn ls_modified(&self, paths: Option<&[String]>) -> ds_git::Result<String> {
        self.record(FakeCall::LsModified {
            paths: paths.map(<[String]>::to_vec),
        });
        let mut out = String::new();
        for path in self.modified.iter().filter(|p| selected(p, paths)) {
            out.push_str(path);
            out.push('\0');
        }
        Ok(out)
    }

    fn head_revision(&self) -> ds_git::Result<Option<String>> {
        Ok(self.head.clone())
    }

    fn add(&self, paths: &[String], options: &AddOptions) -> ds_git::Result<Vec<BackendOutcome>> {
        self.record(FakeCall::Add {
            paths: paths.to_vec(),
            options: options.clone(),
        });
        Ok(paths.iter().map(|p| BackendOutcome::ok("add", p.as_str())).collect())
    }

    fn remove(&self, paths: &[String]) -> ds_git::Result<Vec<BackendOutcome>> {
        self.record(FakeCall::Remove {
            paths: paths.to_vec(),
        });
        Ok(paths.iter().map(|p| BackendOutcome::ok("rm", p.as_str())).collect())
    }

    fn commit(&self, paths: &[String], message: &str) -> ds_git::Result<CommitOutcome> {
        self.record(FakeCall::Commit {
            paths: paths.to_vec(),
            message: message.to_string(),
        });
        if paths.is_empty() {
            return Ok(CommitOutcome::NothingToCommit);
        }
        Ok(CommitOutcome::Committed {
            revision: "00000000000000000000000000000000000000c0".to_string(),
        })
    }

    fn add_submodule(&self, path: &str) -> ds_git::Result<()> {
        self.record(FakeCall::AddSubmodule {
            path: path.to_string(),
        });
        if self.failing_submodules.iter().any(|p| p == path) {
            return Err(ds_git::Error::RegistrationFailure {
                path: self.root.join(path).to_native(),
                message: "does not have a commit checked out".to_string(),
            });
        }
        Ok(())
    }

    fn tag(&self, name: &str) -> ds_git::Result<()> {
        self.record(FakeCall::Tag {
            name: name.to_string(),
        });
        Ok(())
    }

    fn open_nested(&self, path: &DatasetPath) -> ds_git::Result<Rc<dyn GitBackend>> {
        match self.nested.get(path) {
            Some(nested) => Ok(Rc::clone(nested) as Rc<dyn GitBackend>),
            None => Err(ds_git::Error::InvalidNestedRepository {
                path: path.to_native(),
                reason: "no repository".to_string(),
            }),
        }
    }
}

/// Canned content-store backend.
#[derive(Debug, Default)]
pub struct FakeAnnex {
    worktree: Vec<AnnexEntry>,
    refs: HashMap<String, Vec<AnnexEntry>>,
    calls: RefCell<Vec<FakeCall>>,
}

impl FakeAnnex {
    pub fn new() -> Self {
        Self::default()
    }

    /// An annexed file in the working tree.
    pub fn with_entry(mut self, entry: AnnexEntry) -> Self {
        self.worktree.push(entry);
        self
    }

    /// An annexed file recorded at `reference`.
    pub fn with_ref_entry(mut self, reference: &str, entry: AnnexEntry) -> Self {
        self.refs.entry(reference.to_string()).or_default().push(entry);
        self
    }

    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.borrow().clone()
    }
}

impl AnnexBackend for FakeAnnex {
    fn find(&self, paths: Option<&[String]>) -> ds_annex::Result<Vec<AnnexEntry>> {
        self.calls.borrow_mut().push(FakeCall::Find {
            paths: paths.map(<[String]>::to_vec),
        });
        Ok(self
            .worktree
            .iter()
            .filter(|e| selected(&e.file, paths))
            .cloned()
            .collect())
    }

    fn findref(&self, reference: &str) -> ds_annex::Result<Vec<AnnexEntry>> {
        self.calls.borrow_mut().push(FakeCall::FindRef {
            reference: reference.to_string(),
        });
        Ok(self.refs.get(reference).cloned().unwrap_or_default())
    }

    fn add(&self, paths: &[String], options: &AddOptions) -> ds_annex::Result<Vec<BackendOutcome>> {
        self.calls.borrow_mut().push(FakeCall::Add {
            paths: paths.to_vec(),
            options: options.clone(),
        });
        let to_git = options.to_git == Some(true);
        Ok(paths
            .iter()
            .map(|p| {
                let mut outcome = BackendOutcome::ok("add", p.as_str());
                if !to_git {
                    outcome.key = Some(format!("MD5E-s0--{}", p.replace('/', "_")));
                }
                outcome
            })
            .collect())
    }
}
