//! [`TestDataset`] builder for real git-backed dataset scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use ds_fs::DatasetPath;
use tempfile::TempDir;

use crate::git::{commit_all, git, real_git_repo, real_git_repo_with_commit};

/// A temporary dataset: a real git repository with an initial commit.
///
/// # Example
///
/// ```rust,no_run
/// use ds_test_utils::repo::TestDataset;
///
/// let ds = TestDataset::new();
/// ds.write("data/a.txt", "content");
/// ds.commit("add data");
/// let sub = ds.add_nested("sub");
/// ds.assert_file_exists("sub/README.md");
/// ```
pub struct TestDataset {
    temp_dir: TempDir,
    root: PathBuf,
}

impl Default for TestDataset {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDataset {
    /// Create a dataset with one commit containing `README.md`.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("ds");
        real_git_repo_with_commit(&root);
        Self { temp_dir, root }
    }

    /// Create a dataset whose `HEAD` is unborn.
    pub fn empty() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("ds");
        real_git_repo(&root);
        Self { temp_dir, root }
    }

    /// Root of the dataset's working tree.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory containing the dataset, for placing outside paths and links.
    pub fn scratch(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Absolute filesystem path of `rel`.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Canonical [`DatasetPath`] of `rel`, as the status engine reports it.
    pub fn dpath(&self, rel: &str) -> DatasetPath {
        let root = DatasetPath::canonical(&self.root).unwrap();
        if rel == "." { root } else { root.join(rel) }
    }

    /// Write `content` to `rel`, creating parent directories.
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("TestDataset::write: {}: {e}", path.display()));
    }

    /// Delete the file at `rel` from the working tree.
    pub fn remove(&self, rel: &str) {
        fs::remove_file(self.path(rel)).unwrap();
    }

    /// Stage everything and commit.
    pub fn commit(&self, message: &str) {
        commit_all(&self.root, message);
    }

    /// Run git in the dataset root.
    pub fn git(&self, args: &[&str]) -> String {
        git(&self.root, args)
    }

    /// Create a repository with one commit at `rel` and register it as a
    /// nested repository of this dataset, committing the registration.
    ///
    /// Returns the nested repository's root.
    pub fn add_nested(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        real_git_repo_with_commit(&path);
        git(&self.root, &["submodule", "add", "--quiet", "--", &format!("./{rel}"), rel]);
        git(&self.root, &["commit", "--quiet", "-m", &format!("Register {rel}")]);
        path
    }

    /// Create a repository with one commit at `rel` without registering it.
    pub fn add_untracked_repo(&self, rel: &str) -> PathBuf {
        let path = self.path(rel);
        real_git_repo_with_commit(&path);
        path
    }

    /// Write the dataset configuration file.
    pub fn write_config(&self, toml: &str) {
        self.write(".dataset/config.toml", toml);
    }

    /// Assert that `rel` exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if the path does not exist.
    pub fn assert_file_exists(&self, rel: &str) {
        let full_path = self.path(rel);
        assert!(
            full_path.exists(),
            "Expected file to exist: {}",
            full_path.display()
        );
    }

    /// Assert that the file at `rel` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, rel: &str, content: &str) {
        let full_path = self.path(rel);
        let file_content = fs::read_to_string(&full_path)
            .unwrap_or_else(|_| panic!("Could not read file: {}", full_path.display()));
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            full_path.display(),
            content,
            file_content
        );
    }
}
