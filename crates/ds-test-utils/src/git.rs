//! Git repository fixtures at three realism levels.
//!
//! Choose the lowest-realism fixture that satisfies your test's needs.
//! Fakes are faster and have fewer external dependencies.

use std::fs;
use std::path::Path;
use std::process::Command;

/// Run `git` with `args` in `path` and return its stdout.
///
/// # Panics
/// Panics if git cannot be spawned or exits unsuccessfully.
pub fn git(path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .output()
        .unwrap_or_else(|e| panic!("git: failed to run `git {args:?}`: {e}"));
    if !output.status.success() {
        panic!(
            "git: `git {args:?}` failed in {}:\n{}",
            path.display(),
            String::from_utf8_lossy(&output.stderr)
        );
    }
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Creates a minimal `.git` directory structure **without** initialising a real
/// git repository.
///
/// Realism level: **FAKE** - directory structure only, no git object store.
///
/// Use for: tests that need a `.git` marker to satisfy path detection logic but
/// must be rejected when opened as a repository.
///
/// # Panics
/// Panics if the filesystem operations fail.
pub fn fake_git_dir(path: &Path) {
    fs::create_dir_all(path.join(".git"))
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to create .git: {e}"));
    fs::write(path.join(".git/HEAD"), "ref: refs/heads/main\n")
        .unwrap_or_else(|e| panic!("fake_git_dir: failed to write HEAD: {e}"));
}

/// Initialises a real git repository with local identity settings and no
/// commits, using the `git` CLI.
///
/// Realism level: **REAL** - valid git object store, unborn `HEAD`.
///
/// # Panics
/// Panics if any git operation fails.
pub fn real_git_repo(path: &Path) {
    fs::create_dir_all(path)
        .unwrap_or_else(|e| panic!("real_git_repo: failed to create {}: {e}", path.display()));
    git(path, &["init", "--quiet"]);
    git(path, &["config", "user.email", "test@test.com"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["config", "commit.gpgsign", "false"]);
    // registering a nested repository by local path
    git(path, &["config", "protocol.file.allow", "always"]);
}

/// Initialises a real git repository with an initial commit.
///
/// Realism level: **REAL WITH HISTORY** - one commit containing `README.md`.
///
/// # Panics
/// Panics if any git operation fails.
pub fn real_git_repo_with_commit(path: &Path) {
    real_git_repo(path);
    fs::write(path.join("README.md"), "# Test")
        .unwrap_or_else(|e| panic!("real_git_repo_with_commit: failed to write README.md: {e}"));
    commit_all(path, "Initial commit");
}

/// Stage everything in `path` and commit it.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_all(path: &Path, message: &str) {
    git(path, &["add", "--all"]);
    git(path, &["commit", "--quiet", "-m", message]);
}

/// Current `HEAD` revision of the repository at `path`.
///
/// # Panics
/// Panics if the repository has no commits.
pub fn head_revision(path: &Path) -> String {
    git(path, &["rev-parse", "HEAD"]).trim().to_string()
}

/// Number of commits reachable from `HEAD`.
///
/// # Panics
/// Panics if the repository has no commits.
pub fn commit_count(path: &Path) -> usize {
    git(path, &["rev-list", "--count", "HEAD"])
        .trim()
        .parse()
        .unwrap_or_else(|e| panic!("commit_count: unexpected rev-list output: {e}"))
}

/// Subject line of the most recent commit.
pub fn last_commit_message(path: &Path) -> String {
    git(path, &["log", "-1", "--format=%s"]).trim().to_string()
}
