//! Dataset-level status, diff and save against real git repositories

use std::path::PathBuf;

use ds_core::{
    Action, AnnexReport, Dataset, DiffRequest, EntryType, Error, NOT_UNDERNEATH, ResultRecord,
    ResultStatus, SaveOptions, State, StatusOptions, UntrackedMode, diff, save, status,
};
use ds_test_utils::git::{
    commit_count, git, head_revision, last_commit_message, real_git_repo_with_commit,
};
use ds_test_utils::repo::TestDataset;
use pretty_assertions::assert_eq;
use rstest::rstest;

/// Path of `record` relative to the dataset it was reported for.
fn rel(ds: &Dataset, record: &ResultRecord) -> String {
    record
        .path
        .as_ref()
        .and_then(|p| p.relative_to(ds.path()))
        .map(|p| p.to_string())
        .unwrap_or_default()
}

fn find<'a>(ds: &Dataset, records: &'a [ResultRecord], path: &str) -> Option<&'a ResultRecord> {
    records.iter().find(|r| rel(ds, r) == path)
}

fn paths(ds: &Dataset, records: &[ResultRecord]) -> Vec<String> {
    records.iter().map(|r| rel(ds, r)).collect()
}

fn with_paths(paths: &[&str]) -> Option<Vec<PathBuf>> {
    Some(paths.iter().map(PathBuf::from).collect())
}

/// Dataset with `sub` nested in it and `sub/subsub` nested in `sub`.
fn two_levels() -> TestDataset {
    let tds = TestDataset::new();
    let sub = tds.add_nested("sub");
    real_git_repo_with_commit(&sub.join("subsub"));
    git(&sub, &["submodule", "add", "--quiet", "--", "./subsub", "subsub"]);
    git(&sub, &["commit", "--quiet", "-m", "Register subsub"]);
    tds.commit("Update sub");
    tds
}

// ============================================================================
// Opening
// ============================================================================

#[test]
fn open_rejects_plain_directory() {
    let tds = TestDataset::new();
    let plain = tds.scratch().join("plain");
    std::fs::create_dir_all(&plain).unwrap();
    let err = Dataset::open(&plain).unwrap_err();
    assert!(matches!(err, Error::NoDataset { .. }));
    assert!(matches!(
        Dataset::open(tds.scratch().join("missing")),
        Err(Error::NoDataset { .. })
    ));
}

#[test]
fn discover_finds_enclosing_dataset() {
    let tds = TestDataset::new();
    tds.write("deep/dir/file.txt", "x");
    let ds = Dataset::discover(tds.path("deep/dir")).unwrap();
    assert_eq!(ds.root(), &tds.dpath("."));
}

// ============================================================================
// Status
// ============================================================================

#[test]
fn status_reports_every_path_with_refds() {
    let tds = TestDataset::new();
    tds.write("new.txt", "new");
    let ds = Dataset::open(tds.root()).unwrap();

    let results = status(&ds, &StatusOptions::default()).unwrap();
    assert_eq!(results.len(), 2);
    let readme = find(&ds, &results, "README.md").unwrap();
    assert_eq!(readme.action, Action::Status);
    assert_eq!(readme.status, ResultStatus::Ok);
    assert_eq!(readme.state, Some(State::Clean));
    assert_eq!(readme.entry_type, Some(EntryType::File));
    assert_eq!(readme.refds.as_ref(), Some(ds.path()));
    assert_eq!(find(&ds, &results, "new.txt").unwrap().state, Some(State::Untracked));
}

#[test]
fn outside_path_is_reported_as_error() {
    let tds = TestDataset::new();
    let ds = Dataset::open(tds.root()).unwrap();
    let outside = tds.scratch().join("elsewhere.txt");

    let results = status(
        &ds,
        &StatusOptions {
            paths: Some(vec![outside, PathBuf::from("README.md")]),
            ..StatusOptions::default()
        },
    )
    .unwrap();
    assert_eq!(results.len(), 2);
    let error = &results[0];
    assert_eq!(error.status, ResultStatus::Error);
    assert_eq!(error.message.as_deref(), Some(NOT_UNDERNEATH));
    assert!(error.is_error());
    assert_eq!(rel(&ds, &results[1]), "README.md");
}

#[test]
fn dataset_root_request_covers_everything() {
    let tds = TestDataset::new();
    tds.write("a.txt", "a");
    let ds = Dataset::open(tds.root()).unwrap();

    let everything = status(&ds, &StatusOptions::default()).unwrap();
    let dot = status(
        &ds,
        &StatusOptions {
            paths: with_paths(&["."]),
            ..StatusOptions::default()
        },
    )
    .unwrap();
    assert_eq!(paths(&ds, &dot), paths(&ds, &everything));
}

#[test]
fn overlapping_requests_report_once() {
    let tds = TestDataset::new();
    tds.write("dir/a.txt", "a");
    tds.write("dir/b.txt", "b");
    tds.commit("dir");
    let ds = Dataset::open(tds.root()).unwrap();

    let results = status(
        &ds,
        &StatusOptions {
            paths: with_paths(&["dir", "dir/a.txt", "dir"]),
            ..StatusOptions::default()
        },
    )
    .unwrap();
    let mut reported = paths(&ds, &results);
    reported.sort();
    assert_eq!(reported, vec!["dir/a.txt", "dir/b.txt"]);
}

#[cfg(unix)]
#[test]
fn symlinked_dataset_reports_under_link() {
    let tds = TestDataset::new();
    let link = tds.scratch().join("link");
    std::os::unix::fs::symlink(tds.root(), &link).unwrap();
    let ds = Dataset::open(&link).unwrap();
    assert_eq!(ds.root(), &tds.dpath("."));

    let results = status(
        &ds,
        &StatusOptions {
            paths: with_paths(&["README.md"]),
            ..StatusOptions::default()
        },
    )
    .unwrap();
    assert_eq!(results.len(), 1);
    let path = results[0].path.as_ref().unwrap();
    assert!(path.starts_with(ds.path()));
    assert_eq!(rel(&ds, &results[0]), "README.md");

    let through_link = link.join("README.md");
    for input in [PathBuf::from("."), link.clone(), through_link] {
        let results = status(
            &ds,
            &StatusOptions {
                paths: Some(vec![input.clone()]),
                ..StatusOptions::default()
            },
        )
        .unwrap();
        assert!(results.iter().all(|r| !r.is_error()), "{input:?} was rejected");
        assert!(results.iter().all(|r| r.path.as_ref().is_some_and(|p| p.starts_with(ds.path()))));
        let readme = find(&ds, &results, "README.md").unwrap();
        assert_eq!(readme.state, Some(State::Clean));
    }
}

#[test]
fn deep_path_is_answered_by_nested_dataset() {
    let tds = TestDataset::new();
    tds.add_nested("sub");
    tds.write("sub/README.md", "changed");
    let ds = Dataset::open(tds.root()).unwrap();

    let results = status(
        &ds,
        &StatusOptions {
            paths: with_paths(&["sub/README.md"]),
            ..StatusOptions::default()
        },
    )
    .unwrap();
    assert_eq!(paths(&ds, &results), vec!["sub/README.md"]);
    assert_eq!(results[0].state, Some(State::Modified));
}

#[test]
fn nested_dataset_is_one_entry_without_recursion() {
    let tds = TestDataset::new();
    tds.add_nested("sub");
    tds.write("sub/new.txt", "new");
    let ds = Dataset::open(tds.root()).unwrap();

    let results = status(&ds, &StatusOptions::default()).unwrap();
    let sub = find(&ds, &results, "sub").unwrap();
    assert_eq!(sub.entry_type, Some(EntryType::Dataset));
    assert_eq!(sub.state, Some(State::Modified));
    assert!(find(&ds, &results, "sub/new.txt").is_none());

    let results = status(
        &ds,
        &StatusOptions {
            recursive: true,
            ..StatusOptions::default()
        },
    )
    .unwrap();
    assert_eq!(
        find(&ds, &results, "sub/new.txt").unwrap().state,
        Some(State::Untracked)
    );
}

#[rstest]
#[case::unlimited(None, true)]
#[case::negative(Some(-1), true)]
#[case::one_level(Some(1), false)]
fn recursion_limit_bounds_nesting(#[case] limit: Option<i32>, #[case] reaches_depth_two: bool) {
    let tds = two_levels();
    let ds = Dataset::open(tds.root()).unwrap();

    let results = status(
        &ds,
        &StatusOptions {
            recursive: true,
            recursion_limit: limit,
            ..StatusOptions::default()
        },
    )
    .unwrap();
    assert!(find(&ds, &results, "sub").is_some());
    assert!(find(&ds, &results, "sub/subsub").is_some());
    assert_eq!(
        find(&ds, &results, "sub/subsub/README.md").is_some(),
        reaches_depth_two
    );
}

#[test]
fn zero_recursion_limit_stays_at_top() {
    let tds = two_levels();
    let ds = Dataset::open(tds.root()).unwrap();
    let results = status(
        &ds,
        &StatusOptions {
            recursive: true,
            recursion_limit: Some(0),
            ..StatusOptions::default()
        },
    )
    .unwrap();
    assert!(find(&ds, &results, "sub/README.md").is_none());
}

#[test]
fn configuration_supplies_untracked_default() {
    let tds = TestDataset::new();
    tds.write_config("[status]\nuntracked = \"no\"\n");
    tds.write("loose.txt", "x");
    let ds = Dataset::open(tds.root()).unwrap();
    assert_eq!(ds.config().status.untracked, UntrackedMode::No);

    let results = status(&ds, &StatusOptions::default()).unwrap();
    assert!(find(&ds, &results, "loose.txt").is_none());

    let results = status(
        &ds,
        &StatusOptions {
            untracked: Some(UntrackedMode::Normal),
            ..StatusOptions::default()
        },
    )
    .unwrap();
    assert!(find(&ds, &results, "loose.txt").is_some());
}

#[test]
fn annex_report_is_ignored_without_store() {
    let tds = TestDataset::new();
    let ds = Dataset::open(tds.root()).unwrap();
    let results = status(
        &ds,
        &StatusOptions {
            annex: AnnexReport::Availability,
            ..StatusOptions::default()
        },
    )
    .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].annex.is_none());
}

// ============================================================================
// Diff
// ============================================================================

#[test]
fn diff_between_revisions_reports_changes_only() {
    let tds = TestDataset::new();
    tds.write("a.txt", "one");
    tds.commit("a");
    tds.write("a.txt", "two");
    tds.commit("change a");
    let ds = Dataset::open(tds.root()).unwrap();

    let results = diff(
        &ds,
        &DiffRequest {
            from: "HEAD~1".to_string(),
            to: Some("HEAD".to_string()),
            ..DiffRequest::default()
        },
    )
    .unwrap();
    assert_eq!(paths(&ds, &results), vec!["a.txt"]);
    assert_eq!(results[0].action, Action::Diff);
    assert_eq!(results[0].state, Some(State::Modified));
}

#[test]
fn diff_against_worktree_skips_clean() {
    let tds = TestDataset::new();
    let ds = Dataset::open(tds.root()).unwrap();
    assert!(diff(&ds, &DiffRequest::default()).unwrap().is_empty());
}

// ============================================================================
// Save
// ============================================================================

#[test]
fn save_records_changes() {
    let tds = TestDataset::new();
    tds.write("new.txt", "new");
    let ds = Dataset::open(tds.root()).unwrap();

    let results = save(
        &ds,
        &SaveOptions {
            message: Some("add new".to_string()),
            ..SaveOptions::default()
        },
    )
    .unwrap();
    assert!(results.iter().all(|r| !r.is_error()));
    let saved = results.iter().find(|r| r.action == Action::Save).unwrap();
    assert_eq!(saved.status, ResultStatus::Ok);
    assert_eq!(saved.gitshasum.as_deref(), Some(head_revision(tds.root()).as_str()));
    assert_eq!(last_commit_message(tds.root()), "add new");
    assert_eq!(commit_count(tds.root()), 2);

    let after = status(&ds, &StatusOptions::default()).unwrap();
    assert!(after.iter().all(|r| r.state == Some(State::Clean)));
}

#[test]
fn save_uses_configured_message() {
    let tds = TestDataset::new();
    tds.write_config("[save]\nmessage = \"configured\"\n");
    tds.write("x.txt", "x");
    let ds = Dataset::open(tds.root()).unwrap();

    save(&ds, &SaveOptions::default()).unwrap();
    assert_eq!(last_commit_message(tds.root()), "configured");
}

#[test]
fn save_reads_message_file() {
    let tds = TestDataset::new();
    let file = tds.scratch().join("msg.txt");
    std::fs::write(&file, "from a file\n").unwrap();
    tds.write("x.txt", "x");
    let ds = Dataset::open(tds.root()).unwrap();

    save(
        &ds,
        &SaveOptions {
            message_file: Some(file),
            ..SaveOptions::default()
        },
    )
    .unwrap();
    assert_eq!(last_commit_message(tds.root()), "from a file");
}

#[test]
fn message_and_message_file_conflict() {
    let tds = TestDataset::new();
    let ds = Dataset::open(tds.root()).unwrap();
    let err = save(
        &ds,
        &SaveOptions {
            message: Some("inline".to_string()),
            message_file: Some(tds.scratch().join("msg.txt")),
            ..SaveOptions::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::ConflictingMessage));
    assert_eq!(commit_count(tds.root()), 1);
}

#[test]
fn updated_save_leaves_untracked_content() {
    let tds = TestDataset::new();
    tds.write("README.md", "changed");
    tds.write("loose.txt", "x");
    let ds = Dataset::open(tds.root()).unwrap();

    save(
        &ds,
        &SaveOptions {
            updated: true,
            ..SaveOptions::default()
        },
    )
    .unwrap();
    let after = status(&ds, &StatusOptions::default()).unwrap();
    assert_eq!(find(&ds, &after, "README.md").unwrap().state, Some(State::Clean));
    assert_eq!(
        find(&ds, &after, "loose.txt").unwrap().state,
        Some(State::Untracked)
    );
}

#[test]
fn saving_deep_path_updates_parent() {
    let tds = TestDataset::new();
    let sub = tds.add_nested("sub");
    tds.write("sub/data.txt", "data");
    let ds = Dataset::open(tds.root()).unwrap();

    let results = save(
        &ds,
        &SaveOptions {
            paths: with_paths(&["sub/data.txt"]),
            ..SaveOptions::default()
        },
    )
    .unwrap();
    assert_eq!(results.iter().filter(|r| r.action == Action::Save).count(), 2);
    assert_eq!(commit_count(&sub), 2);
    assert_eq!(
        tds.git(&["rev-parse", "HEAD:sub"]).trim(),
        head_revision(&sub)
    );
}

#[test]
fn recursive_save_commits_nested_first() {
    let tds = two_levels();
    tds.write("sub/subsub/deep.txt", "deep");
    tds.write("top.txt", "top");
    let ds = Dataset::open(tds.root()).unwrap();

    save(
        &ds,
        &SaveOptions {
            message: Some("everything".to_string()),
            recursive: true,
            ..SaveOptions::default()
        },
    )
    .unwrap();
    let sub = tds.path("sub");
    let subsub = tds.path("sub/subsub");
    assert_eq!(last_commit_message(&subsub), "everything");
    assert_eq!(git(&sub, &["rev-parse", "HEAD:subsub"]).trim(), head_revision(&subsub));
    assert_eq!(tds.git(&["rev-parse", "HEAD:sub"]).trim(), head_revision(&sub));

    let after = status(
        &ds,
        &StatusOptions {
            recursive: true,
            ..StatusOptions::default()
        },
    )
    .unwrap();
    assert!(after.iter().all(|r| r.state == Some(State::Clean)), "{after:?}");
}

#[test]
fn version_tag_applies_to_top_dataset() {
    let tds = TestDataset::new();
    tds.write("x.txt", "x");
    let ds = Dataset::open(tds.root()).unwrap();

    let results = save(
        &ds,
        &SaveOptions {
            version_tag: Some("v1.0".to_string()),
            ..SaveOptions::default()
        },
    )
    .unwrap();
    let tag = results.iter().find(|r| r.action == Action::Tag).unwrap();
    assert_eq!(tag.message.as_deref(), Some("v1.0"));
    assert_eq!(tds.git(&["tag", "--list"]).trim(), "v1.0");
}

#[test]
fn save_outside_path_commits_nothing() {
    let tds = TestDataset::new();
    let ds = Dataset::open(tds.root()).unwrap();
    let results = save(
        &ds,
        &SaveOptions {
            paths: Some(vec![tds.scratch().join("elsewhere")]),
            ..SaveOptions::default()
        },
    )
    .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].message.as_deref(), Some(NOT_UNDERNEATH));
    assert_eq!(commit_count(tds.root()), 1);
}
