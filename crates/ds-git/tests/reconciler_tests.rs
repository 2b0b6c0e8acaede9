//! Status reconciliation against canned backends

use std::fs;
use std::rc::Rc;

use ds_fs::DatasetPath;
use ds_git::{
    DiffOptions, EntryType, GitRepo, Repository, State, StatusCache, SubmoduleMode, UntrackedMode,
};
use ds_test_utils::fake::{FakeCall, FakeGit};
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

const SHA_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
const SHA_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
const SHA_C: &str = "cccccccccccccccccccccccccccccccccccccccc";

fn repo(fake: &Rc<FakeGit>) -> GitRepo {
    GitRepo::new(Rc::clone(fake) as Rc<dyn ds_git::GitBackend>)
}

fn root_of(temp: &TempDir) -> DatasetPath {
    DatasetPath::canonical(temp.path()).unwrap()
}

fn options(untracked: UntrackedMode, submodules: SubmoduleMode) -> DiffOptions<'static> {
    DiffOptions::new(untracked, submodules)
}

// ============================================================================
// States
// ============================================================================

#[test]
fn every_state_is_classified() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(
        FakeGit::new(temp.path())
            .with_clean_file("clean.txt", SHA_A)
            .with_modified_file("changed.txt", SHA_B)
            .with_added_file("staged.txt", SHA_C)
            .with_untracked_file("new.txt")
            .with_untracked_dir("newdir", &["one.txt", "two.txt"])
            .with_tree_entry("HEAD", "unstaged_gone.txt", "100644", SHA_A)
            .with_index_entry("unstaged_gone.txt", "100644", SHA_A)
            .with_tree_entry("HEAD", "staged_gone.txt", "100644", SHA_B),
    );
    let root = root_of(&temp);
    let status = repo(&fake)
        .status(
            options(UntrackedMode::Normal, SubmoduleMode::No),
            &mut StatusCache::new(),
        )
        .unwrap();

    let state = |rel: &str| status[&root.join(rel)].state;
    assert_eq!(state("clean.txt"), State::Clean);
    assert_eq!(state("changed.txt"), State::Modified);
    assert_eq!(state("staged.txt"), State::Added);
    assert_eq!(state("new.txt"), State::Untracked);
    assert_eq!(state("newdir"), State::Untracked);
    assert_eq!(state("unstaged_gone.txt"), State::Deleted);
    assert_eq!(state("staged_gone.txt"), State::Deleted);
    assert_eq!(status[&root.join("newdir")].entry_type, EntryType::Directory);
    assert!(!status.contains_key(&root.join("newdir/one.txt")));
}

#[test]
fn revision_is_kept_only_where_meaningful() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(
        FakeGit::new(temp.path())
            .with_clean_file("clean.txt", SHA_A)
            .with_modified_file("changed.txt", SHA_B)
            .with_added_file("staged.txt", SHA_C)
            .with_tree_entry("HEAD", "staged_gone.txt", "100644", SHA_B),
    );
    let root = root_of(&temp);
    let status = repo(&fake)
        .status(DiffOptions::default(), &mut StatusCache::new())
        .unwrap();

    let sha = |rel: &str| status[&root.join(rel)].gitshasum.clone();
    assert_eq!(sha("clean.txt").as_deref(), Some(SHA_A));
    assert_eq!(sha("staged.txt").as_deref(), Some(SHA_C));
    assert_eq!(sha("changed.txt"), None);
    // a deletion already staged carries the revision it had
    assert_eq!(sha("staged_gone.txt").as_deref(), Some(SHA_B));
}

#[test]
fn untracked_all_lists_files_individually() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(FakeGit::new(temp.path()).with_untracked_dir("newdir", &["one.txt", "two.txt"]));
    let root = root_of(&temp);
    let status = repo(&fake)
        .status(
            options(UntrackedMode::All, SubmoduleMode::No),
            &mut StatusCache::new(),
        )
        .unwrap();

    assert_eq!(status[&root.join("newdir/one.txt")].state, State::Untracked);
    assert_eq!(status[&root.join("newdir/two.txt")].entry_type, EntryType::File);
    assert!(!status.contains_key(&root.join("newdir")));
}

#[test]
fn untracked_no_hides_untracked_content() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(
        FakeGit::new(temp.path())
            .with_clean_file("clean.txt", SHA_A)
            .with_untracked_file("new.txt"),
    );
    let status = repo(&fake)
        .status(
            options(UntrackedMode::No, SubmoduleMode::No),
            &mut StatusCache::new(),
        )
        .unwrap();
    assert_eq!(status.len(), 1);
    assert!(status.values().all(|r| r.is_clean()));
}

#[test]
fn unborn_head_reports_index_as_added() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(
        FakeGit::new(temp.path())
            .with_head(None)
            .with_added_file("first.txt", SHA_A),
    );
    let root = root_of(&temp);
    let status = repo(&fake)
        .status(DiffOptions::default(), &mut StatusCache::new())
        .unwrap();
    assert_eq!(status[&root.join("first.txt")].state, State::Added);
    assert!(!fake.calls().iter().any(|c| matches!(c, FakeCall::LsTree { .. })));
}

// ============================================================================
// Diff
// ============================================================================

#[test]
fn reference_compared_with_itself_is_all_clean() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(
        FakeGit::new(temp.path())
            .with_clean_file("a.txt", SHA_A)
            .with_modified_file("b.txt", SHA_B),
    );
    let status = repo(&fake)
        .diffstatus("HEAD", Some("HEAD"), DiffOptions::default(), &mut StatusCache::new())
        .unwrap();
    assert_eq!(status.len(), 2);
    assert!(status.values().all(|r| r.state == State::Clean));

    let diff = repo(&fake)
        .diff("HEAD", Some("HEAD"), DiffOptions::default(), &mut StatusCache::new())
        .unwrap();
    assert!(diff.is_empty());
}

#[test]
fn diff_between_references() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(
        FakeGit::new(temp.path())
            .with_tree_entry("v1", "kept.txt", "100644", SHA_A)
            .with_tree_entry("v1", "changed.txt", "100644", SHA_A)
            .with_tree_entry("v1", "dropped.txt", "100644", SHA_A)
            .with_tree_entry("v2", "kept.txt", "100644", SHA_A)
            .with_tree_entry("v2", "changed.txt", "100644", SHA_B)
            .with_tree_entry("v2", "fresh.txt", "100644", SHA_C),
    );
    // state of a path present at both ends is checked against the working tree
    for rel in ["kept.txt", "changed.txt"] {
        fs::write(temp.path().join(rel), "x").unwrap();
    }
    let root = root_of(&temp);

    let diff = repo(&fake)
        .diff("v1", Some("v2"), DiffOptions::default(), &mut StatusCache::new())
        .unwrap();
    assert_eq!(diff.len(), 3);
    assert_eq!(diff[&root.join("changed.txt")].state, State::Modified);
    assert_eq!(diff[&root.join("dropped.txt")].state, State::Deleted);
    assert_eq!(diff[&root.join("fresh.txt")].state, State::Added);
}

#[test]
fn unknown_reference_is_a_backend_error() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(FakeGit::new(temp.path()));
    let err = repo(&fake)
        .diff("nope", None, DiffOptions::default(), &mut StatusCache::new())
        .unwrap_err();
    assert!(matches!(err, ds_git::Error::BackendQuery { code: 128, .. }));
}

// ============================================================================
// Path constraints
// ============================================================================

#[test]
fn empty_path_list_queries_nothing() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(FakeGit::new(temp.path()).with_untracked_file("new.txt"));
    let paths: Vec<DatasetPath> = Vec::new();
    let status = repo(&fake)
        .status(
            DiffOptions::default().with_paths(Some(&paths)),
            &mut StatusCache::new(),
        )
        .unwrap();
    assert!(status.is_empty());
    assert_eq!(fake.listing_calls(), 0);

    let status = repo(&fake)
        .status(DiffOptions::default(), &mut StatusCache::new())
        .unwrap();
    assert_eq!(status.len(), 1);
}

#[test]
fn paths_are_passed_relative_to_the_root() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(
        FakeGit::new(temp.path())
            .with_clean_file("a.txt", SHA_A)
            .with_clean_file("dir/b.txt", SHA_B),
    );
    let root = root_of(&temp);
    let paths = vec![root.join("dir")];
    let status = repo(&fake)
        .status(
            DiffOptions::default().with_paths(Some(&paths)),
            &mut StatusCache::new(),
        )
        .unwrap();
    assert_eq!(status.keys().collect::<Vec<_>>(), vec![&root.join("dir/b.txt")]);
    assert!(fake.calls().contains(&FakeCall::LsModified {
        paths: Some(vec!["dir".to_string()])
    }));
}

#[rstest]
#[case::nested_not_requested(&["sub/inner.txt", "a.txt"], false)]
#[case::nested_requested(&["sub", "a.txt"], true)]
fn reference_listing_drops_unrequested_nested_repositories(
    #[case] requested: &[&str],
    #[case] keeps_nested: bool,
) {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(
        FakeGit::new(temp.path())
            .with_clean_file("a.txt", SHA_A)
            .with_submodule("sub", SHA_B),
    );
    let root = root_of(&temp);
    let paths: Vec<DatasetPath> = requested.iter().map(|rel| root.join(rel)).collect();
    let info = repo(&fake)
        .content_info(Some(&paths), Some("HEAD"), UntrackedMode::All)
        .unwrap();
    assert!(info.contains_key(&root.join("a.txt")));
    assert_eq!(info.contains_key(&root.join("sub")), keeps_nested);
}

#[test]
fn path_outside_repository_is_rejected() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(FakeGit::new(temp.path()));
    let outside = vec![DatasetPath::new("/somewhere/else")];
    let err = repo(&fake)
        .content_info(Some(&outside), None, UntrackedMode::All)
        .unwrap_err();
    assert!(matches!(err, ds_git::Error::PathOutsideDataset { .. }));
}

// ============================================================================
// Nested repositories
// ============================================================================

/// Parent with nested repositories `a` and `b`; `a` holds `a/deep`, which has
/// a modified file. Returns the parent and the three nested backends.
fn three_levels(temp: &TempDir) -> (Rc<FakeGit>, Rc<FakeGit>, Rc<FakeGit>, Rc<FakeGit>) {
    for dir in ["a/deep", "b"] {
        fs::create_dir_all(temp.path().join(dir)).unwrap();
    }
    let deep = Rc::new(
        FakeGit::new(temp.path().join("a/deep"))
            .with_head(Some(SHA_C))
            .with_modified_file("data.txt", SHA_A),
    );
    let a = Rc::new(
        FakeGit::new(temp.path().join("a"))
            .with_head(Some(SHA_A))
            .with_submodule("deep", SHA_C)
            .with_nested("deep", Rc::clone(&deep)),
    );
    let b = Rc::new(
        FakeGit::new(temp.path().join("b"))
            .with_head(Some(SHA_B))
            .with_clean_file("x.txt", SHA_A),
    );
    let parent = Rc::new(
        FakeGit::new(temp.path())
            .with_submodule("a", SHA_A)
            .with_submodule("b", SHA_B)
            .with_nested("a", Rc::clone(&a))
            .with_nested("b", Rc::clone(&b)),
    );
    (parent, a, deep, b)
}

#[test]
fn modification_deep_down_marks_every_ancestor() {
    let temp = TempDir::new().unwrap();
    let (parent, a, _deep, _b) = three_levels(&temp);
    let root = root_of(&temp);
    let status = repo(&parent)
        .status(
            options(UntrackedMode::All, SubmoduleMode::No),
            &mut StatusCache::new(),
        )
        .unwrap();
    assert_eq!(status[&root.join("a")].state, State::Modified);
    assert_eq!(status[&root.join("a")].gitshasum, None);
    assert_eq!(status[&root.join("b")].state, State::Clean);

    let a_status = repo(&a)
        .status(DiffOptions::default(), &mut StatusCache::new())
        .unwrap();
    assert_eq!(a_status[&root.join("a/deep")].state, State::Modified);
}

#[test]
fn first_modified_nested_repository_stops_the_search() {
    let temp = TempDir::new().unwrap();
    let (parent, _a, deep, b) = three_levels(&temp);
    let status = repo(&parent)
        .status(
            options(UntrackedMode::All, SubmoduleMode::Other),
            &mut StatusCache::new(),
        )
        .unwrap();
    assert!(status.values().any(|r| r.state == State::Modified));
    assert!(deep.listing_calls() > 0);
    assert_eq!(b.listing_calls(), 0);
}

#[test]
fn exhaustive_mode_visits_every_nested_repository() {
    let temp = TempDir::new().unwrap();
    let (parent, _a, _deep, b) = three_levels(&temp);
    repo(&parent)
        .status(
            options(UntrackedMode::All, SubmoduleMode::No),
            &mut StatusCache::new(),
        )
        .unwrap();
    assert!(b.listing_calls() > 0);
}

#[test]
fn ignoring_nested_repositories_skips_them_entirely() {
    let temp = TempDir::new().unwrap();
    let (parent, a, _deep, b) = three_levels(&temp);
    let root = root_of(&temp);
    let status = repo(&parent)
        .status(
            options(UntrackedMode::All, SubmoduleMode::All),
            &mut StatusCache::new(),
        )
        .unwrap();
    assert!(!status.contains_key(&root.join("a")));
    assert!(!status.contains_key(&root.join("b")));
    assert_eq!(a.listing_calls() + b.listing_calls(), 0);
}

#[test]
fn moved_nested_head_is_modified_without_listing() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("sub")).unwrap();
    let sub = Rc::new(FakeGit::new(temp.path().join("sub")).with_head(Some(SHA_C)));
    let parent = Rc::new(
        FakeGit::new(temp.path())
            .with_submodule("sub", SHA_B)
            .with_nested("sub", Rc::clone(&sub)),
    );
    let root = root_of(&temp);
    let status = repo(&parent)
        .status(DiffOptions::default(), &mut StatusCache::new())
        .unwrap();
    assert_eq!(status[&root.join("sub")].state, State::Modified);
    assert_eq!(sub.listing_calls(), 0);
}

#[test]
fn untracked_mode_reaches_nested_repositories() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("sub")).unwrap();
    let sub = Rc::new(
        FakeGit::new(temp.path().join("sub"))
            .with_head(Some(SHA_B))
            .with_untracked_file("scratch.txt"),
    );
    let parent = Rc::new(
        FakeGit::new(temp.path())
            .with_submodule("sub", SHA_B)
            .with_nested("sub", sub),
    );
    let root = root_of(&temp);

    let status = repo(&parent)
        .status(
            options(UntrackedMode::Normal, SubmoduleMode::No),
            &mut StatusCache::new(),
        )
        .unwrap();
    assert_eq!(status[&root.join("sub")].state, State::Modified);

    let status = repo(&parent)
        .status(
            options(UntrackedMode::No, SubmoduleMode::No),
            &mut StatusCache::new(),
        )
        .unwrap();
    assert_eq!(status[&root.join("sub")].state, State::Clean);
}

#[test]
fn uninitialized_nested_location_is_skipped() {
    let temp = TempDir::new().unwrap();
    let parent = Rc::new(FakeGit::new(temp.path()).with_submodule("sub", SHA_B));
    let root = root_of(&temp);
    let status = repo(&parent)
        .status(DiffOptions::default(), &mut StatusCache::new())
        .unwrap();
    assert_eq!(status[&root.join("sub")].state, State::Clean);
}

#[test]
fn dirty_sees_nested_changes() {
    let temp = TempDir::new().unwrap();
    let (parent, _a, _deep, b) = three_levels(&temp);
    assert!(repo(&parent).dirty().unwrap());
    assert!(!repo(&b).dirty().unwrap());
}

// ============================================================================
// Cache
// ============================================================================

#[test]
fn shared_cache_answers_repeated_queries() {
    let temp = TempDir::new().unwrap();
    let (parent, _a, deep, _b) = three_levels(&temp);
    let mut cache = StatusCache::new();
    let git = repo(&parent);

    git.status(DiffOptions::default(), &mut cache).unwrap();
    let parent_calls = parent.listing_calls();
    let deep_calls = deep.listing_calls();
    assert!(!cache.is_empty());

    git.status(DiffOptions::default(), &mut cache).unwrap();
    assert_eq!(parent.listing_calls(), parent_calls);
    assert_eq!(deep.listing_calls(), deep_calls);
}

#[test]
fn distinct_untracked_modes_are_cached_separately() {
    let temp = TempDir::new().unwrap();
    let fake = Rc::new(FakeGit::new(temp.path()).with_untracked_dir("d", &["f.txt"]));
    let mut cache = StatusCache::new();
    let git = repo(&fake);

    let normal = git
        .status(options(UntrackedMode::Normal, SubmoduleMode::No), &mut cache)
        .unwrap();
    let all = git
        .status(options(UntrackedMode::All, SubmoduleMode::No), &mut cache)
        .unwrap();
    assert_ne!(normal.keys().collect::<Vec<_>>(), all.keys().collect::<Vec<_>>());
}
