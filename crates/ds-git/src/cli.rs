//! `git` subprocess backend

use std::path::Path;
use std::process::{Command, Output};
use std::rc::Rc;

use ds_fs::DatasetPath;
use git2::Repository;

use crate::backend::{AddOptions, BackendOutcome, CommitOutcome, GitBackend};
use crate::modes::UntrackedMode;
use crate::{Error, Result};

/// Backend that shells out to the `git` executable for listings and
/// mutations, and uses `git2` for cheap repository inspection.
#[derive(Debug, Clone)]
pub struct CliGit {
    /// Canonical working tree root (where `.git` lives)
    root: DatasetPath,
}

impl CliGit {
    /// Open the repository whose working tree root is exactly `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let invalid = |reason: String| Error::InvalidNestedRepository {
            path: path.to_path_buf(),
            reason,
        };
        let root = DatasetPath::canonical(path).map_err(|e| invalid(e.to_string()))?;
        let repo = Repository::open(root.to_native()).map_err(|e| invalid(e.message().to_string()))?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| invalid("bare repository".to_string()))?;
        let workdir = DatasetPath::canonical(workdir).map_err(|e| invalid(e.to_string()))?;
        if workdir != root {
            return Err(invalid(format!("working tree root is {}", workdir)));
        }
        Ok(Self { root })
    }

    fn repository(&self) -> Result<Repository> {
        Ok(Repository::open(self.root.to_native())?)
    }

    /// Run a git command in the repository root.
    fn run(&self, args: &[&str], paths: Option<&[String]>) -> Result<Output> {
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(self.root.to_native());
        if let Some(paths) = paths {
            cmd.arg("--").args(paths);
        }
        tracing::debug!(
            repo = %self.root,
            command = %args.join(" "),
            paths = paths.map_or(0, |p| p.len()),
            "Running git"
        );
        Ok(cmd.output()?)
    }

    /// Run a git command and return its raw stdout, failing on a non-zero exit.
    fn git_command(&self, args: &[&str], paths: Option<&[String]>) -> Result<String> {
        let output = self.run(args, paths)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(Error::backend(
                format!("git {}", args.join(" ")),
                output.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&output.stderr).trim(),
            ))
        }
    }
}

/// Parse `<verb> '<path>'` lines as printed by `git add --verbose` and `git rm`.
fn parse_verbose_outcomes(stdout: &str, verb: &str) -> Vec<BackendOutcome> {
    let prefix = format!("{verb} '");
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix(&prefix)?.strip_suffix('\''))
        .map(|file| BackendOutcome::ok(verb, file))
        .collect()
}

impl GitBackend for CliGit {
    fn root(&self) -> &DatasetPath {
        &self.root
    }

    fn git_dir(&self) -> Result<DatasetPath> {
        let repo = self.repository()?;
        Ok(DatasetPath::new(repo.path()))
    }

    fn ls_files(&self, paths: Option<&[String]>, untracked: UntrackedMode) -> Result<String> {
        // --exclude-standard keeps ignored content out of untracked reports
        let mut args = vec!["ls-files", "--stage", "-z", "-d", "-m", "--exclude-standard"];
        match untracked {
            UntrackedMode::All => args.push("-o"),
            UntrackedMode::Normal => args.extend(["-o", "--directory"]),
            UntrackedMode::No => {}
        }
        self.git_command(&args, paths)
    }

    fn ls_tree(&self, paths: Option<&[String]>, reference: &str) -> Result<String> {
        self.git_command(&["ls-tree", reference, "-z", "-r", "--full-tree"], paths)
    }

    fn ls_modified(&self, paths: Option<&[String]>) -> Result<String> {
        self.git_command(&["ls-files", "-z", "-m"], paths)
    }

    fn head_revision(&self) -> Result<Option<String>> {
        let repo = self.repository()?;
        match repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?.id().to_string())),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn add(&self, paths: &[String], options: &AddOptions) -> Result<Vec<BackendOutcome>> {
        let args: &[&str] = if options.update {
            &["add", "--verbose", "--update"]
        } else {
            &["add", "--verbose"]
        };
        let stdout = self.git_command(args, Some(paths))?;
        Ok(parse_verbose_outcomes(&stdout, "add"))
    }

    fn remove(&self, paths: &[String]) -> Result<Vec<BackendOutcome>> {
        let stdout = self.git_command(&["rm", "--ignore-unmatch"], Some(paths))?;
        Ok(parse_verbose_outcomes(&stdout, "rm"))
    }

    fn commit(&self, paths: &[String], message: &str) -> Result<CommitOutcome> {
        // a preceding add may already have brought every path back to clean
        let staged = self.run(&["diff", "--cached", "--quiet"], Some(paths))?;
        if staged.status.success() {
            tracing::debug!(repo = %self.root, "Nothing to commit");
            return Ok(CommitOutcome::NothingToCommit);
        }
        self.git_command(&["commit", "--quiet", "-m", message], Some(paths))?;
        let revision = self.head_revision()?.unwrap_or_default();
        Ok(CommitOutcome::Committed { revision })
    }

    fn add_submodule(&self, path: &str) -> Result<()> {
        let url = format!("./{path}");
        self.git_command(&["submodule", "add", "--", &url, path], None)
            .map(|_| ())
            .map_err(|e| Error::RegistrationFailure {
                path: self.root.join(path).to_native(),
                message: match e {
                    Error::BackendQuery { stderr, .. } => stderr,
                    other => other.to_string(),
                },
            })
    }

    fn tag(&self, name: &str) -> Result<()> {
        let repo = self.repository()?;
        let head = repo.head()?.peel_to_commit()?;
        repo.tag_lightweight(name, head.as_object(), false)?;
        Ok(())
    }

    fn open_nested(&self, path: &DatasetPath) -> Result<Rc<dyn GitBackend>> {
        Ok(Rc::new(CliGit::open(path.to_native())?))
    }
}
