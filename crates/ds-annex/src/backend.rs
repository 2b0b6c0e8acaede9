//! Content-store backend interface and its `git annex` implementation

use std::process::Command;

use ds_fs::DatasetPath;
use ds_git::{AddOptions, AnnexProps, BackendOutcome};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// One annexed file as reported by `git annex find --json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnnexEntry {
    /// Path relative to the repository root.
    pub file: String,
    pub key: String,
    /// Size in bytes as a decimal string; absent or non-numeric when unknown.
    #[serde(default)]
    pub bytesize: Option<String>,
    #[serde(default)]
    pub backend: Option<String>,
    #[serde(default)]
    pub hashdirmixed: Option<String>,
    #[serde(default)]
    pub hashdirlower: Option<String>,
}

impl AnnexEntry {
    pub fn new(file: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            key: key.into(),
            bytesize: None,
            backend: None,
            hashdirmixed: None,
            hashdirlower: None,
        }
    }

    pub fn size(&self) -> Option<u64> {
        self.bytesize.as_deref()?.parse().ok()
    }

    /// Content-store properties for this entry, not yet probed for availability.
    pub fn props(&self) -> AnnexProps {
        AnnexProps {
            key: self.key.clone(),
            bytesize: self.size(),
            backend: self.backend.clone(),
            has_content: None,
            objloc: None,
            hashdir_mixed: self.hashdirmixed.clone(),
            hashdir_lower: self.hashdirlower.clone(),
        }
    }
}

/// Raw access to a repository's content store.
///
/// Path arguments are relative to the repository root in POSIX notation.
pub trait AnnexBackend {
    /// Annexed files in the working tree, whether or not content is present.
    fn find(&self, paths: Option<&[String]>) -> Result<Vec<AnnexEntry>>;

    /// Annexed files recorded at `reference`.
    fn findref(&self, reference: &str) -> Result<Vec<AnnexEntry>>;

    /// Add content, routed by `options.to_git` or by the store's own rules.
    fn add(&self, paths: &[String], options: &AddOptions) -> Result<Vec<BackendOutcome>>;
}

/// Backend that shells out to `git annex`.
#[derive(Debug, Clone)]
pub struct CliAnnex {
    root: DatasetPath,
}

/// `git annex add --json` record.
#[derive(Debug, Deserialize)]
struct AddRecord {
    #[serde(default)]
    command: Option<String>,
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    success: bool,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    note: Option<String>,
    #[serde(default, rename = "error-messages")]
    error_messages: Vec<String>,
}

impl From<AddRecord> for BackendOutcome {
    fn from(record: AddRecord) -> Self {
        let message = if record.error_messages.is_empty() {
            record.note
        } else {
            Some(record.error_messages.join("\n"))
        };
        BackendOutcome {
            command: record.command.unwrap_or_else(|| "add".to_string()),
            file: record.file,
            success: record.success,
            key: record.key,
            message,
        }
    }
}

/// Parse newline-delimited JSON records.
pub(crate) fn parse_json_lines<T: DeserializeOwned>(stdout: &str) -> Result<Vec<T>> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).map_err(Error::from))
        .collect()
}

impl CliAnnex {
    pub fn new(root: DatasetPath) -> Self {
        Self { root }
    }

    /// Run `git [config...] annex <args> [-- paths]` and return stdout.
    fn annex_command(
        &self,
        config: &[String],
        args: &[&str],
        paths: Option<&[String]>,
    ) -> Result<String> {
        let mut cmd = Command::new("git");
        for setting in config {
            cmd.arg("-c").arg(setting);
        }
        cmd.arg("annex").args(args).current_dir(self.root.to_native());
        if let Some(paths) = paths {
            cmd.arg("--").args(paths);
        }
        tracing::debug!(
            repo = %self.root,
            command = %args.join(" "),
            paths = paths.map_or(0, |p| p.len()),
            "Running git annex"
        );
        let output = cmd.output()?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(Error::AnnexQuery {
                command: format!("git annex {}", args.join(" ")),
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

impl AnnexBackend for CliAnnex {
    fn find(&self, paths: Option<&[String]>) -> Result<Vec<AnnexEntry>> {
        // --include '*' lists annexed files regardless of local availability
        let stdout = self.annex_command(&[], &["find", "--json", "--include", "*"], paths)?;
        parse_json_lines(&stdout)
    }

    fn findref(&self, reference: &str) -> Result<Vec<AnnexEntry>> {
        let stdout = self.annex_command(&[], &["findref", "--json", reference], None)?;
        parse_json_lines(&stdout)
    }

    fn add(&self, paths: &[String], options: &AddOptions) -> Result<Vec<BackendOutcome>> {
        let config = match options.to_git {
            Some(true) => vec!["annex.largefiles=nothing".to_string()],
            Some(false) => vec!["annex.largefiles=anything".to_string()],
            None => Vec::new(),
        };
        let mut args = vec!["add", "--json"];
        if options.to_git == Some(true) {
            args.push("--include-dotfiles");
        }
        if options.update {
            args.push("--update");
        }
        let stdout = self.annex_command(&config, &args, Some(paths))?;
        let records: Vec<AddRecord> = parse_json_lines(&stdout)?;
        Ok(records.into_iter().map(BackendOutcome::from).collect())
    }
}
