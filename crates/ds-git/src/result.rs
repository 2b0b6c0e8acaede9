//! Result events reported by status, diff and save operations

use std::fmt;

use ds_fs::DatasetPath;
use serde::Serialize;

use crate::backend::BackendOutcome;
use crate::snapshot::{AnnexProps, EntryType, State, StatusRecord};

/// Operation that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Status,
    Diff,
    Add,
    AddSubmodule,
    Remove,
    Save,
    Tag,
}

impl Action {
    /// Action for an outcome reported by a backend command.
    pub fn from_command(command: &str) -> Self {
        match command {
            "rm" | "remove" | "drop" => Self::Remove,
            _ => Self::Add,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Status => "status",
            Self::Diff => "diff",
            Self::Add => "add",
            Self::AddSubmodule => "add_submodule",
            Self::Remove => "remove",
            Self::Save => "save",
            Self::Tag => "tag",
        };
        f.write_str(name)
    }
}

/// Outcome category of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultStatus {
    Ok,
    #[serde(rename = "notneeded")]
    NotNeeded,
    Impossible,
    Error,
}

impl fmt::Display for ResultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ok => "ok",
            Self::NotNeeded => "notneeded",
            Self::Impossible => "impossible",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// One reported result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRecord {
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<DatasetPath>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub entry_type: Option<EntryType>,
    pub status: ResultStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Dataset the operation was invoked on.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refds: Option<DatasetPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gitshasum: Option<String>,
    #[serde(flatten)]
    pub annex: Option<AnnexProps>,
}

impl ResultRecord {
    pub fn new(action: Action, path: Option<DatasetPath>, status: ResultStatus) -> Self {
        Self {
            action,
            path,
            entry_type: None,
            status,
            state: None,
            message: None,
            refds: None,
            gitshasum: None,
            annex: None,
        }
    }

    pub fn ok(action: Action, path: DatasetPath) -> Self {
        Self::new(action, Some(path), ResultStatus::Ok)
    }

    pub fn not_needed(action: Action, path: DatasetPath) -> Self {
        Self::new(action, Some(path), ResultStatus::NotNeeded)
    }

    /// An error result. Errors are logged as they are created.
    pub fn error(action: Action, path: DatasetPath, message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::warn!(action = %action, path = %path, message = %message, "Operation failed");
        Self::new(action, Some(path), ResultStatus::Error).with_message(message)
    }

    /// Status event for one entry of a status map.
    pub fn from_status(action: Action, path: &DatasetPath, record: &StatusRecord) -> Self {
        Self {
            entry_type: Some(record.entry_type),
            state: Some(record.state),
            gitshasum: record.gitshasum.clone(),
            annex: record.annex.clone(),
            ..Self::ok(action, path.clone())
        }
    }

    /// Event for a backend outcome on content under `root`.
    pub fn from_outcome(root: &DatasetPath, outcome: BackendOutcome) -> Self {
        let action = Action::from_command(&outcome.command);
        let path = match outcome.file.as_deref() {
            Some(file) => root.join(file),
            None => root.clone(),
        };
        let mut record = if outcome.success {
            Self::ok(action, path)
        } else {
            Self::error(action, path, outcome.message.clone().unwrap_or_default())
        };
        record.entry_type = Some(EntryType::File);
        if outcome.success {
            record.message = outcome.message;
        }
        if let Some(key) = outcome.key {
            record.annex = Some(AnnexProps {
                key,
                ..AnnexProps::default()
            });
        }
        record
    }

    pub fn with_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_refds(mut self, refds: &DatasetPath) -> Self {
        self.refds = Some(refds.clone());
        self
    }

    pub fn with_gitshasum(mut self, gitshasum: impl Into<String>) -> Self {
        self.gitshasum = Some(gitshasum.into());
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.status, ResultStatus::Error | ResultStatus::Impossible)
    }
}
