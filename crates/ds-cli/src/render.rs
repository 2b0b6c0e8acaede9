//! Result rendering
//!
//! Human output is one line per result. Clean status entries are not shown.
//! JSON output is one object per line, for every result.

use std::io::Write;

use colored::{ColoredString, Colorize};
use ds_core::{Action, ResultRecord, ResultStatus, State};

use crate::error::Result;

/// Write `records` to `out`; returns the number of failed results.
pub fn render(out: &mut impl Write, records: &[ResultRecord], json: bool) -> Result<usize> {
    if json {
        for record in records {
            writeln!(out, "{}", serde_json::to_string(record)?)?;
        }
    } else {
        let mut shown = 0;
        for record in records {
            if let Some(line) = human_line(record) {
                writeln!(out, "{line}")?;
                shown += 1;
            }
        }
        let only_status = records
            .iter()
            .all(|r| r.action == Action::Status && !r.is_error());
        if shown == 0 && only_status {
            writeln!(out, "{}", "nothing to save, working tree clean".dimmed())?;
        }
    }
    Ok(records.iter().filter(|r| r.is_error()).count())
}

/// Path shown for a record: relative to the dataset when inside it.
fn display_path(record: &ResultRecord) -> String {
    let Some(path) = record.path.as_ref() else {
        return String::new();
    };
    record
        .refds
        .as_ref()
        .and_then(|refds| path.relative_to(refds))
        .unwrap_or_else(|| path.to_string())
}

fn state_label(state: State) -> ColoredString {
    let label = state.to_string();
    match state {
        State::Clean => label.dimmed(),
        State::Added | State::Untracked => label.green(),
        State::Modified => label.yellow(),
        State::Deleted => label.red(),
    }
}

fn status_label(status: ResultStatus) -> ColoredString {
    let label = status.to_string();
    match status {
        ResultStatus::Ok => label.green(),
        ResultStatus::NotNeeded => label.dimmed(),
        ResultStatus::Impossible | ResultStatus::Error => label.red().bold(),
    }
}

fn human_line(record: &ResultRecord) -> Option<String> {
    let path = display_path(record);
    match (record.action, record.state) {
        (Action::Status | Action::Diff, Some(State::Clean)) if !record.is_error() => None,
        (Action::Status | Action::Diff, Some(state)) if !record.is_error() => {
            let kind = record
                .entry_type
                .map(|t| format!(" ({t})"))
                .unwrap_or_default();
            let key = record
                .annex
                .as_ref()
                .map(|a| format!(" [{}]", a.key))
                .unwrap_or_default();
            Some(format!("{:>10}: {}{}{}", state_label(state), path, kind.dimmed(), key.dimmed()))
        }
        _ => {
            let message = record
                .message
                .as_ref()
                .map(|m| format!(" [{m}]"))
                .unwrap_or_default();
            Some(format!(
                "{}({}): {}{}",
                record.action,
                status_label(record.status),
                path,
                message
            ))
        }
    }
}
