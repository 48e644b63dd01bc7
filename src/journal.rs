use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Severity of a journal entry, ordered from routine to failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Warn => write!(f, "warn"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// One audit event recorded while a run moves through the stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    #[serde(with = "time::serde::rfc3339")]
    pub instant: OffsetDateTime,
    pub stage: String,
    #[serde(default)]
    pub sub_task: Option<String>,
    pub severity: Severity,
    pub message: String,
}

/// Append-only journal scoped to a single analysis run.
///
/// Every appended entry is mirrored to the process-wide structured log at the
/// matching level, so the per-run audit trail and the operational log never
/// drift apart.
#[derive(Debug, Clone, Default)]
pub struct Journal {
    entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        severity: Severity,
        stage: &str,
        sub_task: Option<&str>,
        message: impl Into<String>,
    ) {
        let entry = JournalEntry {
            instant: OffsetDateTime::now_utc(),
            stage: stage.to_string(),
            sub_task: sub_task.map(str::to_string),
            severity,
            message: message.into(),
        };
        match entry.severity {
            Severity::Info => tracing::info!(
                target: "journal",
                stage = %entry.stage,
                sub_task = ?entry.sub_task,
                message = %entry.message,
                "journal_appended"
            ),
            Severity::Warn => tracing::warn!(
                target: "journal",
                stage = %entry.stage,
                sub_task = ?entry.sub_task,
                message = %entry.message,
                "journal_appended"
            ),
            Severity::Error => tracing::error!(
                target: "journal",
                stage = %entry.stage,
                sub_task = ?entry.sub_task,
                message = %entry.message,
                "journal_appended"
            ),
        }
        self.entries.push(entry);
    }

    pub fn info(&mut self, stage: &str, message: impl Into<String>) {
        self.push(Severity::Info, stage, None, message);
    }

    pub fn warn(&mut self, stage: &str, message: impl Into<String>) {
        self.push(Severity::Warn, stage, None, message);
    }

    pub fn error(&mut self, stage: &str, message: impl Into<String>) {
        self.push(Severity::Error, stage, None, message);
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<JournalEntry> {
        self.entries
    }
}
