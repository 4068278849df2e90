#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

//! Per-item outcomes of a workflow and their terminal rendering.

use std::fmt::Display;

use colored::Colorize;
use tabled::{
    Table, Tabled,
    settings::{Panel, Style},
};

use crate::allocation::Allocation;

/// What happened to one item of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// The item was processed; carries a short description.
    Succeeded(String),
    /// A remote or local step failed; carries the reason.
    Failed(String),
    /// The item was deliberately left out; carries the reason.
    Skipped(String),
}

/// Outcome of one roster row, group or diff file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Identifies the item, eg. a username or file name.
    pub key:    String,
    /// What happened.
    pub status: Status,
}

impl Outcome {
    /// A successful outcome.
    pub fn succeeded(key: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            key:    key.into(),
            status: Status::Succeeded(detail.into()),
        }
    }

    /// A failed outcome.
    pub fn failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key:    key.into(),
            status: Status::Failed(reason.into()),
        }
    }

    /// A skipped outcome.
    pub fn skipped(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            key:    key.into(),
            status: Status::Skipped(reason.into()),
        }
    }

    /// True for `Succeeded`.
    pub fn is_success(&self) -> bool {
        matches!(self.status, Status::Succeeded(_))
    }

    /// True for `Failed`.
    pub fn is_failure(&self) -> bool {
        matches!(self.status, Status::Failed(_))
    }

    /// True for `Skipped`.
    pub fn is_skipped(&self) -> bool {
        matches!(self.status, Status::Skipped(_))
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.status {
            Status::Succeeded(detail) => write!(f, "{} {}", "Done:".green(), detail),
            Status::Failed(reason) => {
                write!(f, "{} {}: {}", "Error:".red(), self.key, reason)
            }
            Status::Skipped(reason) => {
                write!(f, "{} {}: {}", "Skipped:".yellow(), self.key, reason)
            }
        }
    }
}

/// Outcomes of one workflow run, in processing order.
#[derive(Debug, Clone, Default)]
pub struct Report {
    /// Recorded outcomes.
    outcomes: Vec<Outcome>,
}

impl Report {
    /// Records an outcome.
    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    /// All outcomes, in order.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Outcome recorded for `key`, if any.
    pub fn get(&self, key: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.key == key)
    }

    /// Number of successes.
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of failures.
    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failure()).count()
    }

    /// Number of skipped items.
    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    /// True when nothing failed. Skips do not count as failures.
    pub fn all_succeeded(&self) -> bool {
        self.failed() == 0
    }

    /// Renders the summary table.
    pub fn summary(&self, title: &str) -> String {
        let rows = [SummaryRow {
            succeeded: self.succeeded(),
            failed:    self.failed(),
            skipped:   self.skipped(),
        }];

        Table::new(rows)
            .with(Panel::header(title))
            .with(Style::modern())
            .to_string()
    }
}

impl Extend<Outcome> for Report {
    fn extend<T: IntoIterator<Item = Outcome>>(&mut self, iter: T) {
        self.outcomes.extend(iter);
    }
}

/// Counts shown at the end of a run.
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Succeeded")]
    /// Number of successes.
    succeeded: usize,
    #[tabled(rename = "Failed")]
    /// Number of failures.
    failed:    usize,
    #[tabled(rename = "Skipped")]
    /// Number of skipped items.
    skipped:   usize,
}

/// Renders an allocation as a table.
pub fn allocation_table(allocation: &Allocation) -> String {
    Table::new(allocation.rows())
        .with(Panel::header("Marking allocation"))
        .with(Style::modern())
        .to_string()
}
