//! The scrape-and-collect workflow: stage one scraped profile at a time,
//! confirm it into an ordered collection, and export the collection.

use crate::error::{ValidationError, WorkflowError};
use crate::export::{ExportFormat, export_records};
use crate::extractor::ProfileExtractor;
use crate::models::ProfileRecord;
use crate::normalize;
use crate::progress::{Checkpoint, Progress};
use std::path::{Path, PathBuf};

/// Observable state between operations.
///
/// Scraping, Added, Discarded and Failed are passed through within a single
/// call and never remain once it returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum State {
    Idle,
    Scraping,
    /// A scraped record waiting for the user to add or discard it.
    Staged(ProfileRecord),
}

/// Result of an export request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExportOutcome {
    /// The user cancelled the path prompt; nothing was written.
    Cancelled,
    Written {
        path: PathBuf,
        format: ExportFormat,
        rows: usize,
    },
}

/// Owns the staged record and the collection for one session.
pub(crate) struct Collector<E: ProfileExtractor> {
    extractor: E,
    state: State,
    collection: Vec<ProfileRecord>,
    export_format: ExportFormat,
}

impl<E: ProfileExtractor> Collector<E> {
    pub(crate) fn new(extractor: E, export_format: ExportFormat) -> Self {
        Self {
            extractor,
            state: State::Idle,
            collection: Vec::new(),
            export_format,
        }
    }

    pub(crate) fn state(&self) -> &State {
        &self.state
    }

    pub(crate) fn staged(&self) -> Option<&ProfileRecord> {
        match &self.state {
            State::Staged(record) => Some(record),
            _ => None,
        }
    }

    pub(crate) fn records(&self) -> &[ProfileRecord] {
        &self.collection
    }

    /// Validates, normalizes and scrapes an identifier, staging the result.
    ///
    /// An invalid identifier leaves everything untouched. Otherwise any staged
    /// record is discarded first, and a failed scrape returns to `Idle`.
    pub(crate) fn submit(
        &mut self,
        identifier: &str,
        progress: &mut dyn Progress,
    ) -> Result<(), WorkflowError> {
        if !normalize::validate(identifier) {
            tracing::warn!(target: "workflow", "Rejected identifier: '{}'", identifier);
            return Err(ValidationError::InvalidIdentifier(identifier.to_string()).into());
        }

        let url = normalize::format(identifier);
        if let State::Staged(previous) = &self.state {
            tracing::debug!(target: "workflow", "Overwriting staged profile @{}", previous.username);
        }
        self.state = State::Scraping;

        progress.begin(&url);
        let result = self.extractor.extract(&url, progress);
        match result {
            Ok(scraped) => {
                let record = ProfileRecord::new(scraped, url);
                tracing::info!(target: "workflow", "Staged profile @{} ({})", record.username, record.name);
                self.state = State::Staged(record);
                progress.checkpoint(Checkpoint::Populated);
                progress.finish();
                Ok(())
            }
            Err(e) => {
                progress.finish();
                tracing::error!(target: "workflow", "Scrape of {} failed: {}", url, e);
                self.state = State::Idle;
                Err(e.into())
            }
        }
    }

    /// Appends the staged record to the collection and returns to `Idle`.
    pub(crate) fn confirm_add(&mut self) -> Result<&ProfileRecord, WorkflowError> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Staged(record) => {
                tracing::info!(target: "workflow", "Added @{} as row {}", record.username, self.collection.len() + 1);
                self.collection.push(record);
                Ok(&self.collection[self.collection.len() - 1])
            }
            other => {
                self.state = other;
                Err(WorkflowError::NothingStaged)
            }
        }
    }

    /// Drops the staged record without adding it.
    pub(crate) fn discard(&mut self) -> Result<ProfileRecord, WorkflowError> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Staged(record) => {
                tracing::info!(target: "workflow", "Discarded staged profile @{}", record.username);
                Ok(record)
            }
            other => {
                self.state = other;
                Err(WorkflowError::NothingStaged)
            }
        }
    }

    /// Removes the selected row. Absent or out-of-range selections change nothing.
    pub(crate) fn remove_selected(
        &mut self,
        selection: Option<usize>,
    ) -> Result<ProfileRecord, WorkflowError> {
        match selection {
            Some(index) if index < self.collection.len() => {
                let removed = self.collection.remove(index);
                tracing::info!(target: "workflow", "Removed row {} (@{})", index + 1, removed.username);
                Ok(removed)
            }
            _ => {
                tracing::warn!(
                    target: "workflow",
                    "Remove with selection {:?} on {} rows",
                    selection,
                    self.collection.len()
                );
                Err(WorkflowError::NothingSelected)
            }
        }
    }

    /// Writes the whole collection. `None` means the user cancelled.
    pub(crate) fn export(&self, path: Option<&Path>) -> Result<ExportOutcome, WorkflowError> {
        let Some(path) = path else {
            tracing::debug!(target: "workflow", "Export cancelled");
            return Ok(ExportOutcome::Cancelled);
        };
        let format = export_records(path, &self.collection, self.export_format)?;
        Ok(ExportOutcome::Written {
            path: path.to_path_buf(),
            format,
            rows: self.collection.len(),
        })
    }

    /// Preview of the staged record, with empty values when nothing is staged.
    pub(crate) fn preview_text(&self) -> String {
        let (name, followers, likes) = match self.staged() {
            Some(r) => (r.name.as_str(), r.followers.as_str(), r.likes.as_str()),
            None => ("", "", ""),
        };
        format!("Name: {}\nFollowers: {}\nLikes: {}", name, followers, likes)
            .lines()
            .map(str::trim_end)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One line per collected record, in collection order, numbered from 1.
    pub(crate) fn listing(&self) -> Vec<String> {
        self.collection
            .iter()
            .enumerate()
            .map(|(i, r)| format!("{}. {} (@{})", i + 1, r.name, r.username))
            .collect()
    }
}
