//! Defines the custom error types for the tiktok-scout application.

use std::io;
use thiserror::Error;

/// The identifier entered by the user does not look like a TikTok profile.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum ValidationError {
    /// None of the accepted identifier patterns matched.
    #[error("Invalid profile identifier: '{0}'")]
    InvalidIdentifier(String),
}

/// Failures while reading a profile page through the browser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum ExtractionError {
    /// The rendered page did not contain the expected markup.
    #[error("Element not found for selector: {selector}")]
    ElementNotFound {
        /// The CSS selector that matched nothing.
        selector: String,
    },

    /// The URL has no "@handle" segment or cannot be parsed.
    #[error("Malformed profile URL: {0}")]
    MalformedUrl(String),

    /// The browser could not be launched, or a tab or navigation failed.
    #[error("Browser session failure: {0}")]
    SessionFailure(String),
}

/// Failures while writing the collection to disk.
#[derive(Error, Debug)]
pub(crate) enum ExportError {
    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// Error writing CSV rows.
    #[error("CSV Error: {0}")]
    Csv(#[from] csv::Error),

    /// Error building or saving an Excel workbook.
    #[error("XLSX Error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    /// Error during JSON serialization.
    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Every error a collection workflow operation can report.
#[derive(Error, Debug)]
pub(crate) enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    /// `confirm_add` or `discard` was invoked with no staged record.
    #[error("Nothing staged")]
    NothingStaged,

    /// No valid collection row was selected for removal.
    #[error("Nothing selected")]
    NothingSelected,

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl WorkflowError {
    /// The message shown to the user for this error.
    pub(crate) fn user_message(&self) -> String {
        match self {
            WorkflowError::Validation(_) => {
                "Invalid URL format. Please enter a valid TikTok profile.".to_string()
            }
            WorkflowError::Extraction(_) => {
                "Error occurred while scraping the profile. Please try again.".to_string()
            }
            WorkflowError::NothingStaged => {
                "No profile to add. Please scrape a profile first.".to_string()
            }
            WorkflowError::NothingSelected => "No profile selected to remove.".to_string(),
            WorkflowError::Export(e) => format!("Failed to export profiles: {}", e),
        }
    }
}

/// Process-level errors raised outside the workflow boundary.
#[derive(Error, Debug)]
pub(crate) enum AppError {
    /// Error occurring during configuration loading or validation.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// Error related to file input/output operations.
    #[error("IO Error: {0}")]
    Io(#[from] io::Error),

    /// A workflow error that escaped to the top level (batch mode export).
    #[error("Workflow Error: {0}")]
    Workflow(#[from] WorkflowError),
}

pub(crate) type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_match_prompts() {
        let validation: WorkflowError =
            ValidationError::InvalidIdentifier("".to_string()).into();
        assert_eq!(
            validation.user_message(),
            "Invalid URL format. Please enter a valid TikTok profile."
        );

        let extraction: WorkflowError = ExtractionError::ElementNotFound {
            selector: "h2".to_string(),
        }
        .into();
        assert_eq!(
            extraction.user_message(),
            "Error occurred while scraping the profile. Please try again."
        );

        assert_eq!(
            WorkflowError::NothingSelected.user_message(),
            "No profile selected to remove."
        );
    }

    #[test]
    fn test_extraction_error_display_names_selector() {
        let err = ExtractionError::ElementNotFound {
            selector: "strong[data-e2e=\"likes-count\"]".to_string(),
        };
        assert!(err.to_string().contains("likes-count"));
    }
}
