//! Error types for the paper-analyzer library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`AnalyzerError`]: the analysis workflow failed (no file, wrong file
//!   type, non-2xx response, network failure, unparsable body). The upload
//!   controller catches every one of these at its boundary and turns it into
//!   error text on the view-model; its `Display` output is exactly the
//!   message shown after the `Error: ` prefix.
//!
//! * [`ExportError`]: copying or saving the rendered Markdown failed. These
//!   never travel through the analysis error path; the export actions show
//!   their own fixed messages instead.

use std::path::PathBuf;
use thiserror::Error;

/// Fallback message for a non-2xx response with an empty, non-JSON body.
pub const REQUEST_FAILED_FALLBACK: &str = "Request failed.";

/// Local validation failures, detected before any network traffic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The trigger was activated with no file selected.
    #[error("Please choose a PDF first.")]
    NoFileSelected,

    /// The selected file's name does not end in `.pdf` (case-insensitive).
    #[error("Only PDF files are supported.")]
    NotAPdf { name: String },
}

/// All errors raised on the analysis path.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    // ── Local errors ──────────────────────────────────────────────────────
    /// The selected file was rejected before upload.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The file could not be read from disk.
    #[error("Failed to read '{path}': {source}")]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Service errors ────────────────────────────────────────────────────
    /// The service answered with a non-2xx status.
    ///
    /// `message` is derived from the response body: the JSON `detail` field
    /// (serialised), the whole JSON body, the raw text, or
    /// [`REQUEST_FAILED_FALLBACK`].
    #[error("{message}")]
    Request { status: u16, message: String },

    /// The request never produced a response (DNS, refused, reset, timeout).
    #[error("{reason}")]
    Transport { url: String, reason: String },

    /// A response body that should have been JSON was not.
    #[error("Invalid JSON in response: {detail}")]
    Decode { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AnalyzerError {
    /// HTTP status of a [`AnalyzerError::Request`], if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            AnalyzerError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` for errors raised before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(self, AnalyzerError::Validation(_))
    }
}

/// A failure in one of the export actions.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The clipboard could not be opened or written.
    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    /// The Markdown file could not be written.
    #[error("Failed to write '{path}': {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_are_user_facing() {
        assert_eq!(
            ValidationError::NoFileSelected.to_string(),
            "Please choose a PDF first."
        );
        assert_eq!(
            ValidationError::NotAPdf {
                name: "report.txt".into()
            }
            .to_string(),
            "Only PDF files are supported."
        );
    }

    #[test]
    fn validation_converts_transparently() {
        let e: AnalyzerError = ValidationError::NoFileSelected.into();
        assert!(e.is_validation());
        assert_eq!(e.to_string(), "Please choose a PDF first.");
    }

    #[test]
    fn request_display_is_the_bare_message() {
        let e = AnalyzerError::Request {
            status: 500,
            message: "\"bad file\"".into(),
        };
        assert_eq!(e.to_string(), "\"bad file\"");
        assert_eq!(e.status(), Some(500));
    }

    #[test]
    fn transport_display_is_the_reason() {
        let e = AnalyzerError::Transport {
            url: "http://127.0.0.1:1/api/analyze-pdf".into(),
            reason: "connection refused".into(),
        };
        assert_eq!(e.to_string(), "connection refused");
        assert_eq!(e.status(), None);
    }

    #[test]
    fn write_failed_display_names_path() {
        let e = ExportError::WriteFailed {
            path: PathBuf::from("/tmp/x/analysis.md"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = e.to_string();
        assert!(msg.contains("analysis.md"), "got: {msg}");
        assert!(msg.contains("denied"), "got: {msg}");
    }
}
