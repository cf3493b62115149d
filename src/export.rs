//! Export actions over the last rendered Markdown: copy and download.
//!
//! Both actions read
//! [`RenderedOutput::last_markdown`](crate::render::RenderedOutput::last_markdown)
//! and nothing else, and both are refused while exports are disabled (there
//! is no output). Their failures stay local: copy shows a fixed message,
//! download shows the write error; neither goes through the analysis error
//! path.
//!
//! ## Download without a browser
//!
//! A browser download is "make a blob, hand out a temporary URL, click it,
//! revoke the URL". Natively the same shape is a [`MarkdownBlob`] handed to a
//! [`SaveTarget`]. [`DirectorySaveTarget`] writes through a
//! [`tempfile::NamedTempFile`] in the destination directory and renames it
//! into place, so a half-written `analysis.md` never exists and the
//! temporary is removed on every failure path when it is dropped.

use crate::error::ExportError;
use crate::view::ViewModel;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// File name of the downloaded analysis.
pub const DOWNLOAD_FILE_NAME: &str = "analysis.md";

/// MIME type of the downloaded analysis.
pub const MARKDOWN_MIME: &str = "text/markdown;charset=utf-8";

/// Status shown after a successful copy.
pub const COPIED_STATUS: &str = "Copied to clipboard.";

/// Error shown when the clipboard refuses the write.
pub const COPY_FAILED_ERROR: &str = "Copy failed (browser permissions).";

/// Result of an export action that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Exports are disabled; nothing happened.
    Ignored,
    /// The Markdown is on the clipboard.
    Copied,
    /// The Markdown was saved at this path.
    Saved(PathBuf),
}

// ── Clipboard ────────────────────────────────────────────────────────────

/// Somewhere plain text can be copied to.
pub trait ClipboardSink {
    fn write_text(&mut self, text: &str) -> Result<(), ExportError>;
}

/// The operating-system clipboard, via arboard.
///
/// On Linux the clipboard contents belong to the process that set them and
/// vanish when it exits. A long-lived host can use [`SystemClipboard::new`];
/// a short-lived process should use [`SystemClipboard::until_replaced`],
/// whose `write_text` blocks until another program takes the clipboard over.
#[cfg(feature = "clipboard")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard {
    wait_for_replacement: bool,
}

#[cfg(feature = "clipboard")]
impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep serving the copied text until another owner replaces it.
    /// Only changes behaviour on Linux.
    pub fn until_replaced() -> Self {
        Self {
            wait_for_replacement: true,
        }
    }

    pub fn waits_for_replacement(&self) -> bool {
        self.wait_for_replacement
    }
}

#[cfg(feature = "clipboard")]
impl ClipboardSink for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<(), ExportError> {
        let mut clipboard =
            arboard::Clipboard::new().map_err(|e| ExportError::Clipboard(e.to_string()))?;
        set_clipboard_text(&mut clipboard, text, self.wait_for_replacement)
            .map_err(|e| ExportError::Clipboard(e.to_string()))
    }
}

#[cfg(all(feature = "clipboard", target_os = "linux"))]
fn set_clipboard_text(
    clipboard: &mut arboard::Clipboard,
    text: &str,
    wait: bool,
) -> Result<(), arboard::Error> {
    use arboard::SetExtLinux;

    if wait {
        clipboard.set().wait().text(text)
    } else {
        clipboard.set_text(text)
    }
}

#[cfg(all(feature = "clipboard", not(target_os = "linux")))]
fn set_clipboard_text(
    clipboard: &mut arboard::Clipboard,
    text: &str,
    _wait: bool,
) -> Result<(), arboard::Error> {
    clipboard.set_text(text)
}

/// Copy the last rendered Markdown to `clipboard`.
///
/// On success the status reads [`COPIED_STATUS`] for `status_ttl`; on
/// failure the error reads [`COPY_FAILED_ERROR`].
pub fn copy(
    view: &mut ViewModel,
    clipboard: &mut dyn ClipboardSink,
    status_ttl: Duration,
) -> Result<ExportOutcome, ExportError> {
    if !view.output().exports_enabled() {
        return Ok(ExportOutcome::Ignored);
    }

    let written = clipboard.write_text(view.output().last_markdown());
    match written {
        Ok(()) => {
            info!(
                "Copied {} bytes of Markdown to the clipboard",
                view.output().last_markdown().len()
            );
            view.set_transient_status(COPIED_STATUS, status_ttl);
            Ok(ExportOutcome::Copied)
        }
        Err(e) => {
            warn!("Clipboard write failed: {}", e);
            view.set_error(COPY_FAILED_ERROR);
            Err(e)
        }
    }
}

// ── Download ─────────────────────────────────────────────────────────────

/// An in-memory file ready to be saved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownBlob {
    pub file_name: String,
    pub mime_type: String,
    pub content: String,
}

impl MarkdownBlob {
    /// Package `markdown` verbatim as `analysis.md`.
    pub fn from_markdown(markdown: &str) -> Self {
        Self {
            file_name: DOWNLOAD_FILE_NAME.to_string(),
            mime_type: MARKDOWN_MIME.to_string(),
            content: markdown.to_string(),
        }
    }
}

/// Somewhere a [`MarkdownBlob`] can be saved.
pub trait SaveTarget {
    /// Save `blob` and return where it ended up.
    fn save(&self, blob: &MarkdownBlob) -> Result<PathBuf, ExportError>;
}

/// Saves into a directory on disk, atomically.
#[derive(Debug, Clone)]
pub struct DirectorySaveTarget {
    dir: PathBuf,
}

impl DirectorySaveTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl SaveTarget for DirectorySaveTarget {
    fn save(&self, blob: &MarkdownBlob) -> Result<PathBuf, ExportError> {
        let dest = self.dir.join(&blob.file_name);
        let write_failed = |source: std::io::Error| ExportError::WriteFailed {
            path: dest.clone(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(write_failed)?;

        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(write_failed)?;
        tmp.write_all(blob.content.as_bytes()).map_err(write_failed)?;
        tmp.flush().map_err(write_failed)?;
        tmp.persist(&dest).map_err(|e| write_failed(e.error))?;

        Ok(dest)
    }
}

/// Save the last rendered Markdown through `target`.
///
/// A failed save sets the error text to `Download failed: <reason>`.
pub fn download(
    view: &mut ViewModel,
    target: &dyn SaveTarget,
) -> Result<ExportOutcome, ExportError> {
    if !view.output().exports_enabled() {
        return Ok(ExportOutcome::Ignored);
    }

    let blob = MarkdownBlob::from_markdown(view.output().last_markdown());
    match target.save(&blob) {
        Ok(path) => {
            info!("Saved {} bytes to {}", blob.content.len(), path.display());
            Ok(ExportOutcome::Saved(path))
        }
        Err(e) => {
            warn!("Download failed: {}", e);
            view.set_error(format!("Download failed: {e}").as_str());
            Err(e)
        }
    }
}
