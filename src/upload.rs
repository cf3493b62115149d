//! The upload controller: one activation of the trigger, start to finish.
//!
//! ```text
//! Idle ─▶ Validating ─┬─▶ Idle                       (no file / not a PDF)
//!                     └─▶ Uploading ─▶ Analyzing ─┬─▶ Succeeded ─▶ Idle
//!                                                 └─▶ Failed    ─▶ Idle
//! ```
//!
//! The workflow is available as a single async call ([`UploadController::analyze`])
//! and as two synchronous halves ([`UploadController::begin`] /
//! [`UploadController::finish`]) with the network call in between left to the
//! caller. The halves exist so the in-flight window can be observed: while a
//! request is pending the trigger is disabled and a further activation is
//! refused with [`Outcome::Ignored`].

use crate::client::{AnalysisBackend, AnalysisResult, SelectedFile};
use crate::config::ClientConfig;
use crate::error::{AnalyzerError, ExportError, ValidationError};
use crate::export::{self, ClipboardSink, ExportOutcome, SaveTarget};
use crate::progress::ProgressCallback;
use crate::render::{
    AmmoniaSanitizer, CommonMarkConverter, HtmlSanitizer, MarkdownConverter, MarkdownRenderer,
};
use crate::view::{Phase, ViewModel};
use std::ops::{Deref, DerefMut};
use std::time::Duration;
use tracing::{info, warn};

/// Status while the file is being sent.
pub fn uploading_status(file_name: &str) -> String {
    format!("Uploading {file_name}...")
}

/// Status while the service works.
pub const ANALYZING_STATUS: &str = "Extracting + analyzing (may take a moment)...";

/// Status after a successful analysis.
pub fn success_status(file_name: &str) -> String {
    format!("OK • {file_name}")
}

/// Error text for a failed analysis.
pub fn failure_error(err: &AnalyzerError) -> String {
    format!("Error: {err}")
}

/// Check the selection before anything is sent.
pub fn validate(file: Option<&SelectedFile>) -> Result<&SelectedFile, ValidationError> {
    let file = file.ok_or(ValidationError::NoFileSelected)?;
    if !file.has_pdf_extension() {
        return Err(ValidationError::NotAPdf {
            name: file.name().to_string(),
        });
    }
    Ok(file)
}

/// How an activation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The trigger was disabled; nothing happened.
    Ignored,
    /// The selection was rejected locally; no request was made.
    Rejected(ValidationError),
    /// The analysis was rendered.
    Succeeded { file_name: String },
    /// The request failed; `message` is the error text shown.
    Failed { message: String },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Succeeded { .. })
    }
}

/// Result of [`UploadController::begin`].
#[derive(Debug)]
pub enum Activation<'f> {
    Ignored,
    Rejected(ValidationError),
    /// The request may now be sent; hand the result to `finish`.
    Started(PendingAnalysis<'f>),
}

/// A validated file whose analysis is in flight.
#[derive(Debug)]
#[must_use = "an in-flight analysis must be passed to `finish`"]
pub struct PendingAnalysis<'f> {
    file: &'f SelectedFile,
}

impl<'f> PendingAnalysis<'f> {
    pub fn file(&self) -> &'f SelectedFile {
        self.file
    }
}

/// Restores the trigger when dropped, whether the request completed or the
/// future driving it was dropped mid-flight.
struct BusyGuard<'v> {
    view: &'v mut ViewModel,
}

impl Deref for BusyGuard<'_> {
    type Target = ViewModel;

    fn deref(&self) -> &ViewModel {
        self.view
    }
}

impl DerefMut for BusyGuard<'_> {
    fn deref_mut(&mut self) -> &mut ViewModel {
        self.view
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.view.set_loading(false);
        self.view.set_phase(Phase::Idle);
    }
}

/// Drives the upload workflow and owns the view-model.
pub struct UploadController<B, C = CommonMarkConverter, S = AmmoniaSanitizer> {
    backend: B,
    renderer: MarkdownRenderer<C, S>,
    view: ViewModel,
    copy_status_ttl: Duration,
}

impl<B: AnalysisBackend> UploadController<B> {
    /// A controller with the default renderer.
    pub fn new(backend: B) -> Self {
        Self::with_renderer(backend, MarkdownRenderer::new())
    }
}

impl<B, C, S> UploadController<B, C, S>
where
    B: AnalysisBackend,
    C: MarkdownConverter,
    S: HtmlSanitizer,
{
    pub fn with_renderer(backend: B, renderer: MarkdownRenderer<C, S>) -> Self {
        Self {
            backend,
            renderer,
            view: ViewModel::new(),
            copy_status_ttl: ClientConfig::default().copy_status_ttl(),
        }
    }

    /// Report phase and text changes to `observer`.
    pub fn with_progress(mut self, observer: ProgressCallback) -> Self {
        self.view = std::mem::take(&mut self.view).with_observer(observer);
        self
    }

    /// Take config-driven settings (currently the copy-status lifetime).
    pub fn with_config(mut self, config: &ClientConfig) -> Self {
        self.copy_status_ttl = config.copy_status_ttl();
        self
    }

    pub fn view(&self) -> &ViewModel {
        &self.view
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Activate the trigger with `file` selected and run the analysis.
    pub async fn analyze(&mut self, file: Option<&SelectedFile>) -> Outcome {
        let pending = match self.begin(file) {
            Activation::Ignored => return Outcome::Ignored,
            Activation::Rejected(e) => return Outcome::Rejected(e),
            Activation::Started(pending) => pending,
        };

        let Self {
            backend,
            renderer,
            view,
            ..
        } = self;
        let mut guard = BusyGuard { view };
        let result = backend.analyze(pending.file).await;
        apply_result(&mut guard, renderer, pending, result)
    }

    /// First half of an activation: validate, then enter the loading state.
    ///
    /// Returns [`Activation::Ignored`] without touching any state while the
    /// trigger is disabled.
    pub fn begin<'f>(&mut self, file: Option<&'f SelectedFile>) -> Activation<'f> {
        if !self.view.trigger().accepts_activation() {
            warn!("Trigger is disabled; activation ignored");
            return Activation::Ignored;
        }

        let view = &mut self.view;
        view.set_phase(Phase::Validating);
        view.set_error("");
        view.set_status("");

        let file = match validate(file) {
            Ok(file) => file,
            Err(e) => {
                info!("Selection rejected: {}", e);
                view.set_error(e.to_string().as_str());
                view.set_phase(Phase::Idle);
                return Activation::Rejected(e);
            }
        };

        view.set_phase(Phase::Uploading);
        view.set_loading(true);
        self.renderer.render("", view.output_mut());
        view.set_status(uploading_status(file.name()).as_str());

        view.set_phase(Phase::Analyzing);
        view.set_status(ANALYZING_STATUS);

        Activation::Started(PendingAnalysis { file })
    }

    /// Second half of an activation: render or report, then leave loading.
    pub fn finish(
        &mut self,
        pending: PendingAnalysis<'_>,
        result: Result<AnalysisResult, AnalyzerError>,
    ) -> Outcome {
        let mut guard = BusyGuard {
            view: &mut self.view,
        };
        apply_result(&mut guard, &self.renderer, pending, result)
    }

    /// Copy the last rendered Markdown.
    pub fn copy(
        &mut self,
        clipboard: &mut dyn ClipboardSink,
    ) -> Result<ExportOutcome, ExportError> {
        export::copy(&mut self.view, clipboard, self.copy_status_ttl)
    }

    /// Save the last rendered Markdown as `analysis.md`.
    pub fn download(&mut self, target: &dyn SaveTarget) -> Result<ExportOutcome, ExportError> {
        export::download(&mut self.view, target)
    }
}

fn apply_result<C: MarkdownConverter, S: HtmlSanitizer>(
    view: &mut ViewModel,
    renderer: &MarkdownRenderer<C, S>,
    pending: PendingAnalysis<'_>,
    result: Result<AnalysisResult, AnalyzerError>,
) -> Outcome {
    let file_name = pending.file.name();
    match result {
        Ok(analysis) => {
            renderer.render(analysis.markdown(), view.output_mut());
            view.set_status(success_status(file_name).as_str());
            view.set_phase(Phase::Succeeded);
            info!("Analysis of {} rendered", file_name);
            Outcome::Succeeded {
                file_name: file_name.to_string(),
            }
        }
        Err(e) => {
            let message = failure_error(&e);
            warn!("Analysis of {} failed: {}", file_name, e);
            view.set_status("");
            view.set_error(message.as_str());
            renderer.render("", view.output_mut());
            view.set_phase(Phase::Failed);
            Outcome::Failed { message }
        }
    }
}
