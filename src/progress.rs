//! Observer trait for analysis workflow events.
//!
//! Inject an [`Arc<dyn AnalysisProgressCallback>`] via
//! [`crate::upload::UploadController::with_progress`] to receive every phase
//! transition and every status/error text change as it happens. The library
//! never touches a terminal or a widget itself; a host forwards these events
//! to whatever it displays on (the `paper-analyze` binary drives a spinner).
//!
//! # Example
//!
//! ```rust
//! use paper_analyzer::{AnalysisProgressCallback, Phase};
//! use std::sync::Mutex;
//!
//! #[derive(Default)]
//! struct PhaseLog(Mutex<Vec<Phase>>);
//!
//! impl AnalysisProgressCallback for PhaseLog {
//!     fn on_phase_change(&self, _from: Phase, to: Phase) {
//!         self.0.lock().unwrap().push(to);
//!     }
//! }
//! ```

use crate::view::Phase;
use std::sync::Arc;

/// Called by the view-model as the workflow advances.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait AnalysisProgressCallback: Send + Sync {
    /// Called on every phase transition, including `Validating → Idle` for a
    /// rejected file.
    fn on_phase_change(&self, from: Phase, to: Phase) {
        let _ = (from, to);
    }

    /// Called whenever the status text is overwritten (empty = cleared).
    ///
    /// Not called when a transient status expires; see
    /// [`ViewModel::status_expires_at`](crate::view::ViewModel::status_expires_at).
    fn on_status(&self, text: &str) {
        let _ = text;
    }

    /// Called whenever the error text is overwritten (empty = cleared).
    fn on_error(&self, text: &str) {
        let _ = text;
    }
}

/// A no-op implementation for callers that don't need events.
pub struct NoopProgressCallback;

impl AnalysisProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::view::ViewModel`].
pub type ProgressCallback = Arc<dyn AnalysisProgressCallback>;
