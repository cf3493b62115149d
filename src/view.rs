//! The view-model: every piece of UI state in one place.
//!
//! [`ViewModel`] owns the status board, the rendered output, the trigger
//! control and the loading flag. The upload controller and the export
//! actions compute changes to it; a host applies it to whatever surface it
//! draws on. Nothing in here performs I/O.

use crate::progress::ProgressCallback;
use crate::render::RenderedOutput;
use crate::status::StatusBoard;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Trigger label while idle.
pub const IDLE_LABEL: &str = "Analyze";

/// Trigger label while a request is in flight.
pub const BUSY_LABEL: &str = "Analyzing...";

/// Where the upload workflow currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Idle,
    Validating,
    Uploading,
    Analyzing,
    Succeeded,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Validating => "validating",
            Phase::Uploading => "uploading",
            Phase::Analyzing => "analyzing",
            Phase::Succeeded => "succeeded",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The control that starts an analysis.
///
/// A disabled control refuses activation; that refusal is the only thing
/// standing between the user and a second concurrent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerControl {
    enabled: bool,
    label: &'static str,
}

impl Default for TriggerControl {
    fn default() -> Self {
        Self {
            enabled: true,
            label: IDLE_LABEL,
        }
    }
}

impl TriggerControl {
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// `true` if an activation would be accepted.
    pub fn accepts_activation(&self) -> bool {
        self.enabled
    }
}

/// All UI state of the client.
#[derive(Default)]
pub struct ViewModel {
    status: StatusBoard,
    output: RenderedOutput,
    trigger: TriggerControl,
    loading: bool,
    phase: Phase,
    observer: Option<ProgressCallback>,
}

impl fmt::Debug for ViewModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewModel")
            .field("status", &self.status)
            .field("output", &self.output)
            .field("trigger", &self.trigger)
            .field("loading", &self.loading)
            .field("phase", &self.phase)
            .field(
                "observer",
                &self.observer.as_ref().map(|_| "<dyn AnalysisProgressCallback>"),
            )
            .finish()
    }
}

impl ViewModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an observer that is told about every change.
    pub fn with_observer(mut self, observer: ProgressCallback) -> Self {
        self.observer = Some(observer);
        self
    }

    // ── Read side ────────────────────────────────────────────────────────

    pub fn status(&self) -> &str {
        self.status.status()
    }

    pub fn error(&self) -> &str {
        self.status.error()
    }

    /// Deadline of a live transient status. Observers are not told when it
    /// passes; redraw from [`status`](Self::status) at this instant.
    pub fn status_expires_at(&self) -> Option<Instant> {
        self.status.status_expires_at()
    }

    pub fn output(&self) -> &RenderedOutput {
        &self.output
    }

    pub fn trigger(&self) -> &TriggerControl {
        &self.trigger
    }

    /// `true` exactly while an analysis request is in flight.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    // ── Write side ───────────────────────────────────────────────────────

    pub fn set_status<'a>(&mut self, text: impl Into<Option<&'a str>>) {
        self.status.set_status(text);
        if let Some(ref obs) = self.observer {
            obs.on_status(self.status.status());
        }
    }

    pub fn set_transient_status(&mut self, text: &str, ttl: Duration) {
        self.status.set_status_for(text, ttl);
        if let Some(ref obs) = self.observer {
            obs.on_status(text);
        }
    }

    pub fn set_error<'a>(&mut self, text: impl Into<Option<&'a str>>) {
        self.status.set_error(text);
        if let Some(ref obs) = self.observer {
            obs.on_error(self.status.error());
        }
    }

    /// Disable the trigger and relabel it, or restore it.
    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
        self.trigger = TriggerControl {
            enabled: !loading,
            label: if loading { BUSY_LABEL } else { IDLE_LABEL },
        };
    }

    pub(crate) fn set_phase(&mut self, to: Phase) {
        let from = self.phase;
        if from == to {
            return;
        }
        debug!("Phase {} → {}", from, to);
        self.phase = to;
        if let Some(ref obs) = self.observer {
            obs.on_phase_change(from, to);
        }
    }

    /// Mutable access for the renderer; the only writer of the output.
    pub(crate) fn output_mut(&mut self) -> &mut RenderedOutput {
        &mut self.output
    }
}
