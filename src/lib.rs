//! # paper-analyzer
//!
//! Client for a research-paper analysis service: pick a PDF, upload it, and
//! read back a structured Markdown analysis rendered as sanitised HTML.
//!
//! ## Why this crate?
//!
//! The service does the heavy lifting (text extraction, LLM passes). What is
//! left on the client is small but easy to get wrong: refuse a second upload
//! while one is in flight, turn every failure shape the service produces into
//! one readable line, never show model-written HTML without sanitising it,
//! and let the user keep the Markdown. This crate keeps all of that in a
//! UI-agnostic view-model so any front end (the bundled CLI, a TUI, a
//! webview) gets the same behaviour.
//!
//! ## Workflow Overview
//!
//! ```text
//! SelectedFile
//!  │
//!  ├─ 1. Validate  a file is chosen and its name ends in .pdf
//!  ├─ 2. Upload    multipart POST, field "file"            (client)
//!  ├─ 3. Decode    overall_markdown, or a one-line error   (client)
//!  ├─ 4. Render    pulldown-cmark → ammonia                (render)
//!  └─ 5. Export    copy to clipboard / save analysis.md    (export)
//! ```
//!
//! Every step writes to one [`ViewModel`]: status text, error text, the
//! rendered and raw views, and the trigger control.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use paper_analyzer::{ClientConfig, HttpAnalysisClient, SelectedFile, UploadController};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::builder()
//!         .server_url("http://127.0.0.1:8000")
//!         .build()?;
//!     let client = HttpAnalysisClient::new(&config)?;
//!     let mut controller = UploadController::new(client).with_config(&config);
//!
//!     let file = SelectedFile::from_path("paper.pdf").await?;
//!     let outcome = controller.analyze(Some(&file)).await;
//!
//!     eprintln!("{} {}", controller.view().status(), controller.view().error());
//!     if outcome.is_success() {
//!         println!("{}", controller.view().output().raw());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature     | Default | Description |
//! |-------------|---------|-------------|
//! | `cli`       | on      | Enables the `paper-analyze` binary (clap + anyhow + tracing-subscriber + indicatif) |
//! | `clipboard` | on      | [`SystemClipboard`] via arboard |
//!
//! Disable both when embedding the library in a host that owns its own
//! clipboard:
//! ```toml
//! paper-analyzer = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod progress;
pub mod render;
pub mod status;
pub mod upload;
pub mod view;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::{AnalysisBackend, AnalysisResult, HttpAnalysisClient, SelectedFile};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{AnalyzerError, ExportError, ValidationError};
#[cfg(feature = "clipboard")]
pub use export::SystemClipboard;
pub use export::{ClipboardSink, DirectorySaveTarget, ExportOutcome, MarkdownBlob, SaveTarget};
pub use progress::{AnalysisProgressCallback, NoopProgressCallback, ProgressCallback};
pub use render::{
    AmmoniaSanitizer, CommonMarkConverter, HtmlSanitizer, MarkdownConverter, MarkdownRenderer,
    RenderedOutput,
};
pub use status::StatusBoard;
pub use upload::{Activation, Outcome, PendingAnalysis, UploadController};
pub use view::{Phase, TriggerControl, ViewModel};
