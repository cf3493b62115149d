//! CLI binary for paper-analyzer.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig`, runs one activation of the upload controller and prints
//! the result.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use paper_analyzer::config::{DEFAULT_ENDPOINT_PATH, DEFAULT_SERVER_URL};
use paper_analyzer::{
    AnalysisProgressCallback, ClientConfig, DirectorySaveTarget, ExportOutcome, HttpAnalysisClient,
    Outcome, Phase, ProgressCallback, SelectedFile, UploadController, ViewModel,
};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a spinner whose prefix tracks the phase and
/// whose message tracks the status text. Errors are left to the final
/// summary so each one is printed once.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style =
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Ready");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

impl AnalysisProgressCallback for CliProgressCallback {
    fn on_phase_change(&self, _from: Phase, to: Phase) {
        match to {
            Phase::Validating => self.bar.set_prefix("Checking"),
            Phase::Uploading => self.bar.set_prefix("Uploading"),
            Phase::Analyzing => self.bar.set_prefix("Analyzing"),
            Phase::Succeeded | Phase::Failed => {}
            Phase::Idle => self.bar.finish_and_clear(),
        }
    }

    fn on_status(&self, text: &str) {
        if !text.is_empty() {
            self.bar.set_message(text.to_string());
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyse a paper against a local service, Markdown on stdout
  paper-analyze paper.pdf

  # Sanitised HTML instead of Markdown
  paper-analyze --format html paper.pdf > analysis.html

  # Remote service with a five-minute limit
  paper-analyze --server https://papers.example.org --timeout 300 paper.pdf

  # Keep the result: save analysis.md and copy it to the clipboard
  paper-analyze --download --output-dir notes/ --copy paper.pdf

  # Machine-readable result
  paper-analyze --format json paper.pdf | jq .status

EXIT STATUS:
  0  analysis rendered
  1  analysis failed (HTTP error, network failure, unreadable response)
  2  nothing sent (no file given, or not a .pdf)

ENVIRONMENT VARIABLES:
  PAPER_ANALYZER_SERVER      Service origin (default http://127.0.0.1:8000)
  PAPER_ANALYZER_ENDPOINT    Endpoint path (default /api/analyze-pdf)
  PAPER_ANALYZER_TIMEOUT     Whole-request timeout in seconds (default none)
  PAPER_ANALYZER_OUTPUT_DIR  Where --download writes analysis.md (default .)
  RUST_LOG                   Log filter, overrides -v/-q
"#;

/// Analyse a research paper PDF with the analysis service.
#[derive(Parser, Debug)]
#[command(
    name = "paper-analyze",
    version,
    about = "Analyse a research paper PDF and print the Markdown report",
    long_about = "Upload a research paper PDF to the paper analysis service and print the \
structured analysis it returns, as Markdown, sanitised HTML, or JSON. The report can also be \
saved as analysis.md or copied to the clipboard.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// PDF file to analyse.
    input: Option<PathBuf>,

    /// Origin of the analysis service.
    #[arg(long, env = "PAPER_ANALYZER_SERVER", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Endpoint path on the service.
    #[arg(long, env = "PAPER_ANALYZER_ENDPOINT", default_value = DEFAULT_ENDPOINT_PATH)]
    endpoint: String,

    /// Whole-request timeout in seconds (default: wait indefinitely).
    #[arg(long, env = "PAPER_ANALYZER_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// What to print on stdout.
    #[arg(long, value_enum, default_value = "markdown")]
    format: FormatArg,

    /// Copy the Markdown to the clipboard after a successful analysis.
    #[arg(long)]
    copy: bool,

    /// Save the Markdown as analysis.md after a successful analysis.
    #[arg(long)]
    download: bool,

    /// Directory --download writes into.
    #[arg(long, env = "PAPER_ANALYZER_OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Disable the progress spinner.
    #[arg(long)]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Markdown,
    Html,
    Json,
}

/// `--format json` document.
#[derive(Serialize)]
struct JsonReport<'a> {
    file: Option<&'a str>,
    ok: bool,
    status: &'a str,
    error: &'a str,
    markdown: &'a str,
    html: &'a str,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // spinner shows everything that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && cli.format != FormatArg::Json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let client = HttpAnalysisClient::new(&config).context("Failed to create HTTP client")?;

    let mut controller = UploadController::new(client).with_config(&config);
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new();
        controller = controller.with_progress(cb);
    }

    // ── Run analysis ─────────────────────────────────────────────────────
    let file = match cli.input {
        Some(ref path) => Some(load_selection(path).await?),
        None => None,
    };

    let outcome = controller.analyze(file.as_ref()).await;

    // ── Download ─────────────────────────────────────────────────────────
    if outcome.is_success() && cli.download {
        let target = DirectorySaveTarget::new(&config.download_dir);
        if let Ok(ExportOutcome::Saved(path)) = controller.download(&target) {
            if !cli.quiet {
                eprintln!("{} Saved {}", green("✔"), bold(&path.display().to_string()));
            }
        }
    }

    // ── Output ───────────────────────────────────────────────────────────
    let view = controller.view();
    match cli.format {
        FormatArg::Json => {
            let report = JsonReport {
                file: file.as_ref().map(|f| f.name()),
                ok: outcome.is_success(),
                status: view.status(),
                error: view.error(),
                markdown: view.output().last_markdown(),
                html: view.output().html(),
            };
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialise output")?;
            println!("{json}");
        }
        FormatArg::Markdown if outcome.is_success() => {
            write_stdout(view.output().raw())?;
        }
        FormatArg::Html if outcome.is_success() => {
            write_stdout(view.output().html())?;
        }
        _ => {}
    }

    if cli.format != FormatArg::Json {
        for line in summary_lines(view, &outcome, cli.quiet) {
            eprintln!("{line}");
        }
    }

    // ── Copy ─────────────────────────────────────────────────────────────
    // Last, because on Linux it blocks until the clipboard changes hands.
    if outcome.is_success() && cli.copy {
        copy_to_clipboard(&mut controller, cli.quiet);
    }

    Ok(ExitCode::from(exit_code(&outcome)))
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .server_url(cli.server.clone())
        .endpoint_path(cli.endpoint.clone());

    if let Some(secs) = cli.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(ref dir) = cli.output_dir {
        builder = builder.download_dir(dir.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Read `path` as the selected file.
///
/// A name without a `.pdf` extension is handed over unread so the
/// controller rejects it without touching the disk.
async fn load_selection(path: &Path) -> Result<SelectedFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let unread = SelectedFile::new(name, Vec::new());
    if !unread.has_pdf_extension() {
        return Ok(unread);
    }
    SelectedFile::from_path(path)
        .await
        .with_context(|| format!("Failed to open {}", path.display()))
}

#[cfg(feature = "clipboard")]
fn copy_to_clipboard(controller: &mut UploadController<HttpAnalysisClient>, quiet: bool) {
    if cfg!(target_os = "linux") && !quiet {
        eprintln!(
            "{} Holding the clipboard until another program replaces it (Ctrl-C to stop)",
            dim("…")
        );
    }
    let mut clipboard = paper_analyzer::SystemClipboard::until_replaced();
    match controller.copy(&mut clipboard) {
        Ok(ExportOutcome::Copied) if !quiet => {
            eprintln!("{} {}", green("✔"), controller.view().status());
        }
        Err(_) => eprintln!("{} {}", red("✘"), red(controller.view().error())),
        _ => {}
    }
}

#[cfg(not(feature = "clipboard"))]
fn copy_to_clipboard(_controller: &mut UploadController<HttpAnalysisClient>, _quiet: bool) {
    eprintln!(
        "{} --copy needs the `clipboard` feature; rebuild with it enabled",
        cyan("⚠")
    );
}

fn write_stdout(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    // Ensure a trailing newline on stdout.
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

/// Final status/error lines for stderr. Errors are kept even with `--quiet`.
fn summary_lines(view: &ViewModel, outcome: &Outcome, quiet: bool) -> Vec<String> {
    let mut lines = Vec::new();
    if !view.error().is_empty() {
        lines.push(format!("{} {}", red("✘"), red(view.error())));
    }
    match outcome {
        Outcome::Succeeded { file_name } if !quiet => {
            let size = format!("{} chars of Markdown", view.output().last_markdown().len());
            lines.push(format!(
                "{} {}  {}",
                green("✔"),
                bold(&format!("OK • {file_name}")),
                dim(&size),
            ));
        }
        Outcome::Ignored => {
            lines.push(format!("{} analysis already in progress", cyan("⚠")));
        }
        _ => {}
    }
    lines
}

/// 0 = rendered, 1 = analysis failed, 2 = nothing sent.
fn exit_code(outcome: &Outcome) -> u8 {
    match outcome {
        Outcome::Succeeded { .. } => 0,
        Outcome::Failed { .. } => 1,
        Outcome::Rejected(_) | Outcome::Ignored => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use paper_analyzer::ValidationError;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_point_at_local_service() {
        let cli = Cli::try_parse_from(["paper-analyze", "paper.pdf"]).unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(
            config.endpoint_url().unwrap().as_str(),
            "http://127.0.0.1:8000/api/analyze-pdf"
        );
        assert_eq!(config.request_timeout(), None);
        assert_eq!(cli.format, FormatArg::Markdown);
    }

    #[test]
    fn flags_reach_config() {
        let cli = Cli::try_parse_from([
            "paper-analyze",
            "--server",
            "https://papers.example.org",
            "--endpoint",
            "/v2/analyze",
            "--timeout",
            "300",
            "--output-dir",
            "notes",
            "--format",
            "html",
            "paper.pdf",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(
            config.endpoint_url().unwrap().as_str(),
            "https://papers.example.org/v2/analyze"
        );
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(300)));
        assert_eq!(config.download_dir, PathBuf::from("notes"));
        assert_eq!(cli.format, FormatArg::Html);
    }

    #[test]
    fn zero_timeout_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["paper-analyze", "--timeout", "0", "a.pdf"]).is_err());
    }

    #[test]
    fn bad_scheme_is_rejected_by_config() {
        let cli = Cli::try_parse_from(["paper-analyze", "--server", "ftp://x", "a.pdf"]).unwrap();
        assert!(build_config(&cli).is_err());
    }

    fn rejected_summary(file: Option<&SelectedFile>, quiet: bool) -> (Vec<String>, Outcome) {
        let config = ClientConfig::default();
        let mut controller = UploadController::new(HttpAnalysisClient::new(&config).unwrap());
        let outcome = tokio_test::block_on(controller.analyze(file));
        (summary_lines(controller.view(), &outcome, quiet), outcome)
    }

    #[test]
    fn rejection_error_is_reported_once() {
        let txt = SelectedFile::new("report.txt", Vec::new());
        let (lines, outcome) = rejected_summary(Some(&txt), false);
        let hits = lines
            .iter()
            .filter(|l| l.contains("Only PDF files are supported."))
            .count();
        assert_eq!(hits, 1, "got: {lines:?}");
        assert_eq!(exit_code(&outcome), 2);
    }

    #[test]
    fn quiet_summary_still_carries_errors() {
        let (lines, _) = rejected_summary(None, true);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("Please choose a PDF first."));
    }

    #[tokio::test]
    async fn non_pdf_selection_is_not_read() {
        let file = load_selection(Path::new("/definitely/not/here/notes.txt"))
            .await
            .unwrap();
        assert_eq!(file.name(), "notes.txt");
        assert!(file.bytes().is_empty());
        assert!(!file.has_pdf_extension());
    }

    #[tokio::test]
    async fn missing_pdf_is_an_open_error() {
        let err = load_selection(Path::new("/definitely/not/here/paper.pdf"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to open"), "got: {err}");
    }

    #[tokio::test]
    async fn pdf_selection_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.PDF");
        std::fs::write(&path, b"%PDF-1.4").unwrap();
        let file = load_selection(&path).await.unwrap();
        assert_eq!(file.bytes(), b"%PDF-1.4");
    }

    #[test]
    fn exit_codes() {
        assert_eq!(
            exit_code(&Outcome::Succeeded {
                file_name: "a.pdf".into()
            }),
            0
        );
        assert_eq!(
            exit_code(&Outcome::Failed {
                message: "Error: x".into()
            }),
            1
        );
        assert_eq!(
            exit_code(&Outcome::Rejected(ValidationError::NoFileSelected)),
            2
        );
    }
}
