//! The analysis client: one multipart POST, one JSON answer.
//!
//! ## Error bodies
//!
//! The service reports failures two ways. Framework-raised errors come back
//! as JSON (`{"detail": ...}`); anything in front of it (a proxy, a crashed
//! worker) answers with plain text. [`failure_message`] turns either into the
//! one-line message the user sees, and is kept pure so every branch is unit
//! tested without a server.
//!
//! No retry, no backoff: a failed analysis is shown to the user, who decides
//! whether to try again.

use crate::config::ClientConfig;
use crate::error::{AnalyzerError, REQUEST_FAILED_FALLBACK};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use tracing::{debug, info, warn};

/// Multipart field the service reads the upload from.
pub const FILE_FIELD: &str = "file";

/// MIME type declared on the uploaded part.
pub const PDF_MIME: &str = "application/pdf";

/// A user-chosen file: a name and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    name: String,
    bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk; its name is the final path component.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, AnalyzerError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AnalyzerError::FileReadFailed {
                path: path.to_path_buf(),
                source: e,
            })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Read {} ({} bytes)", path.display(), bytes.len());
        Ok(Self { name, bytes })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `true` when the name ends in `.pdf`, ignoring case.
    pub fn has_pdf_extension(&self) -> bool {
        self.name.to_lowercase().ends_with(".pdf")
    }
}

/// The service's answer to a successful analysis.
///
/// Only `overall_markdown` matters to the client; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The analysis, as Markdown. Absent or `null` reads as empty.
    #[serde(default)]
    pub overall_markdown: Option<String>,

    /// Model the service used, when it says.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl AnalysisResult {
    /// The Markdown to render; empty when the service sent none.
    pub fn markdown(&self) -> &str {
        self.overall_markdown.as_deref().unwrap_or_default()
    }
}

/// Anything that can analyse a [`SelectedFile`].
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn analyze(&self, file: &SelectedFile) -> Result<AnalysisResult, AnalyzerError>;
}

/// [`AnalysisBackend`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    http: reqwest::Client,
    endpoint: Url,
}

impl HttpAnalysisClient {
    pub fn new(config: &ClientConfig) -> Result<Self, AnalyzerError> {
        let endpoint = config.endpoint_url()?;

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder
            .build()
            .map_err(|e| AnalyzerError::InvalidConfig(format!("HTTP client: {e}")))?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn transport_error(&self, e: reqwest::Error) -> AnalyzerError {
        AnalyzerError::Transport {
            url: self.endpoint.to_string(),
            reason: e.to_string(),
        }
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisClient {
    async fn analyze(&self, file: &SelectedFile) -> Result<AnalysisResult, AnalyzerError> {
        info!("Uploading {} to {}", file.name(), self.endpoint);

        let part = Part::bytes(file.bytes().to_vec())
            .file_name(file.name().to_string())
            .mime_str(PDF_MIME)
            .map_err(|e| self.transport_error(e))?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .http
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let shown_type = if content_type.is_empty() {
            "no content-type"
        } else {
            content_type.as_str()
        };
        debug!("Response {} ({}, {} bytes)", status, shown_type, body.len());

        if !status.is_success() {
            let message = failure_message(&content_type, &body)?;
            warn!("Analysis failed with HTTP {}: {}", status, message);
            return Err(AnalyzerError::Request {
                status: status.as_u16(),
                message,
            });
        }

        let result = parse_result(&body)?;
        info!(
            "Analysis complete: {} bytes of Markdown{}",
            result.markdown().len(),
            result
                .model
                .as_deref()
                .map(|m| format!(" from {m}"))
                .unwrap_or_default()
        );
        Ok(result)
    }
}

/// Parse a 2xx body.
pub fn parse_result(body: &str) -> Result<AnalysisResult, AnalyzerError> {
    serde_json::from_str(body).map_err(|e| AnalyzerError::Decode {
        detail: e.to_string(),
    })
}

/// Derive the user-facing message for a non-2xx response.
///
/// - JSON content type: the serialised `detail` field when it carries a
///   value, otherwise the whole serialised body. A JSON content type with a
///   non-JSON body is a decode error.
/// - Anything else: the body text, or [`REQUEST_FAILED_FALLBACK`] if empty.
pub fn failure_message(content_type: &str, body: &str) -> Result<String, AnalyzerError> {
    if content_type.contains("application/json") {
        let value: Value = serde_json::from_str(body).map_err(|e| AnalyzerError::Decode {
            detail: e.to_string(),
        })?;
        let shown = match value.get("detail") {
            Some(detail) if is_truthy(detail) => detail,
            _ => &value,
        };
        Ok(shown.to_string())
    } else if body.is_empty() {
        Ok(REQUEST_FAILED_FALLBACK.to_string())
    } else {
        Ok(body.to_string())
    }
}

/// `null`, `false`, `0` and `""` count as "no detail".
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
