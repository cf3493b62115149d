//! Configuration for talking to the analysis service.
//!
//! Everything the client needs to know about its environment lives in
//! [`ClientConfig`], built via [`ClientConfigBuilder`]. The defaults match a
//! locally running service on port 8000.

use crate::error::AnalyzerError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default service origin.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

/// Path of the analysis endpoint on the service.
pub const DEFAULT_ENDPOINT_PATH: &str = "/api/analyze-pdf";

/// How long the "Copied to clipboard." status stays visible.
pub const DEFAULT_COPY_STATUS_TTL_MS: u64 = 1200;

/// Client configuration.
///
/// # Example
/// ```rust
/// use paper_analyzer::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .server_url("http://analysis.internal:8080")
///     .request_timeout_secs(300)
///     .build()
///     .unwrap();
/// assert_eq!(
///     config.endpoint_url().unwrap().as_str(),
///     "http://analysis.internal:8080/api/analyze-pdf"
/// );
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Origin of the analysis service, e.g. `http://127.0.0.1:8000`.
    pub server_url: String,

    /// Endpoint path, joined onto `server_url`. Default: `/api/analyze-pdf`.
    pub endpoint_path: String,

    /// Whole-request timeout in seconds. Default: none.
    ///
    /// The service extracts text and runs several LLM calls per document, so
    /// a response can take minutes. Leaving this unset defers to the
    /// transport's own behaviour.
    pub request_timeout_secs: Option<u64>,

    /// `User-Agent` header sent with the upload.
    pub user_agent: String,

    /// Lifetime of the copy confirmation status, in milliseconds. Default: 1200.
    pub copy_status_ttl_ms: u64,

    /// Directory the download action saves `analysis.md` into. Default: `.`.
    pub download_dir: PathBuf,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            endpoint_path: DEFAULT_ENDPOINT_PATH.to_string(),
            request_timeout_secs: None,
            user_agent: concat!("paper-analyzer/", env!("CARGO_PKG_VERSION")).to_string(),
            copy_status_ttl_ms: DEFAULT_COPY_STATUS_TTL_MS,
            download_dir: PathBuf::from("."),
        }
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            config: Self::default(),
        }
    }

    /// Full URL of the analysis endpoint.
    pub fn endpoint_url(&self) -> Result<Url, AnalyzerError> {
        let base = Url::parse(&self.server_url).map_err(|e| {
            AnalyzerError::InvalidConfig(format!("server URL '{}': {}", self.server_url, e))
        })?;
        base.join(&self.endpoint_path).map_err(|e| {
            AnalyzerError::InvalidConfig(format!("endpoint path '{}': {}", self.endpoint_path, e))
        })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn copy_status_ttl(&self) -> Duration {
        Duration::from_millis(self.copy_status_ttl_ms)
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn endpoint_path(mut self, path: impl Into<String>) -> Self {
        self.config.endpoint_path = path.into();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn copy_status_ttl_ms(mut self, ms: u64) -> Self {
        self.config.copy_status_ttl_ms = ms;
        self
    }

    pub fn download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.download_dir = dir.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, AnalyzerError> {
        let c = &self.config;
        let url = c.endpoint_url()?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AnalyzerError::InvalidConfig(format!(
                "server URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        if !c.endpoint_path.starts_with('/') {
            return Err(AnalyzerError::InvalidConfig(format!(
                "endpoint path must start with '/', got '{}'",
                c.endpoint_path
            )));
        }
        if c.request_timeout_secs == Some(0) {
            return Err(AnalyzerError::InvalidConfig(
                "request timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint() {
        let config = ClientConfig::default();
        assert_eq!(
            config.endpoint_url().unwrap().as_str(),
            "http://127.0.0.1:8000/api/analyze-pdf"
        );
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.copy_status_ttl(), Duration::from_millis(1200));
    }

    #[test]
    fn endpoint_path_replaces_base_path() {
        let config = ClientConfig::builder()
            .server_url("https://example.org/app/")
            .build()
            .unwrap();
        assert_eq!(
            config.endpoint_url().unwrap().as_str(),
            "https://example.org/api/analyze-pdf"
        );
    }

    #[test]
    fn rejects_non_http_scheme() {
        let err = ClientConfig::builder()
            .server_url("ftp://example.org")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("http or https"), "got: {err}");
    }

    #[test]
    fn rejects_unparsable_url() {
        let err = ClientConfig::builder()
            .server_url("not a url")
            .build()
            .unwrap_err();
        assert!(matches!(err, AnalyzerError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_relative_endpoint_path() {
        let err = ClientConfig::builder()
            .endpoint_path("api/analyze-pdf")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("must start with '/'"), "got: {err}");
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(ClientConfig::builder()
            .request_timeout_secs(0)
            .build()
            .is_err());
        let config = ClientConfig::builder()
            .request_timeout_secs(30)
            .build()
            .unwrap();
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }
}
