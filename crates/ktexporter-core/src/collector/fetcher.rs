//! HTTP fetcher for the Kyoto Tycoon `/rpc/report` endpoint.

use std::time::Duration;

use reqwest::{Client, StatusCode, Url};
use tracing::debug;

/// Path of the report endpoint on a Kyoto Tycoon server.
pub const REPORT_PATH: &str = "/rpc/report";

/// Server address used when none is configured.
pub const DEFAULT_SERVER: &str = "http://localhost:1978";

/// Error type for report fetching.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The configured server address is not a usable HTTP(S) URL.
    InvalidUrl(String),
    /// Connect error, timeout, body read error or non-200 status.
    Failed(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::InvalidUrl(msg) => write!(f, "invalid kt URL: {}", msg),
            FetchError::Failed(msg) => write!(f, "report fetch failed: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Normalizes a server address into the full report URL.
///
/// `localhost:1978` becomes `http://localhost:1978/rpc/report`; addresses
/// already carrying a scheme or the report path keep them. The host is
/// checked on the address as given, before the report path is appended.
pub fn report_url(server: &str) -> Result<Url, FetchError> {
    let server = server.trim();
    let base = if server.contains("://") {
        server.to_string()
    } else {
        format!("http://{server}")
    };

    let mut url = Url::parse(&base).map_err(|e| FetchError::InvalidUrl(format!("{base}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(FetchError::InvalidUrl(format!(
            "{base}: unsupported scheme {}",
            url.scheme()
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::InvalidUrl(format!("{base}: missing host")));
    }

    if !url.path().contains(REPORT_PATH) {
        let prefix = url.path().strip_suffix('/').unwrap_or(url.path());
        let path = format!("{prefix}{REPORT_PATH}");
        url.set_path(&path);
    }

    Ok(url)
}

/// Fetches the raw report with a single bounded request.
#[derive(Debug, Clone)]
pub struct ReportFetcher {
    client: Client,
    url: Url,
}

impl ReportFetcher {
    /// Creates a fetcher for `server` with the given request timeout.
    pub fn new(server: &str, timeout: Duration) -> Result<Self, FetchError> {
        let url = report_url(server)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::InvalidUrl(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Issues one GET against the report endpoint. No retries.
    pub async fn fetch(&self) -> Result<String, FetchError> {
        let resp = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Failed(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::Failed(e.to_string()))?;

        if status != StatusCode::OK {
            return Err(FetchError::Failed(format!("status {status}: {}", body.trim())));
        }

        debug!(url = %self.url, bytes = body.len(), "fetched report");
        Ok(body)
    }
}
