//! Content fetching from URLs, files, and stdin.
//!
//! [`Fetcher`] performs a bounded-retry GET of one URL over the shared
//! [`SessionPool`]. The retry decisions come from the pure state machine in
//! [`crate::retry`]; this module only issues requests, classifies what came
//! back, and sleeps. Sleeps and requests race a [`CancellationToken`] so a
//! caller can abort an in-flight retry loop.
//!
//! # Example
//!
//! ```rust,no_run
//! use gleaner_core::{FetchConfig, Fetcher};
//!
//! # async fn example() -> Result<(), gleaner_core::FetchError> {
//! let fetcher = Fetcher::new(FetchConfig::default());
//! let page = fetcher.fetch("https://example.com").await?;
//! println!("{} bytes after {} attempt(s)", page.body.len(), page.attempts);
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;
use reqwest::header::RETRY_AFTER;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::{FetchError, FetchErrorKind};
use crate::retry::{AttemptOutcome, RetryPolicy, RetryState};
use crate::session::SessionPool;
use crate::{GleanerError, Result};

/// Default User-Agent: a current desktop browser.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default cap on concurrent connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Time allowed to establish a connection (default: 10s).
    pub connect_timeout: Duration,
    /// Time allowed for the whole request, body included (default: 30s).
    pub timeout: Duration,
    /// Maximum concurrent requests on the shared session (default: 10).
    pub max_connections: usize,
    /// User-Agent header value.
    pub user_agent: String,
    /// Skip TLS certificate validation. Never enable outside local testing.
    pub accept_invalid_certs: bool,
    /// Retry limits and delays.
    pub retry: RetryPolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            timeout: Duration::from_secs(30),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_invalid_certs: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub body: String,
    pub status: u16,
    /// Requests issued, the successful one included.
    pub attempts: u32,
}

/// `Success | Failure` of one fetch.
pub type FetchResult = std::result::Result<FetchedPage, FetchError>;

/// Checks the fetch precondition: a non-empty absolute `http(s)` URL.
pub fn validate_url(url: &str) -> std::result::Result<Url, FetchError> {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(FetchError::invalid_url(format!(
            "URL must start with http:// or https://: {url:?}"
        )));
    }

    let parsed = Url::parse(url).map_err(|e| FetchError::invalid_url(format!("{url}: {e}")))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(FetchError::invalid_url(format!("URL has no host: {url}")));
    }

    Ok(parsed)
}

/// Retrying page fetcher over a shared connection pool.
///
/// Safe to share between tasks (wrap it in an `Arc`); the only shared mutable
/// state is the session pool.
pub struct Fetcher {
    pool: SessionPool,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Self {
        Self { pool: SessionPool::new(config) }
    }

    pub fn config(&self) -> &FetchConfig {
        self.pool.config()
    }

    pub fn session(&self) -> &SessionPool {
        &self.pool
    }

    /// Fetches `url` with the configured retry budget.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        self.fetch_with_retries(url, self.config().retry.max_retries).await
    }

    /// Fetches `url` with an explicit attempt budget.
    pub async fn fetch_with_retries(&self, url: &str, max_retries: u32) -> FetchResult {
        self.fetch_cancellable(url, max_retries, &CancellationToken::new()).await
    }

    /// Fetches `url`, giving up with [`FetchErrorKind::Cancelled`] as soon as
    /// `cancel` fires (during a request or a backoff sleep).
    pub async fn fetch_cancellable(&self, url: &str, max_retries: u32, cancel: &CancellationToken) -> FetchResult {
        let parsed = validate_url(url).inspect_err(|e| tracing::warn!(url, error = %e, "rejected url"))?;
        let policy = RetryPolicy { max_retries: max_retries.max(1), ..self.config().retry.clone() };

        let mut state = RetryState::Attempting { attempt: 1 };
        let mut last_status = None;

        loop {
            let attempt = match state {
                RetryState::Attempting { attempt } => attempt,
                _ => unreachable!("loop only resumes in the attempting state"),
            };

            tracing::info!(url, attempt, max = policy.max_retries, "fetching page");

            let (outcome, body) = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(self.cancelled(url, attempt, last_status));
                }
                result = self.attempt(&parsed) => result,
            };

            if let Some(status) = outcome.status() {
                last_status = Some(status);
            }

            let jitter = rand::rng().random::<f64>();
            state = policy.transition(attempt, &outcome, jitter);

            match state {
                RetryState::Success => {
                    let status = last_status.unwrap_or(200);
                    tracing::info!(url, attempt, status, bytes = body.len(), "fetched successfully");
                    return Ok(FetchedPage { body, status, attempts: attempt });
                }
                RetryState::Backoff { next_attempt, delay, reason } => {
                    tracing::warn!(
                        url,
                        attempt,
                        next_attempt,
                        reason = %reason,
                        detail = %outcome.describe(),
                        delay_ms = delay.as_millis() as u64,
                        "attempt failed, backing off"
                    );

                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(self.cancelled(url, attempt, last_status));
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }

                    state = state.after_backoff();
                }
                RetryState::TerminalFailure { kind, exhausted } => {
                    let detail = outcome.describe();
                    if exhausted {
                        // the pool may hold a poisoned connection; start clean next time
                        self.pool.close().await;
                    }

                    tracing::error!(url, attempts = attempt, kind = %kind, exhausted, detail = %detail, "giving up");
                    return Err(FetchError::new(kind, attempt, last_status, detail));
                }
                RetryState::Attempting { .. } => unreachable!("transition never yields attempting"),
            }
        }
    }

    /// Releases the pooled session. The next fetch builds a new one.
    pub async fn shutdown(&self) {
        self.pool.close().await;
    }

    /// Issues one GET and classifies the result. The body is empty unless the
    /// response arrived and was read.
    async fn attempt(&self, url: &Url) -> (AttemptOutcome, String) {
        let client = match self.pool.client().await {
            Ok(client) => client,
            Err(e) => return (AttemptOutcome::Transport(format!("failed to build http client: {e}")), String::new()),
        };

        let Some(_permit) = self.pool.acquire().await else {
            return (AttemptOutcome::Transport("connection pool is shut down".to_string()), String::new());
        };

        let response = match client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return (classify_transport(&e), String::new()),
        };

        let status = response.status().as_u16();
        let retry_after = response.headers().contains_key(RETRY_AFTER);
        tracing::debug!(url = %url, status, "response received");

        match response.text().await {
            Ok(body) => {
                let blank_body = body.trim().is_empty();
                (AttemptOutcome::Response { status, blank_body, retry_after }, body)
            }
            Err(e) => (classify_transport(&e), String::new()),
        }
    }

    fn cancelled(&self, url: &str, attempt: u32, last_status: Option<u16>) -> FetchError {
        tracing::info!(url, attempt, "fetch cancelled");
        FetchError::new(FetchErrorKind::Cancelled, attempt, last_status, "cancelled by caller")
    }
}

fn classify_transport(err: &reqwest::Error) -> AttemptOutcome {
    if err.is_timeout() { AttemptOutcome::Timeout } else { AttemptOutcome::Transport(err.to_string()) }
}

/// Reads HTML content from a local file.
///
/// Callers should validate and sanitize the path when accepting user input.
pub fn fetch_file(path: &str) -> Result<String> {
    let path_buf = PathBuf::from(path);

    if !path_buf.exists() {
        Err(GleanerError::FileNotFound(path_buf))
    } else {
        fs::read_to_string(&path_buf).map_err(GleanerError::from)
    }
}

/// Reads HTML content from standard input until EOF.
pub fn fetch_stdin() -> Result<String> {
    use std::io::{self, Read};

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer).map_err(GleanerError::from)?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_config_default() {
        let config = FetchConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.retry.max_retries, 3);
        assert!(!config.accept_invalid_certs);
        assert!(config.user_agent.contains("Mozilla"));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("https://example.com/path?q=1").is_ok());

        for bad in ["", "example.com", "ftp://example.com", "https://", "javascript:alert(1)"] {
            let err = validate_url(bad).unwrap_err();
            assert_eq!(err.kind, FetchErrorKind::InvalidUrl, "{bad:?} should be rejected");
        }
    }

    #[tokio::test]
    async fn test_fetch_invalid_url_makes_no_attempt() {
        let fetcher = Fetcher::new(FetchConfig::default());
        let err = fetcher.fetch("not-a-url").await.unwrap_err();

        assert_eq!(err.kind, FetchErrorKind::InvalidUrl);
        assert_eq!(err.attempts, 0);
        assert!(!fetcher.session().is_open().await);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_attempt() {
        let fetcher = Fetcher::new(FetchConfig::default());
        let token = CancellationToken::new();
        token.cancel();

        let err = fetcher.fetch_cancellable("http://127.0.0.1:9/", 3, &token).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Cancelled);
    }

    #[test]
    fn test_fetch_file_not_found() {
        let result = fetch_file("/nonexistent/path/file.html");
        assert!(matches!(result, Err(GleanerError::FileNotFound(_))));
    }

    #[test]
    fn test_fetch_file_reads_markup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(&path, "<p>saved</p>").unwrap();

        let html = fetch_file(path.to_str().unwrap()).unwrap();
        assert_eq!(html, "<p>saved</p>");
    }
}
