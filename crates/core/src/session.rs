//! The pooled, reusable network session.
//!
//! One [`reqwest::Client`] (and therefore one connection pool) is shared by
//! every fetch. It is created lazily on first use, re-created after
//! [`SessionPool::close`], and concurrency is capped by a semaphore sized to
//! the configured connection limit. Callers contend on the lock only while
//! the client is being created or swapped out; requests themselves run on a
//! cloned handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderValue};
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};

use crate::fetch::FetchConfig;

/// Browser-like request headers sent with every request.
///
/// `Accept-Encoding` is left to reqwest so compressed bodies are decoded.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
    );
    headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
    headers
}

/// Lazily initialised shared client plus its concurrency limit.
pub struct SessionPool {
    config: FetchConfig,
    client: RwLock<Option<Client>>,
    permits: Arc<Semaphore>,
    generation: AtomicU64,
}

impl SessionPool {
    pub fn new(config: FetchConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_connections.max(1)));
        Self { config, client: RwLock::new(None), permits, generation: AtomicU64::new(0) }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Returns the live client, building one if none exists.
    pub async fn client(&self) -> reqwest::Result<Client> {
        if let Some(client) = self.client.read().await.as_ref() {
            return Ok(client.clone());
        }

        let mut slot = self.client.write().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = self.build_client()?;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!(
            generation,
            max_connections = self.config.max_connections,
            "created pooled http session"
        );
        *slot = Some(client.clone());
        Ok(client)
    }

    /// Waits for one of the connection slots.
    pub async fn acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.permits.clone().acquire_owned().await.ok()
    }

    /// Drops the shared client. In-flight requests keep their handle; the
    /// next call to [`SessionPool::client`] builds a fresh one.
    pub async fn close(&self) {
        if self.client.write().await.take().is_some() {
            tracing::debug!("closed pooled http session");
        }
    }

    pub async fn is_open(&self) -> bool {
        self.client.read().await.is_some()
    }

    /// Number of clients built so far.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    fn build_client(&self) -> reqwest::Result<Client> {
        let config = &self.config;
        if config.accept_invalid_certs {
            tracing::warn!("TLS certificate validation is disabled; use only for local testing");
        }

        Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(browser_headers())
            .pool_max_idle_per_host(config.max_connections)
            .redirect(reqwest::redirect::Policy::limited(10))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
    }
}
