//! The fetch → extract pipeline.
//!
//! # Example
//!
//! ```no_run
//! use gleaner_core::glean;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let record = glean("https://example.com").await?;
//!     println!("{}: {} paragraphs", record.title, record.paragraphs.len());
//!     Ok(())
//! }
//! ```

use tokio_util::sync::CancellationToken;

use crate::config::GleanerConfig;
use crate::extract::Extractor;
use crate::fetch::Fetcher;
use crate::record::ContentRecord;
use crate::{GleanerError, Result};

/// Fetches pages and extracts their records.
///
/// Holds one [`Fetcher`] so every page gleaned through the same instance
/// shares the pooled session.
pub struct Gleaner {
    fetcher: Fetcher,
    extractor: Extractor,
}

impl Gleaner {
    pub fn new() -> Self {
        Self::with_config(GleanerConfig::default())
    }

    pub fn with_config(config: GleanerConfig) -> Self {
        Self { fetcher: Fetcher::new(config.fetch), extractor: Extractor::with_config(config.extract) }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Fetches `url` and extracts its record.
    ///
    /// Fails with [`GleanerError::Fetch`] when the page could not be
    /// retrieved and with [`GleanerError::NoUsableContent`] when every facet
    /// of the record came out empty.
    pub async fn glean(&self, url: &str) -> Result<ContentRecord> {
        self.glean_cancellable(url, &CancellationToken::new()).await
    }

    /// [`Gleaner::glean`] that aborts when `cancel` fires.
    pub async fn glean_cancellable(&self, url: &str, cancel: &CancellationToken) -> Result<ContentRecord> {
        let max_retries = self.fetcher.config().retry.max_retries;
        let page = self.fetcher.fetch_cancellable(url, max_retries, cancel).await?;

        let record = self.extractor.extract(&page.body);
        if record.is_empty() {
            tracing::warn!(url, bytes = page.body.len(), "page yielded no usable content");
            return Err(GleanerError::NoUsableContent);
        }

        Ok(record)
    }

    /// Closes the pooled session.
    pub async fn shutdown(&self) {
        self.fetcher.shutdown().await;
    }
}

impl Default for Gleaner {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetches and extracts one page with default configuration.
pub async fn glean(url: &str) -> Result<ContentRecord> {
    Gleaner::new().glean(url).await
}

/// Fetches and extracts one page with a custom configuration.
pub async fn glean_with_config(url: &str, config: &GleanerConfig) -> Result<ContentRecord> {
    Gleaner::with_config(config.clone()).glean(url).await
}
