//! Configuration objects.
//!
//! [`GleanerConfig`] bundles what the fetch → extract pipeline needs.
//! [`AssistantConfig`] is the explicit configuration handed to a
//! question-answering collaborator; it is validated at construction and
//! never read from ambient process state after that.

use std::env;

use crate::extract::ExtractConfig;
use crate::formatters::text::{DEFAULT_DIGEST_BUDGET, text_digest};
use crate::record::ContentRecord;
use crate::{GleanerError, Result};

#[cfg(feature = "fetch")]
use crate::fetch::FetchConfig;
#[cfg(feature = "fetch")]
use crate::retry::RetryPolicy;

/// Configuration for the whole fetch → extract pipeline.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use gleaner_core::GleanerConfig;
///
/// let config = GleanerConfig::builder()
///     .timeout(Duration::from_secs(60))
///     .max_retries(5)
///     .min_paragraph_chars(40)
///     .build();
/// assert_eq!(config.fetch.retry.max_retries, 5);
/// ```
#[cfg(feature = "fetch")]
#[derive(Debug, Clone, Default)]
pub struct GleanerConfig {
    pub fetch: FetchConfig,
    pub extract: ExtractConfig,
}

#[cfg(feature = "fetch")]
impl GleanerConfig {
    pub fn builder() -> GleanerConfigBuilder {
        GleanerConfigBuilder::new()
    }
}

/// Builder for [`GleanerConfig`].
#[cfg(feature = "fetch")]
#[derive(Debug, Clone, Default)]
pub struct GleanerConfigBuilder {
    config: GleanerConfig,
}

#[cfg(feature = "fetch")]
impl GleanerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total request timeout.
    pub fn timeout(mut self, value: std::time::Duration) -> Self {
        self.config.fetch.timeout = value;
        self
    }

    pub fn connect_timeout(mut self, value: std::time::Duration) -> Self {
        self.config.fetch.connect_timeout = value;
        self
    }

    /// Total attempts per fetch, the first included.
    pub fn max_retries(mut self, value: u32) -> Self {
        self.config.fetch.retry.max_retries = value;
        self
    }

    pub fn retry_policy(mut self, value: RetryPolicy) -> Self {
        self.config.fetch.retry = value;
        self
    }

    pub fn max_connections(mut self, value: usize) -> Self {
        self.config.fetch.max_connections = value;
        self
    }

    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.config.fetch.user_agent = value.into();
        self
    }

    /// Disables TLS certificate validation. Debug use only.
    pub fn accept_invalid_certs(mut self, value: bool) -> Self {
        self.config.fetch.accept_invalid_certs = value;
        self
    }

    pub fn min_paragraph_chars(mut self, value: usize) -> Self {
        self.config.extract.min_paragraph_chars = value;
        self
    }

    pub fn extract(mut self, value: ExtractConfig) -> Self {
        self.config.extract = value;
        self
    }

    pub fn build(self) -> GleanerConfig {
        self.config
    }
}

/// Environment variable read by [`AssistantConfig::from_env`] when no other
/// name is given.
pub const DEFAULT_API_KEY_VAR: &str = "GLEANER_API_KEY";

/// Configuration of the question-answering collaborator.
///
/// Holds the API key and the character budget of the text digest passed as
/// context. Construction fails when the key is missing.
#[derive(Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    api_key: String,
    pub context_budget: usize,
}

impl std::fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &"<redacted>")
            .field("context_budget", &self.context_budget)
            .finish()
    }
}

impl AssistantConfig {
    /// Fails with [`GleanerError::ConfigError`] when `api_key` is blank.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GleanerError::ConfigError("api key is required".to_string()));
        }
        Ok(Self { api_key, context_budget: DEFAULT_DIGEST_BUDGET })
    }

    /// Reads the key from the environment variable `var`.
    pub fn from_env(var: &str) -> Result<Self> {
        let api_key = env::var(var).map_err(|e| GleanerError::ConfigError(format!("{var}: {e}")))?;
        Self::new(api_key).map_err(|_| GleanerError::ConfigError(format!("{var} is set but blank")))
    }

    pub fn with_context_budget(mut self, budget: usize) -> Self {
        self.context_budget = budget;
        self
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The text digest of `record` within this configuration's budget.
    pub fn context_for(&self, record: &ContentRecord) -> String {
        text_digest(record, self.context_budget)
    }
}
