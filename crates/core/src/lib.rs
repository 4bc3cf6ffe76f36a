pub mod config;
pub mod contact;
pub mod error;
pub mod extract;
#[cfg(feature = "fetch")]
pub mod fetch;
pub mod formatters;
#[cfg(feature = "fetch")]
pub mod glean;
pub mod parse;
pub mod preprocess;
pub mod record;
pub mod retry;
#[cfg(feature = "fetch")]
pub mod session;

pub use config::{AssistantConfig, DEFAULT_API_KEY_VAR};
#[cfg(feature = "fetch")]
pub use config::{GleanerConfig, GleanerConfigBuilder};
pub use contact::{DEFAULT_SOCIAL_HOSTS, extract_contact_info, extract_emails, extract_phones, extract_social_links};
pub use error::{FetchError, FetchErrorKind, GleanerError, Result};
pub use extract::{ExtractConfig, ExtractConfigBuilder, Extractor, extract, extract_document, extract_with_config};
#[cfg(feature = "fetch")]
pub use fetch::{FetchConfig, FetchResult, FetchedPage, Fetcher, fetch_file, fetch_stdin, validate_url};
pub use formatters::{DEFAULT_DIGEST_BUDGET, FlatRow, JsonConfig, JsonFormatter, TextConfig, TextFormatter};
pub use formatters::{flatten, record_to_json, record_to_text, records_to_json, text_digest, to_csv};
#[cfg(feature = "fetch")]
pub use glean::{Gleaner, glean, glean_with_config};
pub use parse::{Document, Element};
#[doc(hidden)]
pub use preprocess::PreprocessConfig;
pub use preprocess::preprocess_html;
pub use record::{ContactInfo, ContentRecord, Link, Lists, Table};
pub use retry::{AttemptOutcome, RetryPolicy, RetryState};
#[cfg(feature = "fetch")]
pub use session::{SessionPool, browser_headers};
