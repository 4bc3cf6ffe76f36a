//! Markup to [`ContentRecord`] extraction.
//!
//! Extraction is a pure function of the markup and the [`ExtractConfig`]:
//! no I/O, no retries, and no error ever leaves [`extract`]. Each facet runs
//! behind its own fault boundary, so a failure while reading tables leaves
//! the tables empty and the paragraphs intact. Degraded facets are logged at
//! `warn` with the facet name.
//!
//! # Example
//!
//! ```rust
//! use gleaner_core::extract;
//!
//! let record = extract("<p>short</p><p>this paragraph has more than twenty characters</p>");
//! assert_eq!(record.paragraphs, vec!["this paragraph has more than twenty characters"]);
//! ```

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use crate::contact::{self, DEFAULT_SOCIAL_HOSTS};
use crate::parse::{Document, Element};
use crate::preprocess::PreprocessConfig;
use crate::record::{ContentRecord, Link, Lists, Table};
use crate::{GleanerError, Result};

/// Default minimum paragraph length, in characters, after trimming.
pub const MIN_PARAGRAPH_CHARS: usize = 20;

/// Configuration for content extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Paragraphs must be strictly longer than this many characters (default: 20).
    pub min_paragraph_chars: usize,

    /// Hosts whose anchors count as social links.
    pub social_hosts: Vec<String>,

    /// Subtrees stripped before any text is read.
    pub preprocess: PreprocessConfig,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            min_paragraph_chars: MIN_PARAGRAPH_CHARS,
            social_hosts: DEFAULT_SOCIAL_HOSTS.iter().map(|h| h.to_string()).collect(),
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl ExtractConfig {
    /// Creates a new builder for ExtractConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gleaner_core::ExtractConfig;
    ///
    /// let config = ExtractConfig::builder().min_paragraph_chars(40).build();
    /// assert_eq!(config.min_paragraph_chars, 40);
    /// ```
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder::new()
    }
}

/// Builder for ExtractConfig.
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: ExtractConfig::default() }
    }

    /// Sets the paragraph length threshold.
    pub fn min_paragraph_chars(mut self, value: usize) -> Self {
        self.config.min_paragraph_chars = value;
        self
    }

    /// Replaces the social host list.
    pub fn social_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.social_hosts = hosts.into_iter().map(|h| h.into().to_lowercase()).collect();
        self
    }

    /// Sets the preprocessing options.
    pub fn preprocess(mut self, value: PreprocessConfig) -> Self {
        self.config.preprocess = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> ExtractConfig {
        self.config
    }
}

impl Default for ExtractConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Reusable extractor holding its configuration.
///
/// # Example
///
/// ```rust
/// use gleaner_core::{ExtractConfig, Extractor};
///
/// let extractor = Extractor::with_config(ExtractConfig::builder().min_paragraph_chars(5).build());
/// let record = extractor.extract("<p>tiny words</p>");
/// assert_eq!(record.paragraphs.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractConfig,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ExtractConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Extracts a record from raw markup. Never fails.
    pub fn extract(&self, markup: &str) -> ContentRecord {
        extract_with_config(markup, &self.config)
    }
}

/// Extracts a record with the default configuration.
pub fn extract(markup: &str) -> ContentRecord {
    extract_with_config(markup, &ExtractConfig::default())
}

/// Extracts a record with a custom configuration.
///
/// If building the document tree itself faults, the whole record falls back
/// to its empty value.
pub fn extract_with_config(markup: &str, config: &ExtractConfig) -> ContentRecord {
    let parsed = panic::catch_unwind(AssertUnwindSafe(|| Document::parse_with_preprocessing(markup, &config.preprocess)));

    match parsed {
        Ok(doc) => extract_document(&doc, config),
        Err(_) => {
            tracing::warn!(bytes = markup.len(), "document parsing faulted, returning empty record");
            ContentRecord::default()
        }
    }
}

/// Extracts every facet from an already parsed document.
pub fn extract_document(doc: &Document, config: &ExtractConfig) -> ContentRecord {
    let serialized = facet("serialized", || Ok(doc.as_string()));

    let record = ContentRecord {
        title: facet("title", || Ok(doc.title().unwrap_or_default())),
        meta_description: facet("meta_description", || extract_meta_description(doc)),
        headings: facet("headings", || extract_headings(doc)),
        paragraphs: facet("paragraphs", || extract_paragraphs(doc, config.min_paragraph_chars)),
        links: facet("links", || extract_links(doc)),
        lists: facet("lists", || extract_lists(doc)),
        tables: facet("tables", || extract_tables(doc)),
        contact_info: facet("contact_info", || Ok(contact::extract_contact_info(&serialized))),
        social_links: facet("social_links", || contact::extract_social_links(doc, &config.social_hosts)),
    };

    tracing::debug!(
        paragraphs = record.paragraphs.len(),
        links = record.links.len(),
        tables = record.tables.len(),
        empty = record.is_empty(),
        "extraction finished"
    );

    record
}

/// Runs one facet, reducing any error or panic to the facet's empty value.
fn facet<T: Default>(name: &'static str, run: impl FnOnce() -> Result<T>) -> T {
    let reason = match panic::catch_unwind(AssertUnwindSafe(run)) {
        Ok(Ok(value)) => return value,
        Ok(Err(err)) => err.to_string(),
        Err(payload) => panic_message(payload.as_ref()),
    };

    let degraded = GleanerError::ParseDegraded { facet: name, reason };
    tracing::warn!(facet = name, error = %degraded, "facet reduced to empty value");
    T::default()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic during extraction".to_string()
    }
}

/// Trimmed text, or `None` when the element holds only whitespace.
fn visible_text(el: &Element<'_>) -> Option<String> {
    let text = el.trimmed_text();
    (!text.is_empty()).then_some(text)
}

fn extract_meta_description(doc: &Document) -> Result<String> {
    Ok(doc
        .select(r#"meta[name="description"]"#)?
        .first()
        .and_then(|el| el.attr("content"))
        .map(|content| content.trim().to_string())
        .unwrap_or_default())
}

fn extract_headings(doc: &Document) -> Result<BTreeMap<u8, Vec<String>>> {
    let mut headings = BTreeMap::new();

    for level in 1..=6u8 {
        let texts: Vec<String> = doc.select(&format!("h{level}"))?.iter().filter_map(visible_text).collect();
        if !texts.is_empty() {
            headings.insert(level, texts);
        }
    }

    Ok(headings)
}

fn extract_paragraphs(doc: &Document, min_chars: usize) -> Result<Vec<String>> {
    Ok(doc
        .select("p")?
        .iter()
        .filter_map(visible_text)
        .filter(|text| text.chars().count() > min_chars)
        .collect())
}

fn extract_links(doc: &Document) -> Result<Vec<Link>> {
    let mut links = Vec::new();

    for anchor in doc.select("a[href]")? {
        let Some(href) = anchor.attr("href") else {
            continue;
        };

        if href.is_empty() || href.starts_with('#') {
            continue;
        }

        if let Some(text) = visible_text(&anchor) {
            links.push(Link::new(href, text));
        }
    }

    Ok(links)
}

fn extract_lists(doc: &Document) -> Result<Lists> {
    Ok(Lists { ordered: list_items(doc, "ol")?, unordered: list_items(doc, "ul")? })
}

/// One item sequence per list element; lists whose items are all blank are dropped.
fn list_items(doc: &Document, tag: &str) -> Result<Vec<Vec<String>>> {
    let mut lists = Vec::new();

    for list in doc.select(tag)? {
        let items: Vec<String> = list.select("li")?.iter().filter_map(visible_text).collect();
        if !items.is_empty() {
            lists.push(items);
        }
    }

    Ok(lists)
}

fn extract_tables(doc: &Document) -> Result<Vec<Table>> {
    let mut tables = Vec::new();

    for table in doc.select("table")? {
        let headers = match table.select("thead")?.first() {
            Some(head) => head.select("th, td")?.iter().map(Element::trimmed_text).collect(),
            None => Vec::new(),
        };

        let mut rows = Vec::new();
        for row in table.select("tr")? {
            if row.has_ancestor("thead") {
                continue;
            }

            let cells: Vec<String> = row.select("td, th")?.iter().map(Element::trimmed_text).collect();
            if !cells.is_empty() {
                rows.push(cells);
            }
        }

        if !rows.is_empty() {
            tables.push(Table { headers, rows });
        }
    }

    Ok(tables)
}
