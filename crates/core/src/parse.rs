//! HTML parsing and DOM navigation.
//!
//! This module provides the [`Document`] and [`Element`] types for parsing
//! markup and walking the tree with CSS selectors. Parsing goes through
//! html5ever (via `scraper`), which recovers from malformed or truncated
//! input the way browsers do and never fails.
//!
//! # Example
//!
//! ```rust
//! use gleaner_core::parse::Document;
//!
//! let html = r#"
//!     <html>
//!         <body>
//!             <h1>Title</h1>
//!             <p class="content">Paragraph</p>
//!         </body>
//!     </html>
//! "#;
//!
//! let doc = Document::parse(html);
//! let paragraphs = doc.select("p.content").unwrap();
//! assert_eq!(paragraphs.len(), 1);
//! ```

use scraper::{Html, Selector};

use crate::preprocess::{self, PreprocessConfig};
use crate::{GleanerError, Result};

/// Represents a parsed HTML document.
///
/// # Example
///
/// ```rust
/// use gleaner_core::parse::Document;
///
/// let html = "<html><head><title>Test</title></head><body><p>Hello</p></body></html>";
/// let doc = Document::parse(html);
/// assert_eq!(doc.title(), Some("Test".to_string()));
/// ```
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses HTML from a string without preprocessing.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Parses HTML after stripping the non-visible subtrees named by `config`.
    ///
    /// The streaming rewrite removes the tags before parsing; any that survive
    /// it (the rewriter bails out on some inputs) are detached from the tree.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gleaner_core::parse::Document;
    /// use gleaner_core::PreprocessConfig;
    ///
    /// let html = "<body><script>track()</script><p>Visible</p></body>";
    /// let doc = Document::parse_with_preprocessing(html, &PreprocessConfig::default());
    /// assert!(!doc.text_content().contains("track"));
    /// ```
    pub fn parse_with_preprocessing(html: &str, config: &PreprocessConfig) -> Self {
        let cleaned = preprocess::preprocess_html(html, config);
        let mut doc = Self::parse(&cleaned);
        doc.detach_tags(&config.stripped_tags());
        doc
    }

    fn detach_tags(&mut self, tags: &[&str]) {
        if tags.is_empty() {
            return;
        }

        let Ok(selector) = Selector::parse(&tags.join(", ")) else {
            return;
        };

        let ids: Vec<_> = self.html.select(&selector).map(|el| el.id()).collect();
        for id in ids {
            if let Some(mut node) = self.html.tree.get_mut(id) {
                node.detach();
            }
        }
    }

    /// Serializes the whole document back to markup.
    pub fn as_string(&self) -> String {
        self.html.html()
    }

    /// Selects elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`GleanerError::InvalidSelector`] if the selector is invalid.
    ///
    /// # Example
    ///
    /// ```rust
    /// use gleaner_core::parse::Document;
    ///
    /// let html = r#"<p class="content">First</p><p class="content">Second</p>"#;
    /// let doc = Document::parse(html);
    /// let elements = doc.select("p.content").unwrap();
    /// assert_eq!(elements.len(), 2);
    /// ```
    pub fn select(&'_ self, selector: &str) -> Result<Vec<Element<'_>>> {
        let sel = compile(selector)?;
        Ok(self.html.select(&sel).map(|el| Element { element: el }).collect())
    }

    /// Gets the trimmed text of the first `<title>` element, if any.
    pub fn title(&self) -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        self.html
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<String>().trim().to_string())
    }

    /// Gets all text content from the document.
    pub fn text_content(&self) -> String {
        self.html.root_element().text().collect()
    }
}

fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| GleanerError::InvalidSelector(format!("{selector}: {e}")))
}

/// A wrapper around scraper's ElementRef.
///
/// # Example
///
/// ```rust
/// use gleaner_core::parse::Document;
///
/// let html = r#"<a href="https://example.com"> Link text </a>"#;
/// let doc = Document::parse(html);
/// let link = &doc.select("a").unwrap()[0];
///
/// assert_eq!(link.trimmed_text(), "Link text");
/// assert_eq!(link.attr("href"), Some("https://example.com"));
/// ```
#[derive(Clone, Debug)]
pub struct Element<'a> {
    element: scraper::ElementRef<'a>,
}

impl<'a> Element<'a> {
    /// Gets the concatenation of all text nodes within this element.
    pub fn text(&self) -> String {
        self.element.text().collect()
    }

    /// Gets the text content with surrounding whitespace removed.
    pub fn trimmed_text(&self) -> String {
        self.text().trim().to_string()
    }

    /// Gets the value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        self.element.value().attr(name)
    }

    /// Gets the lowercase tag name.
    pub fn tag_name(&self) -> String {
        self.element.value().name().to_lowercase()
    }

    /// Whether any ancestor of this element has the given tag name.
    pub fn has_ancestor(&self, tag: &str) -> bool {
        self.element
            .ancestors()
            .filter_map(scraper::ElementRef::wrap)
            .any(|el| el.value().name().eq_ignore_ascii_case(tag))
    }

    /// Selects descendant elements using a CSS selector.
    ///
    /// # Errors
    ///
    /// Returns [`GleanerError::InvalidSelector`] if the selector is invalid.
    pub fn select(&self, selector: &str) -> Result<Vec<Element<'a>>> {
        let sel = compile(selector)?;
        Ok(self.element.select(&sel).map(|el| Element { element: el }).collect())
    }
}
