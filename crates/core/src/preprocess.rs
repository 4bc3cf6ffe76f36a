//! Removal of non-visible subtrees before any text is read.
//!
//! Script, style, iframe and noscript bodies would otherwise leak code and
//! fallback markup into prose fields. Removal happens on the byte stream with
//! `lol_html`, so it runs before the document tree is ever built.

use std::sync::LazyLock;

use regex::Regex;

static COMMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex"));

/// Configuration for HTML preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove script tags
    pub remove_scripts: bool,
    /// Whether to remove style tags
    pub remove_styles: bool,
    /// Whether to remove iframe tags
    pub remove_iframes: bool,
    /// Whether to remove noscript tags
    pub remove_noscript: bool,
    /// Whether to drop HTML comments
    pub remove_comments: bool,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { remove_scripts: true, remove_styles: true, remove_iframes: true, remove_noscript: true, remove_comments: false }
    }
}

impl PreprocessConfig {
    /// Tag names this configuration strips, in a fixed order.
    pub fn stripped_tags(&self) -> Vec<&'static str> {
        [
            (self.remove_scripts, "script"),
            (self.remove_styles, "style"),
            (self.remove_iframes, "iframe"),
            (self.remove_noscript, "noscript"),
        ]
        .into_iter()
        .filter_map(|(enabled, tag)| enabled.then_some(tag))
        .collect()
    }
}

/// Preprocess HTML by removing unwanted subtrees.
///
/// Never fails: if the rewriter rejects the input the original markup is
/// returned and the caller's tree walk is responsible for skipping the tags.
pub fn preprocess_html(html: &str, config: &PreprocessConfig) -> String {
    let mut processed = remove_unwanted_tags(html, config);

    if config.remove_comments {
        processed = remove_comments(&processed);
    }

    processed
}

/// Remove script, style, iframe and noscript elements together with their content
fn remove_unwanted_tags(html: &str, config: &PreprocessConfig) -> String {
    let tags = config.stripped_tags();
    if tags.is_empty() || html.is_empty() {
        return html.to_string();
    }

    let mut output = String::with_capacity(html.len());
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: tags
                .iter()
                .map(|tag| {
                    lol_html::element!(*tag, |el| {
                        el.remove();
                        Ok(())
                    })
                })
                .collect(),
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if let Err(err) = rewriter.write(html.as_bytes()) {
        tracing::warn!(error = %err, "preprocessing rewrite failed, keeping original markup");
        return html.to_string();
    }

    if let Err(err) = rewriter.end() {
        tracing::warn!(error = %err, "preprocessing rewrite failed, keeping original markup");
        return html.to_string();
    }

    output
}

/// Remove HTML comments from the document
fn remove_comments(html: &str) -> String {
    COMMENT_PATTERN.replace_all(html, "").to_string()
}
