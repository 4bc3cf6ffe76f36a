//! The structured content record produced by extraction.
//!
//! Every field is always present: facets that found nothing hold their empty
//! value rather than being omitted, so the JSON shape is the same for every
//! page.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The normalized structured representation of a page's content.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRecord {
    /// Trimmed text of the first `<title>`.
    pub title: String,

    /// Trimmed `content` of `<meta name="description">`.
    pub meta_description: String,

    /// Heading level (1-6) to heading texts in document order. Levels with
    /// no non-blank headings are absent.
    pub headings: BTreeMap<u8, Vec<String>>,

    /// Paragraph texts longer than the configured minimum.
    pub paragraphs: Vec<String>,

    pub links: Vec<Link>,

    pub lists: Lists,

    pub tables: Vec<Table>,

    pub contact_info: ContactInfo,

    /// Lower-cased hrefs pointing at a known social host, unique, first-seen order.
    pub social_links: Vec<String>,
}

/// An anchor with a non-fragment href and non-blank text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// The href exactly as written (not resolved against any base).
    pub url: String,

    #[serde(rename = "anchorText", alias = "text")]
    pub text: String,
}

impl Link {
    pub fn new(url: impl Into<String>, text: impl Into<String>) -> Self {
        Self { url: url.into(), text: text.into() }
    }
}

/// Item texts per list element, split by list kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lists {
    pub ordered: Vec<Vec<String>>,
    pub unordered: Vec<Vec<String>>,
}

impl Lists {
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty() && self.unordered.is_empty()
    }

    /// All items, ordered lists first, each list in document order.
    pub fn items(&self) -> impl Iterator<Item = &str> {
        self.ordered.iter().chain(self.unordered.iter()).flatten().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Cell texts of the `<thead>` row(s), empty when the table has no head.
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    /// Always empty: there is no reliable street-address heuristic.
    pub addresses: Vec<String>,
}

impl ContactInfo {
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty() && self.phones.is_empty() && self.addresses.is_empty()
    }
}

impl ContentRecord {
    /// True when every facet holds its empty value.
    ///
    /// Blocked pages, interstitials and non-HTML bodies typically land here;
    /// callers report these as "no usable content found".
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.meta_description.is_empty()
            && self.headings.is_empty()
            && self.paragraphs.is_empty()
            && self.links.is_empty()
            && self.lists.is_empty()
            && self.tables.is_empty()
            && self.contact_info.is_empty()
            && self.social_links.is_empty()
    }

    /// Names of the non-empty collection sections, in display order.
    pub fn available_sections(&self) -> Vec<&'static str> {
        let mut sections = Vec::new();
        if !self.links.is_empty() {
            sections.push("links");
        }
        if !self.lists.is_empty() {
            sections.push("lists");
        }
        if !self.tables.is_empty() {
            sections.push("tables");
        }
        if !self.contact_info.is_empty() {
            sections.push("contact_info");
        }
        if !self.social_links.is_empty() {
            sections.push("social_links");
        }
        sections
    }
}

/// Appends `value` unless an equal string is already present.
pub(crate) fn push_unique(values: &mut Vec<String>, value: String) {
    if !values.contains(&value) {
        values.push(value);
    }
}
