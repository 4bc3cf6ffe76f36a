//! Contact and social facets.
//!
//! Emails and phone numbers are matched against the serialized document,
//! attributes included, so `mailto:` and `tel:` hrefs are picked up along
//! with visible text. Social links come from anchor hrefs only.

use std::sync::LazyLock;

use regex::Regex;

use crate::parse::Document;
use crate::record::{ContactInfo, push_unique};
use crate::Result;

static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w.+-]+@[\w.-]+\.[A-Za-z]{2,}").expect("valid email regex"));

static PHONE_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\+?[\d\s-]{10,}").expect("valid phone regex"));

/// Minimum number of digits a phone candidate must carry.
pub const MIN_PHONE_DIGITS: usize = 10;

/// Hosts recognised as social profiles.
pub const DEFAULT_SOCIAL_HOSTS: [&str; 7] = [
    "facebook.com",
    "twitter.com",
    "linkedin.com",
    "instagram.com",
    "youtube.com",
    "github.com",
    "pinterest.com",
];

/// Unique email addresses in first-seen order.
pub fn extract_emails(serialized: &str) -> Vec<String> {
    let mut emails = Vec::new();
    for m in EMAIL_PATTERN.find_iter(serialized) {
        push_unique(&mut emails, m.as_str().to_string());
    }
    emails
}

/// Unique, trimmed phone-like runs carrying at least [`MIN_PHONE_DIGITS`] digits.
///
/// The pattern is deliberately loose (digits, spaces, hyphens, optional
/// leading `+`); the digit count is what filters out whitespace runs.
pub fn extract_phones(serialized: &str) -> Vec<String> {
    let mut phones = Vec::new();
    for m in PHONE_PATTERN.find_iter(serialized) {
        let digits = m.as_str().chars().filter(char::is_ascii_digit).count();
        if digits >= MIN_PHONE_DIGITS {
            push_unique(&mut phones, m.as_str().trim().to_string());
        }
    }
    phones
}

/// Emails and phones; addresses are never populated.
pub fn extract_contact_info(serialized: &str) -> ContactInfo {
    ContactInfo { emails: extract_emails(serialized), phones: extract_phones(serialized), addresses: Vec::new() }
}

/// Lower-cased anchor hrefs that mention one of `hosts`, unique, first-seen order.
pub fn extract_social_links(doc: &Document, hosts: &[String]) -> Result<Vec<String>> {
    let mut links = Vec::new();
    for anchor in doc.select("a[href]")? {
        let Some(href) = anchor.attr("href") else {
            continue;
        };

        let href = href.to_lowercase();
        if hosts.iter().any(|host| href.contains(host.as_str())) {
            push_unique(&mut links, href);
        }
    }
    Ok(links)
}
