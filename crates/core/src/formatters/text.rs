use crate::record::ContentRecord;

/// Default character budget of [`text_digest`].
pub const DEFAULT_DIGEST_BUDGET: usize = 15_000;

/// Configuration for the human-readable report
#[derive(Debug, Clone)]
pub struct TextConfig {
    /// Number of paragraphs shown (default: 10)
    pub max_paragraphs: usize,

    /// Paragraphs longer than this many characters are cut and end in "..." (default: 200)
    pub paragraph_preview: usize,

    /// Wrap lines at specified width (0 = no wrapping)
    pub line_width: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { max_paragraphs: 10, paragraph_preview: 200, line_width: 0 }
    }
}

/// Report formatter for records
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, record: &ContentRecord) -> String {
        record_to_text(record, &self.config)
    }
}

/// Render a record as a plain-text report: header, headings by level, the
/// leading paragraphs, and the names of the remaining non-empty sections.
pub fn record_to_text(record: &ContentRecord, config: &TextConfig) -> String {
    let mut output = generate_header(record);

    if !record.headings.is_empty() {
        output.push_str("\nHeadings:\n");
        for (level, texts) in &record.headings {
            for text in texts {
                output.push_str(&format!("  h{level}: {text}\n"));
            }
        }
    }

    if !record.paragraphs.is_empty() {
        output.push_str("\nMain content:\n");
        for paragraph in record.paragraphs.iter().take(config.max_paragraphs) {
            let preview = preview(paragraph, config.paragraph_preview);
            let text = if config.line_width > 0 { wrap_text(&preview, config.line_width) } else { preview };
            output.push('\n');
            output.push_str(&text);
            output.push('\n');
        }
    }

    let sections = record.available_sections();
    if !sections.is_empty() {
        output.push_str(&format!("\nAvailable sections: {}\n", sections.join(", ")));
    }

    output.trim().to_string()
}

/// Title underlined with "=", then the description.
fn generate_header(record: &ContentRecord) -> String {
    let mut header = String::new();

    if !record.title.is_empty() {
        header.push_str(&record.title);
        header.push('\n');
        header.push_str(&"=".repeat(record.title.chars().count()));
        header.push('\n');
    }

    if !record.meta_description.is_empty() {
        header.push_str(&record.meta_description);
        header.push('\n');
    }

    header
}

fn preview(text: &str, limit: usize) -> String {
    if text.chars().count() > limit {
        let cut: String = text.chars().take(limit).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Plain-text context for a question-answering collaborator.
///
/// Paragraphs joined by a space, then every ordered and then every
/// unordered list as a space followed by its items joined by spaces.
/// The result is cut to `budget` characters.
///
/// # Example
///
/// ```rust
/// use gleaner_core::{ContentRecord, Lists, text_digest};
///
/// let record = ContentRecord {
///     paragraphs: vec!["First paragraph.".into(), "Second one.".into()],
///     lists: Lists { ordered: vec![], unordered: vec![vec!["a".into(), "b".into()]] },
///     ..Default::default()
/// };
/// assert_eq!(text_digest(&record, 100), "First paragraph. Second one. a b");
/// ```
pub fn text_digest(record: &ContentRecord, budget: usize) -> String {
    let mut digest = record.paragraphs.join(" ");

    for list in record.lists.ordered.iter().chain(&record.lists.unordered) {
        digest.push(' ');
        digest.push_str(&list.join(" "));
    }

    match digest.char_indices().nth(budget) {
        Some((cut, _)) => digest[..cut].to_string(),
        None => digest,
    }
}

/// Wrap text to specified line width
fn wrap_text(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    let mut lines = Vec::new();
    let mut current_line = Vec::new();
    let mut current_length = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_length == 0 {
            current_line.push(word);
            current_length = word_len;
        } else if current_length + 1 + word_len <= width {
            current_length += 1 + word_len;
            current_line.push(word);
        } else {
            lines.push(current_line.join(" "));
            current_line = vec![word];
            current_length = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line.join(" "));
    }

    lines.join("\n")
}
