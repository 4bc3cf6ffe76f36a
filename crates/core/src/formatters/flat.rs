//! Flat key → scalar rows for tabular export.
//!
//! Flattening rules:
//! - nested maps join their key path with `_` (`contactInfo_emails`)
//! - sequences of scalars become one cell, items joined with `", "`
//! - sequences of maps or sequences expand per element with an `_<index>`
//!   suffix (`links_0_url`, `tables_0_rows_1`)
//! - an empty map contributes no keys, an empty sequence an empty cell
//!
//! CSV is written by hand following RFC 4180, as the crate has no other use
//! for a CSV dependency.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use crate::Result;
use crate::record::ContentRecord;

/// One flattened record: column name to cell text.
pub type FlatRow = BTreeMap<String, String>;

/// Flattens a record into export columns.
///
/// # Example
///
/// ```rust
/// use gleaner_core::{ContentRecord, flatten};
///
/// let record = ContentRecord { title: "Acme".into(), ..Default::default() };
/// let row = flatten(&record).unwrap();
/// assert_eq!(row["title"], "Acme");
/// assert_eq!(row["contactInfo_emails"], "");
/// ```
pub fn flatten(record: &ContentRecord) -> Result<FlatRow> {
    let value = serde_json::to_value(record)?;
    Ok(flatten_value(&value))
}

/// Flattens any JSON object; non-object roots land under the empty key.
pub fn flatten_value(value: &Value) -> FlatRow {
    let mut row = FlatRow::new();
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                flatten_into(&mut row, key, child);
            }
        }
        other => flatten_into(&mut row, "", other),
    }
    row
}

fn flatten_into(row: &mut FlatRow, key: &str, value: &Value) {
    match value {
        Value::Object(map) => {
            for (child_key, child) in map {
                flatten_into(row, &join_key(key, child_key), child);
            }
        }
        Value::Array(items) if items.iter().any(|item| item.is_object() || item.is_array()) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(row, &join_key(key, &index.to_string()), item);
            }
        }
        Value::Array(items) => {
            let cells: Vec<String> = items.iter().map(scalar_text).collect();
            row.insert(key.to_string(), cells.join(", "));
        }
        scalar => {
            row.insert(key.to_string(), scalar_text(scalar));
        }
    }
}

fn join_key(parent: &str, key: &str) -> String {
    if parent.is_empty() { key.to_string() } else { format!("{parent}_{key}") }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Renders records as CSV: a header with the sorted union of every record's
/// columns, then one line per record. Missing cells are empty.
pub fn to_csv(records: &[ContentRecord]) -> Result<String> {
    let rows = records.iter().map(flatten).collect::<Result<Vec<_>>>()?;
    Ok(rows_to_csv(&rows))
}

/// CSV rendering of already flattened rows.
pub fn rows_to_csv(rows: &[FlatRow]) -> String {
    let columns: BTreeSet<&str> = rows.iter().flat_map(|row| row.keys().map(String::as_str)).collect();

    let mut output = String::new();
    write_line(&mut output, columns.iter().copied());

    for row in rows {
        write_line(&mut output, columns.iter().map(|column| row.get(*column).map(String::as_str).unwrap_or("")));
    }

    output
}

fn write_line<'a>(output: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            output.push(',');
        }
        output.push_str(&escape_field(cell));
    }
    output.push_str("\r\n");
}

fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ContactInfo, Link, Lists, Table};
    use serde_json::json;

    #[test]
    fn test_flatten_nested_maps() {
        let row = flatten_value(&json!({"a": {"b": {"c": 1}}, "d": true}));
        assert_eq!(row["a_b_c"], "1");
        assert_eq!(row["d"], "true");
    }

    #[test]
    fn test_flatten_scalar_sequence_joined() {
        let row = flatten_value(&json!({"tags": ["x", "y", "z"], "none": []}));
        assert_eq!(row["tags"], "x, y, z");
        assert_eq!(row["none"], "");
    }

    #[test]
    fn test_flatten_structure_sequence_indexed() {
        let row = flatten_value(&json!({"links": [{"url": "u0"}, {"url": "u1"}]}));
        assert_eq!(row["links_0_url"], "u0");
        assert_eq!(row["links_1_url"], "u1");
        assert!(!row.contains_key("links"));
    }

    #[test]
    fn test_flatten_empty_map_has_no_keys() {
        let row = flatten_value(&json!({"headings": {}, "title": ""}));
        assert_eq!(row.len(), 1);
        assert_eq!(row["title"], "");
    }

    #[test]
    fn test_flatten_record() {
        let record = ContentRecord {
            title: "Acme".to_string(),
            headings: BTreeMap::from([(2, vec!["About".to_string(), "Team".to_string()])]),
            links: vec![Link::new("https://x.com/a", "A")],
            lists: Lists { ordered: vec![vec!["one".to_string(), "two".to_string()]], unordered: vec![] },
            tables: vec![Table {
                headers: vec!["Name".to_string(), "Role".to_string()],
                rows: vec![vec!["Ann".to_string(), "CEO".to_string()]],
            }],
            contact_info: ContactInfo { emails: vec!["a@b.com".to_string(), "c@d.org".to_string()], ..Default::default() },
            ..Default::default()
        };

        let row = flatten(&record).unwrap();
        assert_eq!(row["title"], "Acme");
        assert_eq!(row["headings_2"], "About, Team");
        assert_eq!(row["links_0_url"], "https://x.com/a");
        assert_eq!(row["links_0_anchorText"], "A");
        assert_eq!(row["lists_ordered_0"], "one, two");
        assert_eq!(row["lists_unordered"], "");
        assert_eq!(row["tables_0_headers"], "Name, Role");
        assert_eq!(row["tables_0_rows_0"], "Ann, CEO");
        assert_eq!(row["contactInfo_emails"], "a@b.com, c@d.org");
        assert_eq!(row["contactInfo_addresses"], "");
        assert_eq!(row["socialLinks"], "");
    }

    #[test]
    fn test_csv_union_of_columns() {
        let first = flatten_value(&json!({"title": "A", "links": [{"url": "u"}]}));
        let second = flatten_value(&json!({"title": "B", "extra": "e"}));

        let csv = rows_to_csv(&[first, second]);
        assert_eq!(csv, "extra,links_0_url,title\r\n,u,A\r\ne,,B\r\n");
    }

    #[test]
    fn test_csv_quoting() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a, b"), "\"a, b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_to_csv_records() {
        let records = vec![
            ContentRecord { title: "One".to_string(), ..Default::default() },
            ContentRecord { title: "Two, too".to_string(), ..Default::default() },
        ];

        let csv = to_csv(&records).unwrap();
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert!(lines[0].split(',').any(|c| c == "title"));
        assert!(lines[2].contains("\"Two, too\""));
        assert_eq!(lines.len(), 4);
    }
}
