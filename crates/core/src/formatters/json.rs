use crate::Result;
use crate::record::ContentRecord;
use serde::Serialize;

/// Configuration for JSON output
#[derive(Debug, Clone)]
pub struct JsonConfig {
    /// Pretty print JSON output
    pub pretty: bool,
}

impl Default for JsonConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

/// Envelope used when a fetch summary accompanies the record.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonOutput<'a> {
    pub source: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempts: Option<u32>,
    pub record: &'a ContentRecord,
}

fn to_string<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    if pretty { Ok(serde_json::to_string_pretty(value)?) } else { Ok(serde_json::to_string(value)?) }
}

/// Serialize a record with the camelCase field names of the content contract.
pub fn record_to_json(record: &ContentRecord, config: &JsonConfig) -> Result<String> {
    to_string(record, config.pretty)
}

/// Serialize several records as one JSON array.
pub fn records_to_json(records: &[ContentRecord], config: &JsonConfig) -> Result<String> {
    to_string(&records, config.pretty)
}

/// JSON formatter with configurable options
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, record: &ContentRecord) -> Result<String> {
        record_to_json(record, &self.config)
    }

    /// Record wrapped with where it came from and how many requests it took.
    pub fn convert_with_source(&self, record: &ContentRecord, source: &str, attempts: Option<u32>) -> Result<String> {
        to_string(&JsonOutput { source, attempts, record }, self.config.pretty)
    }
}
