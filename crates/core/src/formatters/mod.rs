pub mod flat;
pub mod json;
pub mod text;

pub use flat::{FlatRow, flatten, flatten_value, rows_to_csv, to_csv};
pub use json::{JsonConfig, JsonFormatter, record_to_json, records_to_json};
pub use text::{DEFAULT_DIGEST_BUDGET, TextConfig, TextFormatter, record_to_text, text_digest};
