//! Output document model.
//!
//! One scrape run produces a single [`Document`]: the configured pages in
//! order, plus every product discovered on listing pages. Records are
//! insertion-ordered JSON objects so field order follows the rule list.

use serde::Serialize;
use serde_json::{Map, Value};

/// One extracted record: an ordered mapping of field keys to values.
///
/// Values are strings, lists of strings, or lists of structured objects,
/// depending on the rule that produced them.
pub type Record = Map<String, Value>;

/// Result of scraping a single configured page.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub url: String,
    pub page_title: String,
    /// Products found on a listing page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Record>>,
    /// Extraction-rule output for a non-listing page, keyed by rule.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specifications: Option<Record>,
    /// Resolved image references for a non-listing page, keyed by source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Record>,
}

/// The final persisted artifact for one run.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub brand: String,
    pub pages: Vec<Page>,
    /// All listing-derived products, in discovery order. Omitted when the
    /// run produced none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub products: Option<Vec<Record>>,
}

/// Read a non-empty string field from a record.
pub fn str_field<'a>(record: &'a Record, key: &str) -> Option<&'a str> {
    match record.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
        _ => None,
    }
}

/// Whether a field is missing or carries no usable value.
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}
