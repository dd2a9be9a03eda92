//! Positionally paired heading/paragraph extraction.

use scraper::Html;
use serde_json::{Map, Value};

use super::field::element_text;
use super::scopes;
use crate::rules::PairedRule;

/// Pair title and text sequences by index within each container.
///
/// The sequences are resolved independently; the shorter side is padded
/// with empty strings up to the longer length. A pair is emitted only when
/// at least one side is non-empty.
pub fn extract_paired(html: &Html, rule: &PairedRule) -> Value {
    let mut pairs = Vec::new();

    for container in scopes(html, rule.container.as_ref()) {
        let titles: Vec<String> = match &rule.title {
            Some(selector) => container
                .select(selector)
                .map(|el| element_text(&el))
                .collect(),
            None => Vec::new(),
        };
        let texts: Vec<String> = match &rule.text {
            Some(selector) => container
                .select(selector)
                .map(|el| element_text(&el))
                .collect(),
            None => Vec::new(),
        };

        for i in 0..titles.len().max(texts.len()) {
            let title = titles.get(i).map(String::as_str).unwrap_or("");
            let text = texts.get(i).map(String::as_str).unwrap_or("");
            if title.is_empty() && text.is_empty() {
                continue;
            }
            let mut pair = Map::new();
            pair.insert("title".to_string(), Value::String(title.to_string()));
            pair.insert("text".to_string(), Value::String(text.to_string()));
            pairs.push(Value::Object(pair));
        }
    }

    Value::Array(pairs)
}
