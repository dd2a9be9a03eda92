//! Selector application and scalar field extraction.

use scraper::ElementRef;
use serde_json::Value;

use crate::rules::{FieldRule, ReadMode};
use crate::utils::resolve_url;

/// Whitespace-normalized inner text of a node: internal runs collapsed to
/// single spaces, trimmed at both ends.
pub fn element_text(el: &ElementRef) -> String {
    let mut out = String::new();
    for piece in el.text() {
        for word in piece.split_whitespace() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(word);
        }
    }
    out
}

/// Read a node according to a field's read mode.
///
/// Attribute reads yield `None` when the attribute is absent; text reads
/// always yield a (possibly empty) string.
pub fn read_node(node: &ElementRef, mode: &ReadMode, base_url: &str) -> Option<String> {
    match mode {
        ReadMode::Text => Some(element_text(node)),
        ReadMode::Attr {
            name,
            normalize_url,
        } => {
            let value = node.value().attr(name)?;
            if *normalize_url && !value.is_empty() {
                Some(resolve_url(base_url, value))
            } else {
                Some(value.to_string())
            }
        }
    }
}

/// Apply one field rule within a scope.
///
/// `multiple` rules yield the non-empty reads of every match in document
/// order (no dedup); single rules yield the first match's read, or null
/// without a match. A rule without a selector is a no-op.
pub fn extract_field(scope: ElementRef<'_>, rule: &FieldRule, base_url: &str) -> Value {
    let Some(selector) = &rule.selector else {
        return if rule.multiple {
            Value::Array(Vec::new())
        } else {
            Value::Null
        };
    };

    if rule.multiple {
        let values = scope
            .select(selector)
            .filter_map(|node| read_node(&node, &rule.mode, base_url))
            .filter(|value| !value.is_empty())
            .map(Value::String)
            .collect();
        return Value::Array(values);
    }

    match scope.select(selector).next() {
        Some(node) => read_node(&node, &rule.mode, base_url)
            .map(Value::String)
            .unwrap_or(Value::Null),
        None => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;
    use serde_json::json;

    fn field(selector: Option<&str>, mode: ReadMode, multiple: bool) -> FieldRule {
        FieldRule {
            key: "field".to_string(),
            selector: selector.map(|s| scraper::Selector::parse(s).unwrap()),
            mode,
            multiple,
        }
    }

    #[test]
    fn test_element_text_normalizes_whitespace() {
        let html = Html::parse_document("<p>  Model\n  <b>X</b>\t Pro </p>");
        let text = element_text(&html.root_element());
        assert_eq!(text, "Model X Pro");
    }

    #[test]
    fn test_single_no_match_is_null() {
        let html = Html::parse_document("<div><span>x</span></div>");
        let rule = field(Some(".missing"), ReadMode::Text, false);
        assert_eq!(extract_field(html.root_element(), &rule, ""), Value::Null);
    }

    #[test]
    fn test_multiple_no_match_is_empty_list() {
        let html = Html::parse_document("<div><span>x</span></div>");
        let rule = field(Some(".missing"), ReadMode::Text, true);
        assert_eq!(extract_field(html.root_element(), &rule, ""), json!([]));
    }

    #[test]
    fn test_no_selector_is_noop() {
        let html = Html::parse_document("<div>x</div>");
        assert_eq!(
            extract_field(html.root_element(), &field(None, ReadMode::Text, false), ""),
            Value::Null
        );
        assert_eq!(
            extract_field(html.root_element(), &field(None, ReadMode::Text, true), ""),
            json!([])
        );
    }

    #[test]
    fn test_multiple_drops_empty_reads() {
        let html =
            Html::parse_document("<ul><li>one</li><li>  </li><li>two</li><li>one</li></ul>");
        let rule = field(Some("li"), ReadMode::Text, true);
        // Order preserved, empties dropped, duplicates kept.
        assert_eq!(
            extract_field(html.root_element(), &rule, ""),
            json!(["one", "two", "one"])
        );
    }

    #[test]
    fn test_attr_read_with_normalize() {
        let html = Html::parse_document(r#"<a href="/p/1">link</a>"#);
        let rule = field(
            Some("a"),
            ReadMode::Attr {
                name: "href".to_string(),
                normalize_url: true,
            },
            false,
        );
        assert_eq!(
            extract_field(html.root_element(), &rule, "https://example.com/list"),
            json!("https://example.com/p/1")
        );
    }

    #[test]
    fn test_attr_missing_is_null() {
        let html = Html::parse_document("<a>link</a>");
        let rule = field(
            Some("a"),
            ReadMode::Attr {
                name: "href".to_string(),
                normalize_url: false,
            },
            false,
        );
        assert_eq!(extract_field(html.root_element(), &rule, ""), Value::Null);
    }
}
