//! Grouped title/content section extraction for detail pages.

use scraper::{ElementRef, Html};
use serde_json::{Map, Value};

use super::field::element_text;
use super::{row_text, scopes, TABLE_ROWS};
use crate::rules::{ContentMode, GroupedSectionRule};

/// Extract `{title, items}` sections.
///
/// Sections whose title matches an ignore pattern are skipped, as are
/// sections that merely repeat the product name with no content when the
/// rule's skip flag is set. A section is emitted only when its title or
/// items are non-empty.
pub fn extract_grouped_sections(
    html: &Html,
    rule: &GroupedSectionRule,
    product_name: Option<&str>,
) -> Value {
    let mut sections = Vec::new();

    for container in scopes(html, rule.container.as_ref()) {
        let section_scopes: Vec<ElementRef> = match &rule.section_container {
            Some(selector) => container.select(selector).collect(),
            None => vec![container],
        };

        for section in section_scopes {
            let title = rule
                .title
                .as_ref()
                .and_then(|selector| section.select(selector).next())
                .map(|el| element_text(&el));

            if title.as_deref().is_some_and(|t| {
                !t.is_empty() && rule.ignore_title_patterns.iter().any(|p| p.is_match(t))
            }) {
                continue;
            }

            let mut items: Vec<String> = Vec::new();
            for content in &rule.content_rules {
                match content.mode {
                    ContentMode::List | ContentMode::Text => {
                        for el in section.select(&content.selector) {
                            let text = element_text(&el);
                            if !text.is_empty() {
                                items.push(text);
                            }
                        }
                    }
                    ContentMode::Table => {
                        for table in section.select(&content.selector) {
                            let rows: Vec<ElementRef> = table.select(&TABLE_ROWS).collect();
                            if rows.is_empty() {
                                let text = element_text(&table);
                                if !text.is_empty() {
                                    items.push(text);
                                }
                            } else {
                                for row in rows {
                                    let text = row_text(row);
                                    if !text.is_empty() {
                                        items.push(text);
                                    }
                                }
                            }
                        }
                    }
                }
            }

            // A titled but otherwise empty section that just repeats the
            // product name is vacuous.
            if rule.skip_if_only_title_matches_product_name
                && items.is_empty()
                && matches!(
                    (title.as_deref(), product_name),
                    (Some(t), Some(name))
                        if !t.is_empty() && !name.is_empty() && t.trim() == name.trim()
                )
            {
                continue;
            }

            let has_title = title.as_deref().is_some_and(|t| !t.is_empty());
            if has_title || !items.is_empty() {
                let mut out = Map::new();
                out.insert(
                    "title".to_string(),
                    title.clone().map(Value::String).unwrap_or(Value::Null),
                );
                out.insert(
                    "items".to_string(),
                    Value::Array(items.into_iter().map(Value::String).collect()),
                );
                sections.push(Value::Object(out));
            }
        }
    }

    Value::Array(sections)
}
