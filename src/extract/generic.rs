//! Generic container/children extraction rules.
//!
//! Used for non-listing pages and for plain detail fields. Each rule
//! resolves its container scopes and either collects container text or
//! builds a child map per container.

use scraper::{ElementRef, Html};
use serde_json::{Map, Value};

use super::field::element_text;
use super::{scopes, row_text, LIST_ITEMS, TABLE_ROWS};
use crate::rules::{ChildMode, ChildRule, ExtractMode, ExtractRule};

/// Evaluate a list of rules against a document, keyed by rule key.
pub fn extract_rules(html: &Html, rules: &[ExtractRule]) -> Map<String, Value> {
    let mut out = Map::new();
    for rule in rules {
        out.insert(rule.key.clone(), extract_rule(html, rule));
    }
    out
}

/// Evaluate one rule: a list with one entry per container scope.
pub fn extract_rule(html: &Html, rule: &ExtractRule) -> Value {
    let mut collected = Vec::new();

    for container in scopes(html, rule.container.as_ref()) {
        match rule.mode {
            ExtractMode::Container => {
                let mut item = Map::new();
                for child in &rule.children {
                    item.insert(child.key.clone(), extract_child(container, child));
                }
                collected.push(Value::Object(item));
            }
            ExtractMode::Text => collected.push(Value::String(element_text(&container))),
        }
    }

    Value::Array(collected)
}

fn extract_child(container: ElementRef<'_>, child: &ChildRule) -> Value {
    let Some(selector) = &child.selector else {
        return Value::Null;
    };
    let Some(el) = container.select(selector).next() else {
        return Value::Null;
    };

    match child.mode {
        ChildMode::Text => Value::String(element_text(&el)),
        ChildMode::Recursive => Value::Array(
            recursive_values(el)
                .into_iter()
                .map(Value::String)
                .collect(),
        ),
    }
}

/// Ordered fallback strategies for `recursive` children: list items, then
/// table rows, then the element's own text. New strategies slot into this
/// list without touching the others.
const RECURSIVE_STRATEGIES: [fn(ElementRef<'_>) -> Vec<String>; 3] =
    [list_item_texts, table_row_texts, own_text];

fn recursive_values(el: ElementRef<'_>) -> Vec<String> {
    for strategy in RECURSIVE_STRATEGIES {
        let values = strategy(el);
        if !values.is_empty() {
            return values;
        }
    }
    Vec::new()
}

fn list_item_texts(el: ElementRef<'_>) -> Vec<String> {
    el.select(&LIST_ITEMS)
        .map(|item| element_text(&item))
        .filter(|text| !text.is_empty())
        .collect()
}

fn table_row_texts(el: ElementRef<'_>) -> Vec<String> {
    el.select(&TABLE_ROWS)
        .map(row_text)
        .filter(|text| !text.is_empty())
        .collect()
}

fn own_text(el: ElementRef<'_>) -> Vec<String> {
    let text = element_text(&el);
    if text.is_empty() {
        Vec::new()
    } else {
        vec![text]
    }
}
