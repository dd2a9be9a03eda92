//! Rule-driven extraction over parsed documents.
//!
//! Submodules implement the individual extraction algorithms; this module
//! holds the scope-resolution helper and shared structural selectors they
//! build on.

mod field;
mod generic;
mod listing;
mod name;
mod paired;
mod sections;

pub use field::{element_text, extract_field, read_node};
pub use generic::{extract_rule, extract_rules};
pub use listing::extract_products;
pub use name::{normalize_name, should_replace_name};
pub use paired::extract_paired;
pub use sections::extract_grouped_sections;

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

pub(crate) static LIST_ITEMS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("li").expect("static selector"));
pub(crate) static TABLE_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("static selector"));
pub(crate) static TABLE_CELLS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("static selector"));

/// Container scopes for a rule: the selector's matches in document order,
/// or the document root when the rule has no selector.
pub(crate) fn scopes<'a>(html: &'a Html, selector: Option<&Selector>) -> Vec<ElementRef<'a>> {
    match selector {
        Some(selector) => html.select(selector).collect(),
        None => vec![html.root_element()],
    }
}

/// Cell texts of a table row joined with single spaces.
pub(crate) fn row_text(row: ElementRef<'_>) -> String {
    row.select(&TABLE_CELLS)
        .map(|cell| element_text(&cell))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
