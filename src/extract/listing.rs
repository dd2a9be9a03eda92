//! Product extraction from listing pages.

use scraper::Html;
use serde_json::Value;

use super::field::extract_field;
use crate::models::{is_blank, str_field, Record};
use crate::rules::ListingRules;
use crate::utils::resolve_url;

/// Build one product record per container matched on a listing page.
///
/// Field keys follow the rule list order. `product_name` is backfilled from
/// a legacy `name` field when empty, and a non-empty `detail_url` is
/// resolved against the page URL.
pub fn extract_products(html: &Html, rules: &ListingRules, base_url: &str) -> Vec<Record> {
    let mut products = Vec::new();

    for container in html.select(&rules.container) {
        let mut record = Record::new();
        for field in &rules.fields {
            record.insert(field.key.clone(), extract_field(container, field, base_url));
        }

        if is_blank(record.get("product_name")) {
            if let Some(name) = str_field(&record, "name").map(str::to_string) {
                record.insert("product_name".to_string(), Value::String(name));
            }
        }

        if let Some(detail_url) = str_field(&record, "detail_url").map(str::to_string) {
            record.insert(
                "detail_url".to_string(),
                Value::String(resolve_url(base_url, &detail_url)),
            );
        }

        products.push(record);
    }

    products
}
