//! Sequential scrape pipeline.
//!
//! Pages are processed in configuration order; listing pages yield product
//! records which are then enriched from their detail pages. Page fetch
//! failures are logged and skipped so one dead URL never aborts a run.
//! Parsed documents are `!Send`, so all DOM work happens in blocks that
//! finish before the next await point.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{info, warn};

use crate::extract::{
    element_text, extract_field, extract_grouped_sections, extract_paired, extract_products,
    extract_rule, extract_rules, should_replace_name,
};
use crate::fetch::Fetcher;
use crate::images::{plan_blocks, plan_sources, resolve_blocks, resolve_sources, SourcesPlan};
use crate::models::{str_field, Document, Page, Record};
use crate::rules::{DetailRule, DetailRules, PageRules, ScrapeRules};
use crate::utils::url_fallback_title;

static FIRST_H1: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("h1").expect("static selector"));
static TITLE_TAG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("static selector"));

/// Drives one scrape run over compiled rules.
pub struct Scraper<'a, F: Fetcher + ?Sized> {
    rules: &'a ScrapeRules,
    fetcher: &'a F,
}

/// DOM-derived results for one detail page, computed before any download.
struct DetailOutcome {
    replacement_name: Option<String>,
    extracted: Vec<(String, Value)>,
    image_plan: Option<SourcesPlan>,
}

impl<'a, F: Fetcher + ?Sized> Scraper<'a, F> {
    pub fn new(rules: &'a ScrapeRules, fetcher: &'a F) -> Self {
        Self { rules, fetcher }
    }

    /// Scrape every configured page and return the assembled document.
    pub async fn run(&self) -> Document {
        let mut pages = Vec::new();
        let mut all_products: Vec<Record> = Vec::new();

        for page_rules in &self.rules.pages {
            info!("scraping {}", page_rules.url);
            let body = match self.fetcher.fetch_text(&page_rules.url).await {
                Ok(body) => body,
                Err(err) => {
                    warn!("skipping {}: {}", page_rules.url, err);
                    continue;
                }
            };

            let page = if page_rules.is_listing() {
                let mut page = self.listing_page(page_rules, &body);
                if let Some(products) = &mut page.products {
                    self.enrich_products(products).await;
                    all_products.extend(products.iter().cloned());
                }
                page
            } else {
                self.plain_page(page_rules, &body).await
            };
            pages.push(page);
        }

        Document {
            brand: self.rules.brand.clone(),
            pages,
            products: (!all_products.is_empty()).then_some(all_products),
        }
    }

    fn listing_page(&self, rules: &PageRules, body: &str) -> Page {
        let html = Html::parse_document(body);
        let page_title = page_title(&html, rules);
        let products = match &rules.listing {
            Some(listing) => extract_products(&html, listing, &rules.url),
            None => Vec::new(),
        };
        info!("{} products on {}", products.len(), rules.url);

        Page {
            url: rules.url.clone(),
            page_title,
            products: Some(products),
            specifications: None,
            images: None,
        }
    }

    async fn plain_page(&self, rules: &PageRules, body: &str) -> Page {
        let (page_title, specifications, image_plan) = {
            let html = Html::parse_document(body);
            let page_title = page_title(&html, rules);
            let specifications = extract_rules(&html, &self.rules.page_extract);
            let image_plan = self
                .rules
                .images
                .as_ref()
                .map(|images| plan_blocks(&html, &images.blocks, &rules.url));
            (page_title, specifications, image_plan)
        };

        let images = match image_plan {
            Some(plan) => {
                resolve_blocks(
                    plan,
                    &self.rules.brand,
                    &rules.url,
                    &self.rules.image_dir,
                    self.fetcher,
                )
                .await
            }
            None => Record::new(),
        };

        Page {
            url: rules.url.clone(),
            page_title,
            products: None,
            specifications: Some(specifications),
            images: Some(images),
        }
    }

    /// Visit each product's detail page and fold its output into the record.
    async fn enrich_products(&self, products: &mut [Record]) {
        let Some(detail) = &self.rules.detail else {
            return;
        };
        let sources_rules = self
            .rules
            .images
            .as_ref()
            .and_then(|images| images.sources.as_ref());

        for product in products.iter_mut() {
            let Some(url) = str_field(product, "detail_url").map(str::to_string) else {
                continue;
            };

            info!("detail page {}", url);
            let body = match self.fetcher.fetch_text(&url).await {
                Ok(body) => body,
                Err(err) => {
                    warn!("skipping detail {}: {}", url, err);
                    continue;
                }
            };

            let outcome = {
                let html = Html::parse_document(&body);

                let candidate = detail_product_name(&html, detail, &url);
                let current = str_field(product, "product_name");
                let replacement_name = should_replace_name(current, candidate.as_deref())
                    .then(|| candidate.clone())
                    .flatten();
                let effective_name = replacement_name
                    .as_deref()
                    .or(current)
                    .map(str::to_string);

                let extracted = detail
                    .extract
                    .iter()
                    .map(|rule| {
                        let value = match rule {
                            DetailRule::Generic(rule) => extract_rule(&html, rule),
                            DetailRule::GroupedSections(rule) => {
                                extract_grouped_sections(&html, rule, effective_name.as_deref())
                            }
                            DetailRule::PairedHeadings(rule) => extract_paired(&html, rule),
                        };
                        (rule.key().to_string(), value)
                    })
                    .collect();

                let image_plan =
                    sources_rules.map(|sources| plan_sources(&html, sources, &url));

                DetailOutcome {
                    replacement_name,
                    extracted,
                    image_plan,
                }
            };

            if let Some(name) = outcome.replacement_name {
                product.insert("product_name".to_string(), Value::String(name));
            }
            for (key, value) in outcome.extracted {
                product.insert(key, value);
            }

            if let (Some(plan), Some(sources)) = (outcome.image_plan, sources_rules) {
                let images = resolve_sources(
                    plan,
                    sources,
                    &self.rules.brand,
                    str_field(product, "product_name"),
                    &self.rules.image_dir,
                    self.fetcher,
                )
                .await;
                if !images.is_empty() {
                    product.insert("images".to_string(), Value::Object(images));
                }
            }
        }
    }
}

/// First non-empty product-name candidate from the detail rules, falling
/// back to the page's first `h1`.
fn detail_product_name(html: &Html, detail: &DetailRules, base_url: &str) -> Option<String> {
    let root = html.root_element();
    for rule in &detail.product_name {
        let value = extract_field(root, rule, base_url);
        let candidate = match &value {
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => items.first().and_then(Value::as_str).map(str::to_string),
            _ => None,
        };
        if let Some(candidate) = candidate.filter(|c| !c.is_empty()) {
            return Some(candidate);
        }
    }

    html.select(&FIRST_H1)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}

/// Page title: configured selector, then `h1`, then `<title>`, then a
/// fallback derived from the URL.
fn page_title(html: &Html, rules: &PageRules) -> String {
    let from_selector = rules
        .title_selector
        .as_ref()
        .and_then(|selector| html.select(selector).next())
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty());
    if let Some(title) = from_selector {
        return title;
    }

    for selector in [&*FIRST_H1, &*TITLE_TAG] {
        let found = html
            .select(selector)
            .next()
            .map(|el| element_text(&el))
            .filter(|text| !text.is_empty());
        if let Some(title) = found {
            return title;
        }
    }

    warn!("no title found for {}, deriving one from the URL", rules.url);
    url_fallback_title(&rules.url)
}
