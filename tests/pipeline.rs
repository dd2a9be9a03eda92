//! End-to-end pipeline tests over an in-memory fetcher.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;

use brandscrape::config::SiteConfig;
use brandscrape::fetch::{FetchError, Fetcher};
use brandscrape::models::Document;
use brandscrape::rules::ScrapeRules;
use brandscrape::scrape::Scraper;
use brandscrape::storage::save_document;

/// Serves pages from a map and writes fixed bytes for downloads. Unknown
/// URLs fail the way a 404 would.
struct MapFetcher {
    pages: HashMap<String, String>,
}

impl MapFetcher {
    fn new(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, body)| (url.to_string(), body.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl Fetcher for MapFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
        if !self.pages.contains_key(url) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            });
        }
        std::fs::write(dest, b"image-bytes").map_err(|source| FetchError::Write {
            path: dest.to_path_buf(),
            source,
        })
    }
}

fn compile(config_json: &str) -> ScrapeRules {
    let config: SiteConfig = serde_json::from_str(config_json).unwrap();
    ScrapeRules::compile(&config).unwrap()
}

const LISTING: &str = r#"
    <html><head><title>Acme catalogue</title></head><body>
    <h1>Payment terminals</h1>
    <div class="card"><h3>Model A</h3><a href="/p/a">details</a></div>
    <div class="card"><h3>A sleek and reliable payment terminal built for every retail counter in the world.</h3>
        <a href="/p/b">details</a></div>
    </body></html>
"#;

const DETAIL_A: &str = r#"
    <html><body>
    <h1 class="product">Model A</h1>
    <div class="section"><h2>Features</h2><ul><li>Fast</li><li>Light</li></ul></div>
    <div class="section"><h2>Related products</h2><ul><li>Model B</li></ul></div>
    <div class="gallery"><img src="/img/a1.jpg"><img src="/img/a2.png"></div>
    </body></html>
"#;

const DETAIL_B: &str = r#"
    <html><body>
    <h1 class="product">Model B</h1>
    <div class="section"><h2>Model B</h2></div>
    <div class="gallery"><img src="/img/b1.jpg"><img src="/img/missing.jpg"></div>
    </body></html>
"#;

fn catalogue_config(data_dir: &Path, image_dir: &Path) -> String {
    format!(
        r#"{{
            "brand": "Acme Devices",
            "output": {{"data_dir": {data_dir:?}, "image_dir": {image_dir:?}}},
            "links": [
                {{
                    "url": "https://acme.example/catalogue",
                    "page_title_selector": "h1",
                    "selectors": {{
                        "product_container": ".card",
                        "fields": [
                            {{"key": "product_name", "selector": "h3"}},
                            {{"key": "detail_url", "selector": "a", "mode": "attr", "attr": "href"}}
                        ]
                    }}
                }}
            ],
            "detail": {{
                "selectors": {{
                    "product_name": [{{"key": "product_name", "selector": "h1.product"}}]
                }},
                "extract": [
                    {{
                        "key": "sections",
                        "mode": "grouped_sections",
                        "section_container_selector": ".section",
                        "section_title_selector": "h2",
                        "section_content_rules": [{{"mode": "list", "selector": "li"}}],
                        "ignore_if_title_matches": ["(?i)related"],
                        "skip_sections_where_only_title_is_product_name": true
                    }}
                ]
            }},
            "images": {{
                "sources": [{{"key": "gallery", "container_selector": ".gallery"}}],
                "download": true
            }}
        }}"#
    )
}

async fn run_catalogue(dir: &Path) -> (Document, ScrapeRules) {
    let rules = compile(&catalogue_config(&dir.join("data"), &dir.join("images")));
    let fetcher = MapFetcher::new(&[
        ("https://acme.example/catalogue", LISTING),
        ("https://acme.example/p/a", DETAIL_A),
        ("https://acme.example/p/b", DETAIL_B),
        ("https://acme.example/img/a1.jpg", ""),
        ("https://acme.example/img/a2.png", ""),
        ("https://acme.example/img/b1.jpg", ""),
    ]);
    let document = Scraper::new(&rules, &fetcher).run().await;
    (document, rules)
}

#[tokio::test]
async fn test_listing_products_are_extracted_and_enriched() {
    let dir = tempfile::tempdir().unwrap();
    let (document, _) = run_catalogue(dir.path()).await;

    assert_eq!(document.brand, "Acme Devices");
    assert_eq!(document.pages.len(), 1);
    assert_eq!(document.pages[0].page_title, "Payment terminals");

    let products = document.products.as_ref().unwrap();
    assert_eq!(products.len(), 2);
    // Listing products and the document-level list are the same records.
    assert_eq!(document.pages[0].products.as_ref().unwrap(), products);

    // Detail URLs resolved against the listing page.
    assert_eq!(
        products[0]["detail_url"].as_str().unwrap(),
        "https://acme.example/p/a"
    );

    // The long listing caption loses to the detail page's title.
    assert_eq!(products[0]["product_name"], "Model A");
    assert_eq!(products[1]["product_name"], "Model B");
}

#[tokio::test]
async fn test_detail_sections_honor_skip_rules() {
    let dir = tempfile::tempdir().unwrap();
    let (document, _) = run_catalogue(dir.path()).await;
    let products = document.products.unwrap();

    // "Related products" is ignored by pattern; only "Features" remains.
    let sections_a = products[0]["sections"].as_array().unwrap();
    assert_eq!(sections_a.len(), 1);
    assert_eq!(sections_a[0]["title"], "Features");
    assert_eq!(
        sections_a[0]["items"],
        serde_json::json!(["Fast", "Light"])
    );

    // Model B's only section repeats the product name with no items.
    assert_eq!(products[1]["sections"], serde_json::json!([]));
}

#[tokio::test]
async fn test_detail_images_download_with_shared_index() {
    let dir = tempfile::tempdir().unwrap();
    let (document, _) = run_catalogue(dir.path()).await;
    let products = document.products.unwrap();

    let gallery_a: Vec<&str> = products[0]["images"]["gallery"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(gallery_a.len(), 2);
    assert!(gallery_a[0].ends_with("image_1.jpg"));
    assert!(gallery_a[1].ends_with("image_2.png"));

    // Folders derive from sanitized brand and product name.
    let product_dir = dir.path().join("images").join("acme_devices").join("model_a");
    assert!(product_dir.join("image_1.jpg").is_file());

    // The unresolvable reference is dropped; the index does not advance
    // past it.
    let gallery_b: Vec<&str> = products[1]["images"]["gallery"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(gallery_b.len(), 1);
    assert!(gallery_b[0].ends_with("image_1.jpg"));
}

#[tokio::test]
async fn test_document_round_trips_through_storage() {
    let dir = tempfile::tempdir().unwrap();
    let (document, rules) = run_catalogue(dir.path()).await;

    let path = save_document(&rules.data_dir, &document).unwrap();
    assert_eq!(path.file_name().unwrap(), "acme_devices.json");

    let raw = std::fs::read_to_string(&path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(parsed["brand"], "Acme Devices");
    assert_eq!(parsed["products"].as_array().unwrap().len(), 2);
    // Field order follows the rule list.
    let first = parsed["pages"][0]["products"][0].as_object().unwrap();
    let keys: Vec<&String> = first.keys().collect();
    assert_eq!(keys[0], "product_name");
    assert_eq!(keys[1], "detail_url");
}

#[tokio::test]
async fn test_dead_page_is_skipped_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let config = format!(
        r#"{{
            "brand": "Acme",
            "output": {{"data_dir": {:?}, "image_dir": {:?}}},
            "links": [
                {{"url": "https://acme.example/gone", "type": "listing"}},
                {{"url": "https://acme.example/about"}}
            ],
            "extract": [
                {{
                    "key": "contact",
                    "container_selector": ".contact",
                    "children": [{{"key": "email", "selector": ".email"}}]
                }}
            ]
        }}"#,
        dir.path().join("data"),
        dir.path().join("images")
    );
    let rules = compile(&config);
    let fetcher = MapFetcher::new(&[(
        "https://acme.example/about",
        r#"<title>About</title><div class="contact"><span class="email">hi@acme.example</span></div>"#,
    )]);

    let document = Scraper::new(&rules, &fetcher).run().await;

    // The dead listing page is skipped entirely.
    assert_eq!(document.pages.len(), 1);
    assert!(document.products.is_none());

    let page = &document.pages[0];
    assert_eq!(page.page_title, "About");
    let specs = page.specifications.as_ref().unwrap();
    assert_eq!(
        specs["contact"],
        serde_json::json!([{"email": "hi@acme.example"}])
    );
    // No image configuration: an empty map, not an omitted key.
    assert!(page.images.as_ref().unwrap().is_empty());
}

#[tokio::test]
async fn test_non_listing_page_collects_image_urls_from_sources() {
    let dir = tempfile::tempdir().unwrap();
    let config = format!(
        r#"{{
            "brand": "Acme",
            "output": {{"data_dir": {:?}, "image_dir": {:?}}},
            "links": [{{"url": "https://acme.example/gallery"}}],
            "images": {{
                "sources": [{{"key": "gallery", "container_selector": ".gallery"}}],
                "download": true
            }}
        }}"#,
        dir.path().join("data"),
        dir.path().join("images")
    );
    let rules = compile(&config);
    let fetcher = MapFetcher::new(&[(
        "https://acme.example/gallery",
        r#"<title>Gallery</title><div class="gallery"><img src="/img/g1.jpg"></div>"#,
    )]);

    let document = Scraper::new(&rules, &fetcher).run().await;

    // On a plain page, structured sources only collect URLs; the shared
    // download policy applies to detail enrichment.
    let images = document.pages[0].images.as_ref().unwrap();
    assert_eq!(
        images["gallery"],
        serde_json::json!(["https://acme.example/img/g1.jpg"])
    );
    assert!(!dir.path().join("images").exists());
}
