//! Image reference resolution, filtering and download naming.
//!
//! Resolution is split into two phases: planning walks the parsed document
//! and yields plain data (so no DOM is held across downloads), execution
//! optionally downloads each planned reference. The structured `sources`
//! path and the legacy block path stay separate on purpose; they differ in
//! attribute fallbacks, folder strategy and naming.

use std::path::Path;

use scraper::{ElementRef, Html};
use serde_json::{Map, Value};
use tracing::warn;

use crate::extract::{element_text, scopes};
use crate::fetch::Fetcher;
use crate::rules::{ImageBlockRule, ImageRead, ImageSourcesRules};
use crate::storage::{display_path, ensure_dir};
use crate::utils::{resolve_url, safe_filename, url_extension};

/// Ordered attribute fallbacks after the configured attribute in sources
/// mode.
const SOURCE_ATTR_FALLBACKS: [&str; 2] = ["src", "data-src"];

/// Ordered attribute fallbacks in legacy block mode (covers common lazy
/// loaders).
const LEGACY_ATTR_FALLBACKS: [&str; 3] = ["src", "data-src", "data-original"];

/// Default extension when the URL path carries none.
const DEFAULT_EXTENSION: &str = "jpg";

/// One planned image: absolute URL plus derived extension.
#[derive(Debug, Clone)]
pub struct ImageRef {
    pub url: String,
    pub extension: String,
}

/// Planned references for the structured sources path, grouped per source
/// in configuration order.
#[derive(Debug, Clone, Default)]
pub struct SourcesPlan {
    groups: Vec<(String, Vec<ImageRef>)>,
}

/// Planned references for the legacy block path.
#[derive(Debug, Clone, Default)]
pub struct BlocksPlan {
    groups: Vec<BlockGroup>,
}

#[derive(Debug, Clone)]
struct BlockGroup {
    key: String,
    download: bool,
    refs: Vec<String>,
}

/// First non-empty attribute from an ordered chain.
fn attr_chain(node: ElementRef<'_>, preferred: Option<&str>, fallbacks: &[&str]) -> Option<String> {
    preferred
        .into_iter()
        .chain(fallbacks.iter().copied())
        .filter_map(|attr| node.value().attr(attr))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// Collect and filter image references for every configured source.
pub fn plan_sources(html: &Html, rules: &ImageSourcesRules, base_url: &str) -> SourcesPlan {
    let mut groups = Vec::new();

    for source in &rules.sources {
        let mut refs = Vec::new();
        for container in scopes(html, source.container.as_ref()) {
            for node in container.select(&source.image) {
                let raw = match &source.read {
                    ImageRead::Attr(name) => {
                        attr_chain(node, Some(name.as_str()), &SOURCE_ATTR_FALLBACKS)
                    }
                    ImageRead::Text => {
                        let text = element_text(&node);
                        (!text.is_empty()).then_some(text)
                    }
                };
                let Some(raw) = raw else { continue };

                let url = resolve_url(base_url, &raw);
                let extension =
                    url_extension(&url).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
                if !rules.allowed_extensions.is_empty()
                    && !rules.allowed_extensions.contains(&extension)
                {
                    continue;
                }
                refs.push(ImageRef { url, extension });
            }
        }
        groups.push((source.key.clone(), refs));
    }

    SourcesPlan { groups }
}

/// Execute a sources plan: collect absolute URLs, or download under the
/// templated folder scheme.
///
/// The 1-based naming index is shared across all sources and advances only
/// for collected values; a failed download is logged and skipped without
/// advancing it.
pub async fn resolve_sources<F: Fetcher + ?Sized>(
    plan: SourcesPlan,
    rules: &ImageSourcesRules,
    brand: &str,
    product_name: Option<&str>,
    image_dir: &Path,
    fetcher: &F,
) -> Map<String, Value> {
    let brand_token = safe_filename(brand);
    let product_token = safe_filename(product_name.unwrap_or("unnamed"));
    let out_dir = image_dir
        .join(safe_filename(&apply_tokens(
            &rules.brand_folder,
            &brand_token,
            &product_token,
        )))
        .join(safe_filename(&apply_tokens(
            &rules.product_folder,
            &brand_token,
            &product_token,
        )));

    let mut out = Map::new();
    let mut index: usize = 1;

    for (key, refs) in plan.groups {
        let mut collected = Vec::new();
        for image in refs {
            if !rules.download {
                collected.push(Value::String(image.url));
                index += 1;
                continue;
            }

            if let Err(err) = ensure_dir(&out_dir) {
                warn!("could not create {}: {}", out_dir.display(), err);
                continue;
            }
            let base_name = rules.naming.replace("{index}", &index.to_string());
            let file_name = format!("{}.{}", safe_filename(&base_name), image.extension);
            let dest = out_dir.join(&file_name);

            match fetcher.download(&image.url, &dest).await {
                Ok(()) => {
                    collected.push(Value::String(display_path(&dest)));
                    index += 1;
                }
                Err(err) => warn!("failed to download {}: {}", image.url, err),
            }
        }
        out.insert(key, Value::Array(collected));
    }

    out
}

/// Collect image references for every legacy block.
pub fn plan_blocks(html: &Html, blocks: &[ImageBlockRule], base_url: &str) -> BlocksPlan {
    let mut groups = Vec::new();

    for block in blocks {
        let mut refs = Vec::new();
        for container in scopes(html, block.container.as_ref()) {
            for node in container.select(&block.image) {
                let Some(raw) = attr_chain(node, None, &LEGACY_ATTR_FALLBACKS) else {
                    continue;
                };
                refs.push(resolve_url(base_url, &raw));
            }
        }
        groups.push(BlockGroup {
            key: block.key.clone(),
            download: block.download,
            refs,
        });
    }

    BlocksPlan { groups }
}

/// Execute a legacy block plan. Downloads land under
/// `{image_dir}/{brand}/{sanitized page URL}` named `{key}_{n}.{ext}` with
/// a per-block counter.
pub async fn resolve_blocks<F: Fetcher + ?Sized>(
    plan: BlocksPlan,
    brand: &str,
    base_url: &str,
    image_dir: &Path,
    fetcher: &F,
) -> Map<String, Value> {
    let mut out = Map::new();

    for group in plan.groups {
        let mut collected = Vec::new();
        let mut count: usize = 1;

        for url in group.refs {
            if !group.download {
                collected.push(Value::String(url));
                continue;
            }

            let out_dir = image_dir
                .join(safe_filename(brand))
                .join(safe_filename(base_url));
            if let Err(err) = ensure_dir(&out_dir) {
                warn!("could not create {}: {}", out_dir.display(), err);
                continue;
            }
            let extension =
                url_extension(&url).unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
            let dest = out_dir.join(format!("{}_{}.{}", group.key, count, extension));

            match fetcher.download(&url, &dest).await {
                Ok(()) => {
                    collected.push(Value::String(display_path(&dest)));
                    count += 1;
                }
                Err(err) => warn!("failed to download {}: {}", url, err),
            }
        }

        out.insert(group.key, Value::Array(collected));
    }

    out
}

fn apply_tokens(template: &str, brand: &str, product: &str) -> String {
    template
        .replace("{brand}", brand)
        .replace("{product_name_sanitized}", product)
}
