//! Compiled extraction rules.
//!
//! The raw configuration is resolved exactly once into typed rules with
//! parsed selectors, compiled regexes and closed mode enums, so per-node
//! extraction never re-interprets selector text or mode strings. Bad
//! selectors, patterns and unknown modes fail here, before any fetch.

use std::collections::HashSet;
use std::path::PathBuf;

use regex::Regex;
use scraper::Selector;

use crate::config::{
    ChildRuleConfig, ConfigError, ContentRuleConfig, DetailRuleConfig, ExtractRuleConfig,
    FieldRuleConfig, ImageBlockConfig, ImageSourceConfig, ImagesConfig, PageConfig, SiteConfig,
};

/// How a field reads its matched node.
#[derive(Debug, Clone)]
pub enum ReadMode {
    /// Whitespace-normalized inner text.
    Text,
    /// A named attribute, resolved against the base URL when `normalize_url`
    /// is set.
    Attr { name: String, normalize_url: bool },
}

/// A compiled scalar/list field rule.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub key: String,
    pub selector: Option<Selector>,
    pub mode: ReadMode,
    pub multiple: bool,
}

/// Read mode of a `container` rule's child.
#[derive(Debug, Clone, Copy)]
pub enum ChildMode {
    Text,
    /// Ordered fallback over nested structures: list items, table rows,
    /// then the element's own text.
    Recursive,
}

#[derive(Debug, Clone)]
pub struct ChildRule {
    pub key: String,
    pub selector: Option<Selector>,
    pub mode: ChildMode,
}

/// How a generic rule treats each container scope.
#[derive(Debug, Clone, Copy)]
pub enum ExtractMode {
    /// Build a child map per container.
    Container,
    /// Collect the container's own text.
    Text,
}

/// A compiled generic container/children rule.
#[derive(Debug, Clone)]
pub struct ExtractRule {
    pub key: String,
    pub container: Option<Selector>,
    pub mode: ExtractMode,
    pub children: Vec<ChildRule>,
}

/// Content collection mode inside a grouped section.
#[derive(Debug, Clone, Copy)]
pub enum ContentMode {
    List,
    Text,
    Table,
}

#[derive(Debug, Clone)]
pub struct ContentRule {
    pub mode: ContentMode,
    pub selector: Selector,
}

/// Compiled grouped-section extraction rule.
#[derive(Debug, Clone)]
pub struct GroupedSectionRule {
    pub key: String,
    pub container: Option<Selector>,
    pub section_container: Option<Selector>,
    pub title: Option<Selector>,
    pub content_rules: Vec<ContentRule>,
    pub ignore_title_patterns: Vec<Regex>,
    pub skip_if_only_title_matches_product_name: bool,
}

/// Compiled paired heading/paragraph rule.
#[derive(Debug, Clone)]
pub struct PairedRule {
    pub key: String,
    pub container: Option<Selector>,
    pub title: Option<Selector>,
    pub text: Option<Selector>,
}

/// A detail extraction rule, resolved from its `mode` string.
#[derive(Debug, Clone)]
pub enum DetailRule {
    Generic(ExtractRule),
    GroupedSections(GroupedSectionRule),
    PairedHeadings(PairedRule),
}

impl DetailRule {
    pub fn key(&self) -> &str {
        match self {
            DetailRule::Generic(rule) => &rule.key,
            DetailRule::GroupedSections(rule) => &rule.key,
            DetailRule::PairedHeadings(rule) => &rule.key,
        }
    }
}

/// Compiled detail-page enrichment rules.
#[derive(Debug, Clone)]
pub struct DetailRules {
    /// Candidate product-name rules, tried in order.
    pub product_name: Vec<FieldRule>,
    pub extract: Vec<DetailRule>,
}

/// Compiled listing selectors for one page.
#[derive(Debug, Clone)]
pub struct ListingRules {
    pub container: Selector,
    pub fields: Vec<FieldRule>,
}

/// Compiled per-page rules.
#[derive(Debug, Clone)]
pub struct PageRules {
    pub url: String,
    pub title_selector: Option<Selector>,
    pub listing: Option<ListingRules>,
    /// Explicit `type: "listing"` marker.
    pub forced_listing: bool,
}

impl PageRules {
    /// A page is a listing page when marked as one or when it carries a
    /// product container selector.
    pub fn is_listing(&self) -> bool {
        self.forced_listing || self.listing.is_some()
    }
}

/// How an image source reads the raw reference from a node.
#[derive(Debug, Clone)]
pub enum ImageRead {
    /// The configured attribute, with lazy-load fallbacks.
    Attr(String),
    Text,
}

/// Compiled image source (structured configuration).
#[derive(Debug, Clone)]
pub struct ImageSourceRule {
    pub key: String,
    pub container: Option<Selector>,
    pub image: Selector,
    pub read: ImageRead,
}

/// Compiled structured image configuration, used for detail enrichment.
#[derive(Debug, Clone)]
pub struct ImageSourcesRules {
    pub sources: Vec<ImageSourceRule>,
    pub download: bool,
    pub allowed_extensions: HashSet<String>,
    pub naming: String,
    pub brand_folder: String,
    pub product_folder: String,
}

/// Compiled legacy image block, used for page-level images.
#[derive(Debug, Clone)]
pub struct ImageBlockRule {
    pub key: String,
    pub container: Option<Selector>,
    pub image: Selector,
    pub download: bool,
}

/// Compiled image configuration.
///
/// The structured and legacy paths deliberately stay separate: detail
/// enrichment resolves `sources`, page-level resolution walks `blocks`
/// (the legacy list, or the structured sources treated as non-downloading
/// blocks).
#[derive(Debug, Clone)]
pub struct ImageRules {
    pub sources: Option<ImageSourcesRules>,
    pub blocks: Vec<ImageBlockRule>,
}

/// Fully resolved configuration for one scrape run.
///
/// Immutable; threaded through every extraction call.
#[derive(Debug, Clone)]
pub struct ScrapeRules {
    pub brand: String,
    pub data_dir: PathBuf,
    pub image_dir: PathBuf,
    pub pages: Vec<PageRules>,
    /// Rules applied to non-listing pages.
    pub page_extract: Vec<ExtractRule>,
    pub detail: Option<DetailRules>,
    pub images: Option<ImageRules>,
}

impl ScrapeRules {
    /// Resolve a raw site configuration into compiled rules.
    pub fn compile(config: &SiteConfig) -> Result<Self, ConfigError> {
        let pages = config
            .links
            .iter()
            .map(compile_page)
            .collect::<Result<Vec<_>, _>>()?;

        let page_extract = config
            .extract
            .iter()
            .map(compile_extract_rule)
            .collect::<Result<Vec<_>, _>>()?;

        let detail = match &config.detail {
            Some(detail) => Some(DetailRules {
                product_name: detail
                    .selectors
                    .product_name
                    .iter()
                    .map(compile_field)
                    .collect::<Result<Vec<_>, _>>()?,
                extract: detail
                    .extract
                    .iter()
                    .map(compile_detail_rule)
                    .collect::<Result<Vec<_>, _>>()?,
            }),
            None => None,
        };

        let images = match &config.images {
            Some(images) => Some(compile_images(images)?),
            None => None,
        };

        Ok(Self {
            brand: config.brand.clone(),
            data_dir: config.output.data_dir.clone(),
            image_dir: config.output.image_dir.clone(),
            pages,
            page_extract,
            detail,
            images,
        })
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|err| ConfigError::Selector {
        selector: selector.to_string(),
        message: err.to_string(),
    })
}

fn parse_optional(selector: Option<&str>) -> Result<Option<Selector>, ConfigError> {
    match selector {
        Some(s) if !s.is_empty() => parse_selector(s).map(Some),
        _ => Ok(None),
    }
}

fn compile_page(page: &PageConfig) -> Result<PageRules, ConfigError> {
    let listing = match &page.selectors {
        Some(selectors) => match selectors.product_container.as_deref() {
            Some(container) if !container.is_empty() => Some(ListingRules {
                container: parse_selector(container)?,
                fields: selectors
                    .fields
                    .iter()
                    .map(compile_field)
                    .collect::<Result<Vec<_>, _>>()?,
            }),
            _ => None,
        },
        None => None,
    };

    Ok(PageRules {
        url: page.url.clone(),
        title_selector: parse_optional(page.page_title_selector.as_deref())?,
        listing,
        forced_listing: page.page_type.as_deref() == Some("listing"),
    })
}

fn compile_field(field: &FieldRuleConfig) -> Result<FieldRule, ConfigError> {
    let mode = match field.mode.as_str() {
        "text" => ReadMode::Text,
        "attr" => ReadMode::Attr {
            name: field.attr.clone().unwrap_or_else(|| "href".to_string()),
            normalize_url: field.normalize_url,
        },
        other => {
            return Err(ConfigError::UnknownMode {
                what: "field",
                mode: other.to_string(),
            })
        }
    };

    Ok(FieldRule {
        key: field.key.clone(),
        selector: parse_optional(field.selector.as_deref())?,
        mode,
        multiple: field.multiple,
    })
}

fn compile_child(child: &ChildRuleConfig) -> Result<ChildRule, ConfigError> {
    let mode = match child.extract_mode.as_str() {
        "text" => ChildMode::Text,
        "recursive" => ChildMode::Recursive,
        other => {
            return Err(ConfigError::UnknownMode {
                what: "child",
                mode: other.to_string(),
            })
        }
    };

    Ok(ChildRule {
        key: child.key.clone(),
        selector: parse_optional(child.selector.as_deref())?,
        mode,
    })
}

fn compile_extract_rule(rule: &ExtractRuleConfig) -> Result<ExtractRule, ConfigError> {
    compile_generic(
        &rule.key,
        rule.container_selector.as_deref(),
        &rule.extract_mode,
        &rule.children,
    )
}

fn compile_generic(
    key: &str,
    container: Option<&str>,
    extract_mode: &str,
    children: &[ChildRuleConfig],
) -> Result<ExtractRule, ConfigError> {
    let mode = match extract_mode {
        "container" => ExtractMode::Container,
        "text" => ExtractMode::Text,
        other => {
            return Err(ConfigError::UnknownMode {
                what: "extract",
                mode: other.to_string(),
            })
        }
    };

    Ok(ExtractRule {
        key: key.to_string(),
        container: parse_optional(container)?,
        mode,
        children: children
            .iter()
            .map(compile_child)
            .collect::<Result<Vec<_>, _>>()?,
    })
}

fn compile_detail_rule(rule: &DetailRuleConfig) -> Result<DetailRule, ConfigError> {
    match rule.mode.as_str() {
        "grouped_sections" => {
            let content_rules = rule
                .section_content_rules
                .iter()
                // Content rules without a selector contribute nothing.
                .filter(|content| content.selector.as_deref().is_some_and(|s| !s.is_empty()))
                .map(compile_content_rule)
                .collect::<Result<Vec<_>, _>>()?;

            let ignore_title_patterns = rule
                .ignore_if_title_matches
                .iter()
                .map(|pattern| {
                    Regex::new(pattern).map_err(|source| ConfigError::Pattern {
                        pattern: pattern.clone(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok(DetailRule::GroupedSections(GroupedSectionRule {
                key: rule.key.clone(),
                container: parse_optional(rule.container_selector.as_deref())?,
                section_container: parse_optional(rule.section_container_selector.as_deref())?,
                title: parse_optional(rule.section_title_selector.as_deref())?,
                content_rules,
                ignore_title_patterns,
                skip_if_only_title_matches_product_name: rule
                    .skip_sections_where_only_title_is_product_name,
            }))
        }
        "paired_headings_paragraphs" => Ok(DetailRule::PairedHeadings(PairedRule {
            key: rule.key.clone(),
            container: parse_optional(rule.container_selector.as_deref())?,
            title: parse_optional(rule.title_selector.as_deref())?,
            text: parse_optional(rule.text_selector.as_deref())?,
        })),
        "container" => Ok(DetailRule::Generic(compile_generic(
            &rule.key,
            rule.container_selector.as_deref(),
            &rule.extract_mode,
            &rule.children,
        )?)),
        other => Err(ConfigError::UnknownMode {
            what: "detail rule",
            mode: other.to_string(),
        }),
    }
}

fn compile_content_rule(content: &ContentRuleConfig) -> Result<ContentRule, ConfigError> {
    let mode = match content.mode.as_str() {
        "list" => ContentMode::List,
        "text" => ContentMode::Text,
        "table" => ContentMode::Table,
        other => {
            return Err(ConfigError::UnknownMode {
                what: "content",
                mode: other.to_string(),
            })
        }
    };

    let selector = content.selector.as_deref().unwrap_or_default();
    Ok(ContentRule {
        mode,
        selector: parse_selector(selector)?,
    })
}

fn compile_images(images: &ImagesConfig) -> Result<ImageRules, ConfigError> {
    match images {
        ImagesConfig::Sources(config) => {
            let sources = config
                .sources
                .iter()
                .map(compile_image_source)
                .collect::<Result<Vec<_>, _>>()?;

            // Page-level resolution treats the structured sources as plain
            // blocks; the shared download policy applies to detail
            // enrichment only.
            let blocks = config
                .sources
                .iter()
                .map(|source| {
                    Ok(ImageBlockRule {
                        key: source.key.clone(),
                        container: parse_optional(source.container_selector.as_deref())?,
                        image: parse_selector(&source.image_selector)?,
                        download: false,
                    })
                })
                .collect::<Result<Vec<_>, ConfigError>>()?;

            Ok(ImageRules {
                sources: Some(ImageSourcesRules {
                    sources,
                    download: config.download,
                    allowed_extensions: config
                        .allowed_extensions
                        .iter()
                        .map(|ext| ext.to_ascii_lowercase())
                        .collect(),
                    naming: config.naming.clone(),
                    brand_folder: config.folders.brand_folder.clone(),
                    product_folder: config.folders.product_folder.clone(),
                }),
                blocks,
            })
        }
        ImagesConfig::Legacy(blocks) => Ok(ImageRules {
            sources: None,
            blocks: blocks
                .iter()
                .map(compile_image_block)
                .collect::<Result<Vec<_>, _>>()?,
        }),
    }
}

fn compile_image_source(source: &ImageSourceConfig) -> Result<ImageSourceRule, ConfigError> {
    let read = match source.mode.as_str() {
        "attr" => ImageRead::Attr(source.attr.clone()),
        "text" => ImageRead::Text,
        other => {
            return Err(ConfigError::UnknownMode {
                what: "image source",
                mode: other.to_string(),
            })
        }
    };

    Ok(ImageSourceRule {
        key: source.key.clone(),
        container: parse_optional(source.container_selector.as_deref())?,
        image: parse_selector(&source.image_selector)?,
        read,
    })
}

fn compile_image_block(block: &ImageBlockConfig) -> Result<ImageBlockRule, ConfigError> {
    Ok(ImageBlockRule {
        key: block.key.clone(),
        container: parse_optional(block.container_selector.as_deref())?,
        image: parse_selector(&block.image_selector)?,
        download: block.download,
    })
}
