//! Site configuration schema.
//!
//! These structs mirror the JSON configuration consumed by the scraper and
//! stay close to the on-disk shape: optional selectors, `mode` strings and
//! serde defaults. [`crate::rules`] resolves them once into compiled form;
//! nothing re-reads raw config during extraction.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration loading or compilation failure.
///
/// These are fatal and surface before any extraction begins.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },
    #[error("invalid ignore pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        source: regex::Error,
    },
    #[error("unknown {what} mode `{mode}`")]
    UnknownMode { what: &'static str, mode: String },
}

/// Top-level site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Brand name; also names the output document.
    pub brand: String,
    pub output: OutputConfig,
    /// Pages to visit, in order.
    #[serde(default)]
    pub links: Vec<PageConfig>,
    /// Extraction rules applied to non-listing pages.
    #[serde(default)]
    pub extract: Vec<ExtractRuleConfig>,
    /// Detail-page enrichment for listing products.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<DetailConfig>,
    /// Image resolution configuration; either the structured `sources` form
    /// or a bare list of legacy blocks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<ImagesConfig>,
}

impl SiteConfig {
    /// Load a site configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&raw)?)
    }
}

/// Output directories for the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub data_dir: PathBuf,
    pub image_dir: PathBuf,
}

/// One configured page visit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageConfig {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_title_selector: Option<String>,
    /// Page kind marker; `"listing"` forces listing handling even without
    /// a product container selector.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<ListingSelectors>,
}

/// Listing-page selectors: the repeated product container and its fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingSelectors {
    #[serde(default)]
    pub product_container: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldRuleConfig>,
}

/// A single scalar or list field read from one scope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FieldRuleConfig {
    pub key: String,
    #[serde(default)]
    pub selector: Option<String>,
    /// `"text"` or `"attr"`.
    #[serde(default = "default_mode_text")]
    pub mode: String,
    /// Attribute name for `attr` mode; defaults to `href`.
    #[serde(default)]
    pub attr: Option<String>,
    #[serde(default)]
    pub multiple: bool,
    /// Resolve attribute values against the page URL.
    #[serde(default)]
    pub normalize_url: bool,
}

/// Container/children extraction rule for non-listing pages and simple
/// detail fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractRuleConfig {
    pub key: String,
    #[serde(default)]
    pub container_selector: Option<String>,
    /// `"container"` (child map per container) or `"text"` (container text).
    #[serde(default = "default_mode_container")]
    pub extract_mode: String,
    #[serde(default)]
    pub children: Vec<ChildRuleConfig>,
}

/// One child of a `container` extraction rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChildRuleConfig {
    pub key: String,
    #[serde(default)]
    pub selector: Option<String>,
    /// `"text"` or `"recursive"` (walk nested list/table structures).
    #[serde(default = "default_mode_text")]
    pub extract_mode: String,
}

/// Detail-page enrichment configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailConfig {
    #[serde(default)]
    pub selectors: DetailSelectors,
    #[serde(default)]
    pub extract: Vec<DetailRuleConfig>,
}

/// Selectors evaluated on the detail page itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailSelectors {
    /// Candidate product-name rules, tried in order.
    #[serde(default)]
    pub product_name: Vec<FieldRuleConfig>,
}

/// A detail extraction rule, dispatched by `mode`:
/// `"grouped_sections"`, `"paired_headings_paragraphs"` or `"container"`
/// (the default, evaluated as a generic extraction rule).
///
/// This is the loosely-typed superset of all three variants; the compile
/// step picks the fields the resolved variant actually uses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetailRuleConfig {
    pub key: String,
    #[serde(default = "default_mode_container")]
    pub mode: String,
    #[serde(default)]
    pub container_selector: Option<String>,
    // Generic-rule fields.
    #[serde(default = "default_mode_container")]
    pub extract_mode: String,
    #[serde(default)]
    pub children: Vec<ChildRuleConfig>,
    // Grouped-section fields.
    #[serde(default)]
    pub section_container_selector: Option<String>,
    #[serde(default)]
    pub section_title_selector: Option<String>,
    #[serde(default)]
    pub section_content_rules: Vec<ContentRuleConfig>,
    #[serde(default)]
    pub ignore_if_title_matches: Vec<String>,
    #[serde(default)]
    pub skip_sections_where_only_title_is_product_name: bool,
    // Paired-heading fields.
    #[serde(default)]
    pub title_selector: Option<String>,
    #[serde(default)]
    pub text_selector: Option<String>,
}

/// Content rule inside a grouped section: `"list"`, `"text"` or `"table"`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentRuleConfig {
    #[serde(default = "default_mode_text")]
    pub mode: String,
    #[serde(default)]
    pub selector: Option<String>,
}

/// Image configuration: the structured form with shared download policy,
/// or the legacy bare list of blocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImagesConfig {
    Sources(ImageSourcesConfig),
    Legacy(Vec<ImageBlockConfig>),
}

/// Structured image configuration used for detail-page enrichment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageSourcesConfig {
    #[serde(default)]
    pub sources: Vec<ImageSourceConfig>,
    #[serde(default)]
    pub download: bool,
    /// Allow-list of extensions (no leading dot); empty accepts all.
    #[serde(default)]
    pub allowed_extensions: Vec<String>,
    /// File-name template with an `{index}` placeholder.
    #[serde(default = "default_naming")]
    pub naming: String,
    #[serde(default)]
    pub folders: FolderConfig,
}

/// Folder templates for downloaded images. Templates may use the `{brand}`
/// and `{product_name_sanitized}` tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderConfig {
    #[serde(default = "default_brand_folder")]
    pub brand_folder: String,
    #[serde(default = "default_product_folder")]
    pub product_folder: String,
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            brand_folder: default_brand_folder(),
            product_folder: default_product_folder(),
        }
    }
}

/// One image source within the structured configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSourceConfig {
    #[serde(default = "default_images_key")]
    pub key: String,
    #[serde(default)]
    pub container_selector: Option<String>,
    #[serde(default = "default_image_selector")]
    pub image_selector: String,
    /// `"attr"` or `"text"`.
    #[serde(default = "default_mode_attr")]
    pub mode: String,
    #[serde(default = "default_attr_src")]
    pub attr: String,
}

/// One legacy image block (bare-list form, non-listing pages).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageBlockConfig {
    #[serde(default = "default_images_key")]
    pub key: String,
    #[serde(default)]
    pub container_selector: Option<String>,
    #[serde(default = "default_image_selector")]
    pub image_selector: String,
    #[serde(default)]
    pub download: bool,
}

fn default_mode_text() -> String {
    "text".to_string()
}

fn default_mode_container() -> String {
    "container".to_string()
}

fn default_mode_attr() -> String {
    "attr".to_string()
}

fn default_attr_src() -> String {
    "src".to_string()
}

fn default_images_key() -> String {
    "images".to_string()
}

fn default_image_selector() -> String {
    "img".to_string()
}

fn default_naming() -> String {
    "image_{index}".to_string()
}

fn default_brand_folder() -> String {
    "{brand}".to_string()
}

fn default_product_folder() -> String {
    "{product_name_sanitized}".to_string()
}
