//! Shared utility functions.
//!
//! This module contains reusable utilities used across the codebase:
//! - `fs`: safe file and folder naming
//! - `url`: URL resolution, extensions and display names

mod fs;
mod url;

pub use fs::safe_filename;
pub use url::{resolve_url, url_extension, url_fallback_title};
