//! Disk persistence for run output.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::models::Document;
use crate::utils::safe_filename;

/// Create a directory and its parents if missing.
pub fn ensure_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Write the final document as pretty-printed JSON under the data directory,
/// named from the sanitized brand. Returns the output path.
pub fn save_document(data_dir: &Path, document: &Document) -> anyhow::Result<PathBuf> {
    ensure_dir(data_dir)?;
    let path = data_dir.join(format!("{}.json", safe_filename(&document.brand)));
    let json = serde_json::to_string_pretty(document)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// Render a path with forward slashes for output records.
pub fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
