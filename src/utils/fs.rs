//! Filesystem naming helpers.

/// Maximum length of a sanitized path segment.
const MAX_SEGMENT_LEN: usize = 200;

/// Normalize a string for use as a file or folder name.
///
/// Lower-cases, maps whitespace and unsafe characters to underscores,
/// collapses underscore runs, trims separator characters from both ends
/// and caps the length. Never returns an empty string.
pub fn safe_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_underscore = false;

    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            out.push(c.to_ascii_lowercase());
            last_was_underscore = false;
        } else if !last_was_underscore {
            out.push('_');
            last_was_underscore = true;
        }
    }

    out.truncate(MAX_SEGMENT_LEN);
    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    if trimmed.is_empty() {
        "unnamed".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_filename_basic() {
        assert_eq!(safe_filename("Model X"), "model_x");
        assert_eq!(safe_filename("  Pro / Max  "), "pro_max");
        assert_eq!(safe_filename("a<>:\"/\\|?*b"), "a_b");
    }

    #[test]
    fn test_safe_filename_collapses_and_trims() {
        assert_eq!(safe_filename("__hello__world__"), "hello_world");
        assert_eq!(safe_filename("...dots..."), "dots");
        assert_eq!(safe_filename("a   b\t\nc"), "a_b_c");
    }

    #[test]
    fn test_safe_filename_never_empty() {
        assert_eq!(safe_filename(""), "unnamed");
        assert_eq!(safe_filename("   "), "unnamed");
        assert_eq!(safe_filename("???"), "unnamed");
    }

    #[test]
    fn test_safe_filename_non_ascii() {
        assert_eq!(safe_filename("café au lait"), "caf_au_lait");
    }

    #[test]
    fn test_safe_filename_length_cap() {
        let long = "a".repeat(500);
        assert!(safe_filename(&long).len() <= MAX_SEGMENT_LEN);
    }

    #[test]
    fn test_safe_filename_idempotent() {
        for input in [
            "Model X",
            "  Pro / Max  ",
            "café au lait",
            "",
            "a?b!c",
            &"x y ".repeat(100),
        ] {
            let once = safe_filename(input);
            assert_eq!(safe_filename(&once), once);
            assert!(!once.is_empty());
        }
    }
}
