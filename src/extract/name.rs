//! Product-name reconciliation between listing and detail pages.
//!
//! Listing pages often carry clean product titles while detail pages lead
//! with marketing copy; the heuristic here decides which name wins. A
//! product's name only ever improves, it is never regressed to a
//! description.

/// Collapse internal whitespace runs to single spaces and trim.
pub fn normalize_name(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether a string reads like a marketing description rather than a title:
/// twelve or more words, or eight or more with sentence punctuation.
fn looks_like_description(text: &str) -> bool {
    let words = text.split_whitespace().count();
    if words >= 12 {
        return true;
    }
    words >= 8 && text.chars().any(|c| matches!(c, '.' | '!' | '?'))
}

/// Decide whether a detail-page candidate should replace the current name.
///
/// Empty candidates never replace; anything beats an empty current name;
/// case-insensitive equals are a no-op. Between classes, a title-like name
/// always beats a description-like one; within a class the shorter name
/// wins.
pub fn should_replace_name(current: Option<&str>, candidate: Option<&str>) -> bool {
    let current = normalize_name(current.unwrap_or(""));
    let candidate = normalize_name(candidate.unwrap_or(""));

    if candidate.is_empty() {
        return false;
    }
    if current.is_empty() {
        return true;
    }
    if candidate.to_lowercase() == current.to_lowercase() {
        return false;
    }

    let current_is_description = looks_like_description(&current);
    let candidate_is_description = looks_like_description(&candidate);

    if candidate_is_description && !current_is_description {
        return false;
    }
    if current_is_description && !candidate_is_description {
        return true;
    }

    candidate.chars().count() < current.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTION: &str =
        "A sleek and reliable payment terminal for every retail environment.";

    #[test]
    fn test_empty_current_always_replaced() {
        assert!(should_replace_name(None, Some("Model X")));
        assert!(should_replace_name(Some(""), Some("Model X")));
        assert!(should_replace_name(Some("   "), Some("Model X")));
    }

    #[test]
    fn test_empty_candidate_never_replaces() {
        assert!(!should_replace_name(Some("Model X"), Some("")));
        assert!(!should_replace_name(Some("Model X"), None));
        assert!(!should_replace_name(None, None));
    }

    #[test]
    fn test_case_insensitive_equal_is_noop() {
        assert!(!should_replace_name(Some("Model X"), Some("model x")));
        assert!(!should_replace_name(Some("Model X"), Some("MODEL  X")));
    }

    #[test]
    fn test_description_never_replaces_title() {
        assert!(!should_replace_name(Some("Terminal"), Some(DESCRIPTION)));
    }

    #[test]
    fn test_title_always_replaces_description() {
        assert!(should_replace_name(Some(DESCRIPTION), Some("Model X")));
        // Even a longer title beats a description.
        assert!(should_replace_name(
            Some("Short but punchy sentence-free marketing copy here now ok."),
            Some("Model X Ultra Edition Limited")
        ));
    }

    #[test]
    fn test_shorter_wins_within_class() {
        assert!(should_replace_name(Some("Model X Pro Max"), Some("Model X")));
        assert!(!should_replace_name(Some("Model X"), Some("Model X Pro Max")));
    }

    #[test]
    fn test_description_classification_boundaries() {
        // Eight words with sentence punctuation counts as a description.
        let eight_punct = "One two three four five six seven eight.";
        assert!(looks_like_description(eight_punct));
        // Eight words without punctuation does not.
        assert!(!looks_like_description("One two three four five six seven eight"));
        // Twelve words always do.
        assert!(looks_like_description(
            "one two three four five six seven eight nine ten eleven twelve"
        ));
    }

    #[test]
    fn test_normalize_name_collapses_whitespace() {
        assert_eq!(normalize_name("  Model \t X \n Pro "), "Model X Pro");
        assert_eq!(normalize_name(""), "");
    }
}
