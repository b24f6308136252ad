use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;

/// `#` followed by one or more ASCII word characters.
static HASHTAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Za-z0-9_]+)").expect("hashtag pattern is valid"));

/// Extracts normalized hashtag names from free text.
///
/// Names are lowercased with the leading `#` removed and deduplicated in
/// first-seen order, so `"#Ruby and #RUBY"` yields `["ruby"]`.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    HASHTAG_PATTERN
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|name| name.as_str().to_ascii_lowercase())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Normalizes a user-supplied tag name for lookup (`" #Rails "` -> `"rails"`).
///
/// Returns `None` for input that is blank once trimmed and stripped.
pub fn normalize_hashtag(raw: &str) -> Option<String> {
    let name = raw.trim().trim_start_matches('#').trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_first_seen_order() {
        assert_eq!(extract_hashtags("Hello #world and #ruby"), vec!["world", "ruby"]);
    }

    #[test]
    fn collapses_casing_variants() {
        assert_eq!(extract_hashtags("#Ruby and #RUBY"), vec!["ruby"]);
        assert_eq!(extract_hashtags("#rails #Rails #react #rails"), vec!["rails", "react"]);
    }

    #[test]
    fn empty_and_tagless_text_yield_nothing() {
        assert!(extract_hashtags("").is_empty());
        assert!(extract_hashtags("no tags here # just a hash").is_empty());
    }

    #[test]
    fn tag_stops_at_non_word_character() {
        assert_eq!(
            extract_hashtags("Shipping! #web-dev #node_js, #v2."),
            vec!["web", "node_js", "v2"]
        );
        assert_eq!(extract_hashtags("##double"), vec!["double"]);
    }

    #[test]
    fn normalizes_filter_input() {
        assert_eq!(normalize_hashtag(" #Rails "), Some("rails".to_string()));
        assert_eq!(normalize_hashtag("ruby"), Some("ruby".to_string()));
        assert_eq!(normalize_hashtag("  # "), None);
        assert_eq!(normalize_hashtag(""), None);
    }
}
