/// Strips the punctuation people type into national IDs, so
/// `123.456.789-00` and `12345678900` resolve to the same patient.
pub fn normalize_national_id(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect()
}

/// Case-insensitive comparison of a reply against a keyword, ignoring
/// surrounding whitespace.
pub fn matches_keyword(input: &str, keyword: &str) -> bool {
    input.trim().to_lowercase() == keyword.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_national_id_punctuation_is_removed() {
        assert_eq!(normalize_national_id("123.456.789-00"), "12345678900");
        assert_eq!(normalize_national_id("  12345678900 "), "12345678900");
        assert_eq!(normalize_national_id(""), "");
    }

    #[test]
    fn test_keyword_matching() {
        assert!(matches_keyword(" YES ", "yes"));
        assert!(matches_keyword("Yes", "yes"));
        assert!(!matches_keyword("yes please", "yes"));
        assert!(!matches_keyword("no", "yes"));
    }
}
