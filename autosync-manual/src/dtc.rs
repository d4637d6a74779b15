//! Diagnostic trouble code (DTC) token recognition.

use regex::Regex;
use std::sync::OnceLock;

/// Pattern for a powertrain diagnostic code: a leading `P` followed by
/// exactly four ASCII digits.
fn dtc_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^P[0-9]{4}$").expect("static DTC pattern is valid"))
}

/// Whether a single token is a diagnostic trouble code.
///
/// A token qualifies iff it is exactly five characters: a leading `P` and
/// four trailing ASCII digits. Matching is case-sensitive; callers that want
/// case-insensitive behavior uppercase the token first (as [`extract_code`]
/// does).
pub fn is_diagnostic_code(token: &str) -> bool {
    dtc_pattern().is_match(token)
}

/// Find the first diagnostic code token in a free-text query.
///
/// The query is uppercased and split on whitespace; each token is trimmed of
/// surrounding punctuation before the pattern test, so queries like
/// `"What is P0217?"` still resolve the code. The first qualifying token
/// wins. Returns `None` when no token qualifies.
pub fn extract_code(query: &str) -> Option<String> {
    query
        .to_uppercase()
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| !c.is_ascii_alphanumeric()))
        .find(|token| is_diagnostic_code(token))
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_codes() {
        assert!(is_diagnostic_code("P0217"));
        assert!(is_diagnostic_code("P0300"));
        assert!(is_diagnostic_code("P0000"));
    }

    #[test]
    fn test_invalid_codes() {
        // Too short, non-digit tail, wrong prefix, too long.
        assert!(!is_diagnostic_code("P021"));
        assert!(!is_diagnostic_code("PA217"));
        assert!(!is_diagnostic_code("X0217"));
        assert!(!is_diagnostic_code("P02171"));
        assert!(!is_diagnostic_code(""));
    }

    #[test]
    fn test_lowercase_qualifies_after_normalization() {
        assert!(!is_diagnostic_code("p0217"));
        assert_eq!(extract_code("what is p0217"), Some("P0217".to_string()));
    }

    #[test]
    fn test_surrounding_punctuation_is_trimmed() {
        assert_eq!(extract_code("What is P0217?"), Some("P0217".to_string()));
        assert_eq!(extract_code("(P0300)"), Some("P0300".to_string()));
        // Punctuation inside the token still disqualifies it.
        assert_eq!(extract_code("P02-17"), None);
    }

    #[test]
    fn test_extract_takes_first_matching_token() {
        assert_eq!(
            extract_code("compare P0300 against P0115"),
            Some("P0300".to_string())
        );
        assert_eq!(extract_code("my engine is overheating"), None);
        assert_eq!(extract_code(""), None);
    }
}
