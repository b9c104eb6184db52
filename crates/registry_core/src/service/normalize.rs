//! Text normalization applied before validation.
//!
//! # Invariants
//! - Output never has leading/trailing whitespace.
//! - Names never contain control characters or runs of whitespace.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));
static CONTROL_CHAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\p{Cc}").expect("valid control char regex"));

/// Normalizes a display name: control characters are dropped, whitespace
/// runs left behind collapse to one space, ends are trimmed.
pub fn normalize_name(value: &str) -> String {
    // Tabs and newlines are `Cc` too; turn them into spaces before stripping.
    let spaced = WHITESPACE_RUN_RE.replace_all(value, " ");
    let stripped = CONTROL_CHAR_RE.replace_all(&spaced, "");
    WHITESPACE_RUN_RE
        .replace_all(&stripped, " ")
        .trim()
        .to_string()
}

/// Normalizes an institutional student id: control characters dropped,
/// ends trimmed. Inner spacing is kept as entered.
pub fn normalize_student_id(value: &str) -> String {
    CONTROL_CHAR_RE.replace_all(value, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::{normalize_name, normalize_student_id};

    #[test]
    fn name_collapses_inner_whitespace() {
        assert_eq!(
            normalize_name("  Computer \t\n Science  "),
            "Computer Science"
        );
    }

    #[test]
    fn name_drops_control_characters() {
        assert_eq!(normalize_name("Al\u{0}ice"), "Alice");
    }

    #[test]
    fn control_character_between_spaces_leaves_single_space() {
        assert_eq!(normalize_name("A \u{1} B"), "A B");
        assert_eq!(normalize_name("Computer \u{0}\u{7f} Science"), "Computer Science");
    }

    #[test]
    fn blank_name_normalizes_to_empty() {
        assert_eq!(normalize_name(" \t "), "");
    }

    #[test]
    fn student_id_is_trimmed_only() {
        assert_eq!(normalize_student_id("  S 001 \n"), "S 001");
    }
}
