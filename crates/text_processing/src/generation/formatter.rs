//! Sentence formatting for generated text

use once_cell::sync::Lazy;
use regex::Regex;

static SPACE_BEFORE_PUNCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s([.,!?()\[\]])").unwrap());

/// Format a joined token string as a sentence, if it contains a period.
///
/// Truncates after the last `.` token, capitalises the first letter and
/// removes the padding space before punctuation. Returns `None` when no
/// period token exists.
pub fn try_format(text: &str) -> Option<String> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let last_period = tokens.iter().rposition(|t| *t == ".")?;

    let sentence = capitalize(&tokens[..=last_period].join(" "));
    Some(SPACE_BEFORE_PUNCT.replace_all(&sentence, "$1").into_owned())
}

/// Total version of [`try_format`]: text without a period comes back unchanged
pub fn format_sentence(text: &str) -> String {
    match try_format(text) {
        Some(formatted) => formatted,
        None => {
            tracing::warn!(text = text, "No sentence terminator; returning unformatted text");
            text.to_string()
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_to_last_period() {
        assert_eq!(
            format_sentence("hola , amigo . que tal . muy"),
            "Hola, amigo. que tal."
        );
    }

    #[test]
    fn test_removes_space_before_punctuation() {
        assert_eq!(format_sentence("buenos dias ! bien ?  ."), "Buenos dias! bien?.");
    }

    #[test]
    fn test_missing_period_returns_text_unchanged() {
        assert_eq!(try_format("hola amigo"), None);
        assert_eq!(format_sentence("hola amigo"), "hola amigo");
        assert_eq!(format_sentence(""), "");
    }

    #[test]
    fn test_capitalises_non_ascii_first_letter() {
        assert_eq!(format_sentence("ñandu ."), "Ñandu.");
    }
}
