//! Spanish text normalisation shared by the cleaner, the intent parser and
//! the Markov corpus preparation.

use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").unwrap());

/// Replace acute-accented vowels with their bare form.
///
/// Only á é í ó ú (either case) are touched; `ñ` and `ü` are preserved.
pub fn strip_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'á' => 'a',
            'é' => 'e',
            'í' => 'i',
            'ó' => 'o',
            'ú' => 'u',
            'Á' => 'A',
            'É' => 'E',
            'Í' => 'I',
            'Ó' => 'O',
            'Ú' => 'U',
            other => other,
        })
        .collect()
}

/// Collapse whitespace runs to a single space and trim the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Squash runs of two or more whitespace characters without trimming
pub(crate) fn squash_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").into_owned()
}

/// Query preprocessing: lower-case, strip accents, punctuation to spaces,
/// collapse whitespace.
pub fn normalize_query(text: &str) -> String {
    let lowered = strip_accents(&text.to_lowercase());
    let no_punct = NON_WORD.replace_all(&lowered, " ");
    collapse_whitespace(&no_punct)
}

/// Whitespace-delimited word count of the raw text
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_accents() {
        assert_eq!(strip_accents("canción Área"), "cancion Area");
        assert_eq!(strip_accents("mañana pingüino"), "mañana pingüino");
    }

    #[test]
    fn test_normalize_query() {
        assert_eq!(normalize_query("¡Hola, Qué  tal!"), "hola que tal");
        assert_eq!(normalize_query("   "), "");
        assert_eq!(normalize_query("adiós... hasta-luego"), "adios hasta luego");
    }

    #[test]
    fn test_word_count() {
        assert_eq!(word_count("hola"), 1);
        assert_eq!(word_count("  hola   buenas tardes "), 3);
        assert_eq!(word_count(""), 0);
    }

    #[test]
    fn test_squash_whitespace_keeps_edges() {
        assert_eq!(squash_whitespace(" a   b "), " a b ");
    }
}
