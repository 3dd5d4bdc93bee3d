//! Markov training corpus preparation and tokenisation

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::strip_accents;

static LINE_BREAKS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\n\t/]").unwrap());
static REPEATED_PUNCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([.,/#!$%^&*;:\{\}=_`~()\-])[.,/#!$%^&*;:\{\}=_`~()\-]+").unwrap()
});
static PAD_PUNCT: Lazy<Regex> = Lazy::new(|| Regex::new(r"([.,!?()])").unwrap());
static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+(?:'\w+)*|[^\w\s]").unwrap());

/// Normalise raw training text.
///
/// Lower-cases, turns newlines, tabs and `/` into spaces, collapses repeated
/// punctuation to its first mark, pads `. , ! ? ( )` with spaces, strips
/// accents and keeps only ASCII plus `ñ`.
pub fn prepare_corpus(text: &str) -> String {
    let text = text.to_lowercase();
    let text = LINE_BREAKS.replace_all(&text, " ");
    let text = REPEATED_PUNCT.replace_all(&text, "$1");
    let text = PAD_PUNCT.replace_all(&text, " $1 ");
    let text: String = strip_accents(&text)
        .chars()
        .filter(|c| c.is_ascii() || *c == 'ñ')
        .collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Split prepared text into word tokens and single punctuation marks
pub fn tokenize(text: &str) -> Vec<String> {
    TOKEN
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prepare_corpus() {
        assert_eq!(
            prepare_corpus("¡Hola, Señor!!!\nBuenos días...\tsí/no"),
            "hola , señor ! buenos dias . si no"
        );
    }

    #[test]
    fn test_non_ascii_is_dropped() {
        assert_eq!(prepare_corpus("hola 😀 ¿qué?"), "hola que ?");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("hola , don't ( bien ) ."),
            vec!["hola", ",", "don't", "(", "bien", ")", "."]
        );
        assert!(tokenize("   ").is_empty());
    }
}
