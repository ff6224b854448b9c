use std::sync::LazyLock;

use icu_normalizer::ComposingNormalizerBorrowed;
use regex::{NoExpand, Regex};

static BLANK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").expect("valid blank regex"));
static NON_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s]").expect("valid non-word regex"));

const MASK: &str = "______";

/// Canonical comparison form: NFC, lowercase, punctuation and symbols
/// removed, whitespace trimmed and collapsed to single spaces.
pub fn normalize(text: &str) -> String {
    let composed = ComposingNormalizerBorrowed::new_nfc().normalize(text);
    let lowered = composed.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lighter form used for synonym lookup: trimmed and lowercased only.
pub fn fold(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Replace every blank run in `sentence` with `answer`.
pub fn fill_blank(sentence: &str, answer: &str) -> String {
    BLANK.replace_all(sentence, NoExpand(answer)).into_owned()
}

/// Replace every blank run with a fixed-width gap for display.
pub fn mask_blank(sentence: &str) -> String {
    BLANK.replace_all(sentence, MASK).into_owned()
}

/// Text sent to speech synthesis; underscores would be read out literally.
pub fn speakable(text: &str) -> String {
    text.replace('_', " ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_punctuation_and_case() {
        assert_eq!(normalize("  She GAVE up, smoking!  "), "she gave up smoking");
        assert_eq!(normalize("don't"), "dont");
    }

    #[test]
    fn keeps_non_latin_word_characters() {
        assert_eq!(normalize("放棄！"), "放棄");
        assert_eq!(normalize("Café"), "café");
    }

    #[test]
    fn composes_decomposed_accents() {
        assert_eq!(normalize("cafe\u{301}"), normalize("caf\u{e9}"));
    }

    #[test]
    fn normalize_is_idempotent() {
        for input in [
            "She gave up smoking.",
            "  multiple   spaces\tand\ttabs ",
            "¿Qué tal?",
            "e\u{301}t\u{e9}",
            "snake_case stays",
            "",
            "!!!",
        ] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn fill_blank_replaces_every_run() {
        assert_eq!(
            fill_blank("She ___ smoking.", "gave up"),
            "She gave up smoking."
        );
        assert_eq!(fill_blank("_ and __", "x"), "x and x");
        assert_eq!(fill_blank("cost ___", "$5"), "cost $5");
    }

    #[test]
    fn mask_blank_uses_fixed_gap() {
        assert_eq!(mask_blank("She _ smoking."), "She ______ smoking.");
    }

    #[test]
    fn speakable_removes_underscores() {
        assert_eq!(speakable("She ___ smoking."), "She     smoking.");
    }
}
