// Core content extraction: the part of a question that identifies it.
//
// Two copies of the same question often differ only in presentation: one is
// numbered "3." and the other "(7)", one carries a "(5分)" score annotation,
// one wraps the stem in <strong>. Stripping all of that gives the text the
// fingerprint and the embedding model should see.

use std::sync::LazyLock;

use regex_lite::Regex;
use scraper::Html;

use super::sanitize::{normalize_whitespace, protect_math, restore_math};

/// Leading question numbering: "1.", "1、", "一、", "(1)", "（1）", "[1]".
static NUMBERING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\d+[.、]?|[一二三四五六七八九十]+[、.]?\s*|[(（]\d+[)）]|\[\d+\]\s*)\s*")
        .expect("valid numbering pattern")
});

/// Score annotations anywhere in the text: "(5分)", "[10分]", "（2.5分）".
static SCORE_ANNOTATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[(\[（][\d.]+分[)\]）]").expect("valid score annotation pattern")
});

/// Produces the normalized core text of a question.
///
/// Used for fingerprinting and as the text handed to the embedding model.
pub trait CoreContentExtractor: Send + Sync {
    fn extract(&self, text: &str) -> String;
}

/// Default extractor: visible text only, numbering and score annotations
/// removed, whitespace collapsed.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupCoreExtractor;

impl CoreContentExtractor for MarkupCoreExtractor {
    fn extract(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let visible = visible_text(text);
        let unnumbered = NUMBERING.replace(&visible, "");
        let unscored = SCORE_ANNOTATION.replace_all(&unnumbered, "");
        normalize_whitespace(&unscored)
    }
}

/// Text nodes joined by single spaces, math spans left untouched.
pub fn visible_text(markup: &str) -> String {
    let (protected, spans) = protect_math(markup);
    let fragment = Html::parse_fragment(&protected);
    let joined = fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    restore_math(&joined, &spans)
}
