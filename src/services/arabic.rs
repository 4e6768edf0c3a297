//! Display cleanup applied to segment text after segmentation.

use regex::Regex;
use std::sync::LazyLock;

static INVISIBLES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("[\u{064B}-\u{065F}\u{0670}\u{0640}\u{200B}-\u{200F}\u{202A}-\u{202E}\u{FEFF}]")
        .expect("arabic invisibles regex")
});

static HORIZONTAL_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+").expect("horizontal whitespace regex"));

static SPACE_BEFORE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\S\n]+([،؛؟.:!,])").expect("punctuation spacing regex"));

static LATIN_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([ء-ي])\s*,\s*([ء-ي])").expect("latin comma regex"));

static EXTRA_BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("blank lines regex"));

/// Removes diacritics, tatweel, zero-width and bidi marks, and collapses horizontal spaces.
pub fn sanitize_arabic(text: &str) -> String {
    let stripped = INVISIBLES.replace_all(text, "");
    HORIZONTAL_SPACE.replace_all(&stripped, " ").into_owned()
}

/// Normalises punctuation spacing and line layout for display.
pub fn preformat_arabic_text(text: &str) -> String {
    let text = SPACE_BEFORE_PUNCTUATION.replace_all(text, "$1");
    let text = LATIN_COMMA.replace_all(&text, "$1، $2");
    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    EXTRA_BLANK_LINES
        .replace_all(lines.join("\n").trim(), "\n\n")
        .into_owned()
}
