//! `{{token}}` placeholder expansion for rule templates.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{(\w+)\}\}").expect("token placeholder regex"));

static DEFAULT_EXPANDER: LazyLock<TokenExpander> = LazyLock::new(TokenExpander::default);

/// Built-in tokens: Arabic character classes first, then book-structure markers.
const BASE_TOKENS: &[(&str, &str)] = &[
    ("raqm", "[٠-٩]"),
    ("raqms", "[٠-٩]+"),
    ("harf", "[ء-ي]"),
    ("harfs", "[ء-ي]+"),
    ("dash", "[-–—ـ]"),
    ("tarqim", "[.!?؟؛،]"),
    ("bab", "باب"),
    ("kitab", "كتاب"),
    ("fasl", "فصل"),
    ("basmalah", "(?:بسم الله|﷽)"),
    ("title", r#"<span[^>]*\bdata-type=["']?title["']?[^>]*>"#),
    ("numbered", "[٠-٩]+ [-–—ـ] "),
];

/// Maps token names to regex fragments and expands templates against them.
#[derive(Debug, Clone)]
pub struct TokenExpander {
    tokens: HashMap<String, String>,
}

impl TokenExpander {
    /// An expander with no tokens at all.
    pub fn empty() -> Self {
        Self {
            tokens: HashMap::new(),
        }
    }

    /// Adds or overrides a token.
    pub fn with_token(mut self, name: impl Into<String>, fragment: impl Into<String>) -> Self {
        self.tokens.insert(name.into(), fragment.into());
        self
    }

    pub fn extend<I, K, V>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tokens
            .extend(tokens.into_iter().map(|(k, v)| (k.into(), v.into())));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.tokens.get(name).map(String::as_str)
    }

    /// Replaces every known `{{name}}` with its fragment. Unknown placeholders stay verbatim.
    pub fn expand(&self, pattern: &str) -> String {
        TOKEN_PATTERN
            .replace_all(pattern, |caps: &Captures| match self.tokens.get(&caps[1]) {
                Some(fragment) => fragment.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Names of placeholders in `pattern` this expander does not know.
    pub fn unknown_tokens(&self, pattern: &str) -> Vec<String> {
        TOKEN_PATTERN
            .captures_iter(pattern)
            .map(|caps| caps[1].to_string())
            .filter(|name| !self.tokens.contains_key(name))
            .collect()
    }
}

impl Default for TokenExpander {
    fn default() -> Self {
        let mut expander = Self::empty();
        expander.extend(BASE_TOKENS.iter().copied());
        expander
    }
}

/// Expands `pattern` with the built-in token table.
pub fn expand_tokens(pattern: &str) -> String {
    DEFAULT_EXPANDER.expand(pattern)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_known_tokens_repeatedly() {
        let expanded = expand_tokens("^{{raqms}} {{dash}} {{raqms}}");
        assert_eq!(expanded, "^[٠-٩]+ [-–—ـ] [٠-٩]+");
    }

    #[test]
    fn leaves_unknown_tokens_verbatim() {
        let expanded = expand_tokens("{{bab}} {{nope}}");
        assert_eq!(expanded, "باب {{nope}}");
        assert_eq!(
            TokenExpander::default().unknown_tokens("{{bab}} {{nope}}"),
            vec!["nope".to_string()]
        );
    }

    #[test]
    fn expansion_is_idempotent() {
        let once = expand_tokens("{{basmalah}}{{tarqim}}x");
        assert_eq!(expand_tokens(&once), once);
    }

    #[test]
    fn caller_tokens_extend_and_override() {
        let expander = TokenExpander::default()
            .with_token("naql", "حدثنا")
            .with_token("raqm", "[0-9]");
        assert_eq!(expander.expand("{{naql}} {{raqm}}"), "حدثنا [0-9]");
        assert_eq!(expander.get("harf"), Some("[ء-ي]"));
    }

    #[test]
    fn empty_table_expands_nothing() {
        assert_eq!(TokenExpander::empty().expand("{{raqm}}"), "{{raqm}}");
    }

    #[test]
    fn built_in_fragments_compile() {
        let expander = TokenExpander::default();
        for (name, _) in BASE_TOKENS {
            let fragment = expander.get(name).unwrap();
            assert!(Regex::new(fragment).is_ok(), "token {} does not compile", name);
        }
    }
}
