use crate::error::{Result, SegmenterError};
use crate::services::tokens::TokenExpander;
use crate::types::{RulePattern, SplitRule};
use regex::{Regex, RegexBuilder};
use tracing::{debug, warn};

/// Turns declarative rules into multi-line, unicode-aware regexes.
#[derive(Debug, Clone, Default)]
pub struct RuleCompiler {
    expander: TokenExpander,
}

impl RuleCompiler {
    pub fn new(expander: TokenExpander) -> Self {
        Self { expander }
    }

    pub fn expander(&self) -> &TokenExpander {
        &self.expander
    }

    /// The final pattern text for a rule, after sugar synthesis and token expansion.
    pub fn pattern_source(&self, rule: &SplitRule) -> String {
        match &rule.pattern {
            RulePattern::Regex(regex) => regex.clone(),
            RulePattern::Template(template) => self.expander.expand(template),
            RulePattern::LineStartsWith(alternatives) => self
                .expander
                .expand(&format!("^(?:{})", alternatives.join("|"))),
            RulePattern::LineEndsWith(alternatives) => self
                .expander
                .expand(&format!("(?:{})$", alternatives.join("|"))),
        }
    }

    /// Placeholders in the rule's template that the token table does not know.
    pub fn unknown_tokens(&self, rule: &SplitRule) -> Vec<String> {
        match &rule.pattern {
            RulePattern::Regex(_) => Vec::new(),
            RulePattern::Template(template) => self.expander.unknown_tokens(template),
            RulePattern::LineStartsWith(alternatives) | RulePattern::LineEndsWith(alternatives) => {
                alternatives
                    .iter()
                    .flat_map(|alternative| self.expander.unknown_tokens(alternative))
                    .collect()
            }
        }
    }

    /// Compiles rule `index`. An invalid pattern is an error, never skipped.
    pub fn compile(&self, index: usize, rule: &SplitRule) -> Result<Regex> {
        let source = self.pattern_source(rule);

        let unknown = self.unknown_tokens(rule);
        if !unknown.is_empty() {
            warn!("Rule {} has unknown tokens: {}", index, unknown.join(", "));
        }

        let regex = RegexBuilder::new(&source)
            .multi_line(true)
            .unicode(true)
            .build()
            .map_err(|source_error| SegmenterError::InvalidPattern {
                rule: index,
                pattern: source.clone(),
                source: source_error,
            })?;

        debug!("Compiled rule {} to /{}/", index, source);
        Ok(regex)
    }

    pub fn compile_all(&self, rules: &[SplitRule]) -> Result<Vec<Regex>> {
        rules
            .iter()
            .enumerate()
            .map(|(index, rule)| self.compile(index, rule))
            .collect()
    }
}
