use crate::error::{Result, SegmenterError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Page identifiers are opaque to the engine; only ordering and range checks are used.
pub type PageId = i64;

/// Arbitrary metadata a rule attaches to the segments it starts.
pub type Meta = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInput {
    pub id: PageId,
    pub content: String,
}

impl PageInput {
    pub fn new(id: PageId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
        }
    }
}

/// Accepted shapes of a page document on disk or over the wire.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PageDocument {
    Bare(Vec<PageInput>),
    Wrapped { pages: Vec<PageInput> },
}

impl PageDocument {
    pub fn into_pages(self) -> Vec<PageInput> {
        match self {
            PageDocument::Bare(pages) => pages,
            PageDocument::Wrapped { pages } => pages,
        }
    }
}

/// Whether a rule cuts at the start or the end of its match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitPosition {
    #[default]
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Occurrence {
    First,
    Last,
    #[default]
    All,
}

/// The pattern shape of a rule. Exactly one per rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RulePattern {
    /// Raw pattern, compiled as-is.
    Regex(String),
    /// Pattern with `{{token}}` placeholders.
    Template(String),
    /// Alternatives anchored at the start of a line.
    LineStartsWith(Vec<String>),
    /// Alternatives anchored at the end of a line.
    LineEndsWith(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "SplitRuleConfig")]
pub struct SplitRule {
    pub pattern: RulePattern,
    pub split: SplitPosition,
    pub occurrence: Occurrence,
    pub max_span: Option<i64>,
    pub min: Option<PageId>,
    pub max: Option<PageId>,
    pub meta: Option<Meta>,
}

impl SplitRule {
    pub fn new(pattern: RulePattern) -> Self {
        Self {
            pattern,
            split: SplitPosition::default(),
            occurrence: Occurrence::default(),
            max_span: None,
            min: None,
            max: None,
            meta: None,
        }
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::new(RulePattern::Regex(pattern.into()))
    }

    pub fn template(pattern: impl Into<String>) -> Self {
        Self::new(RulePattern::Template(pattern.into()))
    }

    pub fn line_starts_with<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RulePattern::LineStartsWith(
            alternatives.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn line_ends_with<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(RulePattern::LineEndsWith(
            alternatives.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn with_split(mut self, split: SplitPosition) -> Self {
        self.split = split;
        self
    }

    pub fn with_occurrence(mut self, occurrence: Occurrence) -> Self {
        self.occurrence = occurrence;
        self
    }

    pub fn with_max_span(mut self, max_span: i64) -> Self {
        self.max_span = Some(max_span);
        self
    }

    pub fn with_range(mut self, min: Option<PageId>, max: Option<PageId>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Inclusive `[min, max]` check; unset bounds are open.
    pub fn admits(&self, id: PageId) -> bool {
        self.min.map_or(true, |min| id >= min) && self.max.map_or(true, |max| id <= max)
    }

    /// Group width for occurrence filtering, `None` when filtering is global.
    pub fn group_width(&self) -> Option<i64> {
        self.max_span.filter(|span| *span > 0)
    }

    /// Converts the flat wire shape, rejecting ambiguous or empty pattern fields.
    pub fn from_config(index: usize, config: SplitRuleConfig) -> Result<Self> {
        let invalid = |reason: String| SegmenterError::InvalidRule {
            rule: index,
            reason,
        };

        let SplitRuleConfig {
            regex,
            template,
            line_starts_with,
            line_ends_with,
            split,
            occurrence,
            max_span,
            min,
            max,
            meta,
        } = config;

        let mut candidates = Vec::new();
        if let Some(alternatives) = line_starts_with {
            candidates.push(("lineStartsWith", RulePattern::LineStartsWith(alternatives)));
        }
        if let Some(alternatives) = line_ends_with {
            candidates.push(("lineEndsWith", RulePattern::LineEndsWith(alternatives)));
        }
        if let Some(template) = template {
            candidates.push(("template", RulePattern::Template(template)));
        }
        if let Some(regex) = regex {
            candidates.push(("regex", RulePattern::Regex(regex)));
        }

        if candidates.len() > 1 {
            let fields: Vec<&str> = candidates.iter().map(|(name, _)| *name).collect();
            return Err(invalid(format!(
                "expected exactly one pattern field, found {}",
                fields.join(", ")
            )));
        }

        let (field, pattern) = candidates.pop().ok_or_else(|| {
            invalid(
                "missing pattern field (regex, template, lineStartsWith or lineEndsWith)"
                    .to_string(),
            )
        })?;

        match &pattern {
            RulePattern::LineStartsWith(alternatives) | RulePattern::LineEndsWith(alternatives)
                if alternatives.is_empty() =>
            {
                return Err(invalid(format!("{} must not be empty", field)));
            }
            _ => {}
        }

        if let (Some(min), Some(max)) = (min, max) {
            if min > max {
                return Err(invalid(format!("min ({}) is greater than max ({})", min, max)));
            }
        }

        Ok(Self {
            pattern,
            split,
            occurrence,
            max_span,
            min,
            max,
            meta,
        })
    }
}

/// Flat JSON shape of a rule as edited by hand or by the editor's JSON tab.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitRuleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_starts_with: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_ends_with: Option<Vec<String>>,
    #[serde(default)]
    pub split: SplitPosition,
    #[serde(default)]
    pub occurrence: Occurrence,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_span: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<PageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<PageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl From<SplitRule> for SplitRuleConfig {
    fn from(rule: SplitRule) -> Self {
        let mut config = SplitRuleConfig {
            split: rule.split,
            occurrence: rule.occurrence,
            max_span: rule.max_span,
            min: rule.min,
            max: rule.max,
            meta: rule.meta,
            ..Default::default()
        };
        match rule.pattern {
            RulePattern::Regex(regex) => config.regex = Some(regex),
            RulePattern::Template(template) => config.template = Some(template),
            RulePattern::LineStartsWith(alternatives) => {
                config.line_starts_with = Some(alternatives)
            }
            RulePattern::LineEndsWith(alternatives) => config.line_ends_with = Some(alternatives),
        }
        config
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "SegmentationOptionsConfig")]
pub struct SegmentationOptions {
    pub rules: Vec<SplitRule>,
    pub strip_html: bool,
}

impl SegmentationOptions {
    pub fn new(rules: Vec<SplitRule>) -> Self {
        Self {
            rules,
            strip_html: false,
        }
    }

    pub fn with_strip_html(mut self, strip_html: bool) -> Self {
        self.strip_html = strip_html;
        self
    }

    /// Parses the JSON wire format, keeping rule errors typed.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SegmentationOptionsConfig = serde_json::from_str(json)?;
        Self::try_from(config)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentationOptionsConfig {
    #[serde(default)]
    pub rules: Vec<SplitRuleConfig>,
    #[serde(default)]
    pub strip_html: bool,
}

impl TryFrom<SegmentationOptionsConfig> for SegmentationOptions {
    type Error = SegmenterError;

    fn try_from(config: SegmentationOptionsConfig) -> Result<Self> {
        let rules = config
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, rule)| SplitRule::from_config(index, rule))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            rules,
            strip_html: config.strip_html,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub from: PageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl Segment {
    /// The `type` entry of the segment's metadata, if it is a string.
    pub fn kind(&self) -> Option<&str> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.get("type"))
            .and_then(|kind| kind.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Excerpt {
    pub id: String,
    pub text: String,
    pub from: PageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PageId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heading {
    pub id: String,
    pub text: String,
    pub from: PageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<PageId>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Excerpts {
    pub excerpts: Vec<Excerpt>,
    pub headings: Vec<Heading>,
}

#[derive(Debug, Clone, Default)]
pub struct ExcerptOptions {
    /// Excerpts shorter than this many characters are merged into the previous one.
    pub merge_min_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: String,
    pub source_type: SourceType,
    pub created_at: String,
    pub total_pages: usize,
    pub first_page: Option<PageId>,
    pub last_page: Option<PageId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceType {
    LocalFile,
    Url,
}

#[derive(Debug, Clone, Serialize)]
pub struct RuleAnalysis {
    pub rule: usize,
    pub raw_matches: usize,
    pub split_points: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub rules: Vec<RuleAnalysis>,
    pub split_points: usize,
    pub segments: usize,
    pub cross_page_segments: usize,
}

#[derive(Debug, Clone)]
pub struct SegmentationResult {
    pub source: String,
    pub total_pages: usize,
    pub total_segments: usize,
    pub output_file: PathBuf,
    pub metadata_file: Option<PathBuf>,
}
