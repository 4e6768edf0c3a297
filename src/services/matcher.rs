use crate::services::flattener::{FlattenedPages, PageMap};
use crate::types::{Meta, Occurrence, SplitPosition, SplitRule};
use regex::Regex;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleMatch {
    pub start: usize,
    pub end: usize,
}

/// A cut offset in the flattened stream and the metadata of the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPoint<'a> {
    pub offset: usize,
    pub meta: Option<&'a Meta>,
}

#[derive(Debug, Clone)]
pub struct RuleSplits<'a> {
    pub raw_matches: usize,
    pub points: Vec<SplitPoint<'a>>,
}

/// All non-overlapping matches, left to right.
pub fn find_matches(regex: &Regex, content: &str) -> Vec<RuleMatch> {
    regex
        .find_iter(content)
        .map(|m| RuleMatch {
            start: m.start(),
            end: m.end(),
        })
        .collect()
}

/// Drops matches whose starting page lies outside the rule's `[min, max]`.
pub fn filter_by_range(
    matches: Vec<RuleMatch>,
    rule: &SplitRule,
    page_map: &PageMap,
) -> Vec<RuleMatch> {
    if rule.min.is_none() && rule.max.is_none() {
        return matches;
    }
    matches
        .into_iter()
        .filter(|m| rule.admits(page_map.get_id(m.start)))
        .collect()
}

fn apply_occurrence(mut matches: Vec<RuleMatch>, occurrence: Occurrence) -> Vec<RuleMatch> {
    match occurrence {
        Occurrence::All => matches,
        Occurrence::First => {
            matches.truncate(1);
            matches
        }
        Occurrence::Last => matches.pop().into_iter().collect(),
    }
}

/// Applies the occurrence policy globally, or per `floor(id / maxSpan)` group when grouped.
pub fn filter_by_occurrence(
    matches: Vec<RuleMatch>,
    rule: &SplitRule,
    page_map: &PageMap,
) -> Vec<RuleMatch> {
    let Some(width) = rule.group_width() else {
        return apply_occurrence(matches, rule.occurrence);
    };

    let mut groups: BTreeMap<i64, Vec<RuleMatch>> = BTreeMap::new();
    for m in matches {
        let key = page_map.get_id(m.start).div_euclid(width);
        groups.entry(key).or_default().push(m);
    }

    groups
        .into_values()
        .flat_map(|group| apply_occurrence(group, rule.occurrence))
        .collect()
}

/// Runs one compiled rule over the stream and converts surviving matches to split points.
pub fn rule_split_points<'a>(
    rule: &'a SplitRule,
    regex: &Regex,
    flat: &FlattenedPages,
) -> RuleSplits<'a> {
    let matches = find_matches(regex, &flat.content);
    let raw_matches = matches.len();

    let matches = filter_by_range(matches, rule, &flat.page_map);
    let matches = filter_by_occurrence(matches, rule, &flat.page_map);

    let points: Vec<SplitPoint<'a>> = matches
        .into_iter()
        .map(|m| SplitPoint {
            offset: match rule.split {
                SplitPosition::Before => m.start,
                SplitPosition::After => m.end,
            },
            meta: rule.meta.as_ref(),
        })
        .collect();

    debug!(
        "Rule /{}/ matched {} times, kept {} split points",
        regex.as_str(),
        raw_matches,
        points.len()
    );

    RuleSplits {
        raw_matches,
        points,
    }
}
