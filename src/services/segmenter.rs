use crate::error::Result;
use crate::services::compiler::RuleCompiler;
use crate::services::flattener::FlattenedPages;
use crate::services::matcher::{rule_split_points, SplitPoint};
use crate::services::tokens::TokenExpander;
use crate::types::{
    AnalysisReport, Meta, PageInput, RuleAnalysis, Segment, SegmentationOptions,
};
use tracing::{debug, info};

/// Partitions pages into segments according to a rule set.
#[derive(Debug, Clone, Default)]
pub struct Segmenter {
    compiler: RuleCompiler,
}

struct Collected<'a> {
    analyses: Vec<RuleAnalysis>,
    points: Vec<SplitPoint<'a>>,
}

impl Segmenter {
    /// A segmenter expanding templates against a custom token table.
    pub fn new(expander: TokenExpander) -> Self {
        Self {
            compiler: RuleCompiler::new(expander),
        }
    }

    pub fn compiler(&self) -> &RuleCompiler {
        &self.compiler
    }

    pub fn segment(
        &self,
        pages: &[PageInput],
        options: &SegmentationOptions,
    ) -> Result<Vec<Segment>> {
        Ok(self.run(pages, options)?.0)
    }

    /// Segments the pages and reports how each rule contributed.
    pub fn analyze(
        &self,
        pages: &[PageInput],
        options: &SegmentationOptions,
    ) -> Result<(Vec<Segment>, AnalysisReport)> {
        let (segments, collected) = self.run(pages, options)?;
        let report = AnalysisReport {
            rules: collected.analyses,
            split_points: collected.points.len(),
            segments: segments.len(),
            cross_page_segments: segments.iter().filter(|s| s.to.is_some()).count(),
        };
        Ok((segments, report))
    }

    fn run<'a>(
        &self,
        pages: &[PageInput],
        options: &'a SegmentationOptions,
    ) -> Result<(Vec<Segment>, Collected<'a>)> {
        // Patterns are compiled up front so a bad rule fails even on empty input.
        let regexes = self.compiler.compile_all(&options.rules)?;

        let mut collected = Collected {
            analyses: Vec::new(),
            points: Vec::new(),
        };

        if options.rules.is_empty() {
            return Ok((Vec::new(), collected));
        }
        let Some(flat) = FlattenedPages::new(pages, options.strip_html) else {
            return Ok((Vec::new(), collected));
        };

        for (index, (rule, regex)) in options.rules.iter().zip(&regexes).enumerate() {
            let splits = rule_split_points(rule, regex, &flat);
            collected.analyses.push(RuleAnalysis {
                rule: index,
                raw_matches: splits.raw_matches,
                split_points: splits.points.len(),
            });
            collected.points.extend(splits.points);
        }

        collected.points = aggregate_split_points(collected.points);

        let first_admitted = options
            .rules
            .iter()
            .any(|rule| rule.admits(flat.first_id()));
        let segments = carve_segments(&flat, &collected.points, first_admitted);

        info!(
            "Segmented {} pages into {} segments using {} rules",
            pages.len(),
            segments.len(),
            options.rules.len()
        );

        Ok((segments, collected))
    }
}

/// Sorts split points by offset and keeps the first point seen at each offset.
pub fn aggregate_split_points(mut points: Vec<SplitPoint<'_>>) -> Vec<SplitPoint<'_>> {
    let total = points.len();
    points.sort_by_key(|point| point.offset);
    points.dedup_by_key(|point| point.offset);
    if points.len() < total {
        debug!("Dropped {} duplicate split points", total - points.len());
    }
    points
}

fn carve_segments(
    flat: &FlattenedPages,
    points: &[SplitPoint<'_>],
    first_admitted: bool,
) -> Vec<Segment> {
    let len = flat.content.len();
    let mut segments = Vec::with_capacity(points.len() + 1);

    let Some(first) = points.first() else {
        if first_admitted {
            segments.extend(materialize(flat, 0, len, None));
        }
        return segments;
    };

    if first.offset > 0 && first_admitted {
        segments.extend(materialize(flat, 0, first.offset, None));
    }

    for (idx, point) in points.iter().enumerate() {
        let end = points.get(idx + 1).map_or(len, |next| next.offset);
        segments.extend(materialize(flat, point.offset, end, point.meta));
    }

    segments
}

/// Builds a segment from stream range `[start, end)`, or `None` if it is blank.
/// Only trailing whitespace is trimmed; leading whitespace after a cut is kept.
fn materialize(
    flat: &FlattenedPages,
    start: usize,
    end: usize,
    meta: Option<&Meta>,
) -> Option<Segment> {
    let trimmed = flat.content[start..end].trim_end();
    if trimmed.is_empty() {
        return None;
    }

    let content: String = trimmed
        .char_indices()
        .map(|(i, ch)| {
            if ch == '\n' && flat.page_map.is_page_break(start + i) {
                ' '
            } else {
                ch
            }
        })
        .collect();

    let trimmed_end = start + trimmed.len();
    let from = flat.page_map.get_id(start);
    let to = flat.page_map.get_id(trimmed_end - 1);

    Some(Segment {
        content,
        html: flat.html_for(start, trimmed_end),
        from,
        to: (to != from).then_some(to),
        meta: meta.cloned(),
    })
}

/// Segments `pages` with the built-in token table.
pub fn segment_pages(pages: &[PageInput], options: &SegmentationOptions) -> Result<Vec<Segment>> {
    Segmenter::default().segment(pages, options)
}

/// Segments `pages` and returns per-rule match statistics alongside the segments.
pub fn analyze_pages(
    pages: &[PageInput],
    options: &SegmentationOptions,
) -> Result<(Vec<Segment>, AnalysisReport)> {
    Segmenter::default().analyze(pages, options)
}
