//! Turns segments into the editor's excerpt/heading corpus with human-facing IDs.

use crate::error::Result;
use crate::services::arabic::{preformat_arabic_text, sanitize_arabic};
use crate::services::flattener::strip_html_tags;
use crate::services::segmenter::segment_pages;
use crate::types::{
    Excerpt, ExcerptOptions, Excerpts, Heading, Meta, PageId, PageInput, Segment,
    SegmentationOptions, SplitRule,
};
use std::collections::HashMap;
use tracing::{debug, info};

/// Segment types rendered as headings rather than excerpts.
const HEADING_KINDS: &[&str] = &["chapter", "book", "title"];

fn id_prefix(kind: Option<&str>) -> char {
    match kind {
        Some("chapter") => 'C',
        Some("book") => 'B',
        Some("title") => 'T',
        _ => 'P',
    }
}

fn format_id(from: PageId, kind: Option<&str>, count: usize) -> String {
    let suffix = match count {
        0 => String::new(),
        1..=25 => char::from(b'a' + count as u8).to_string(),
        _ => format!("_{}", count),
    };
    format!("{}{}{}", id_prefix(kind), from, suffix)
}

/// ID for `segment` given how many earlier segments shared its page and type.
/// The first gets no suffix, the second `b`, the third `c`.
pub fn get_segment_id(segment: &Segment, count: usize) -> String {
    format_id(segment.from, segment.kind(), count)
}

/// Per-document counter keyed by page and ID prefix, so types sharing a prefix never
/// hand out the same ID twice.
#[derive(Debug, Default)]
pub struct IdGenerator {
    counters: HashMap<String, usize>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self, from: PageId, kind: Option<&str>) -> String {
        let key = format!("{}{}", from, id_prefix(kind));
        let count = self.counters.entry(key).or_insert(0);
        let id = format_id(from, kind, *count);
        *count += 1;
        id
    }

    pub fn next_for(&mut self, segment: &Segment) -> String {
        self.next_id(segment.from, segment.kind())
    }
}

#[derive(Debug)]
enum Draft {
    Heading {
        text: String,
        from: PageId,
        to: Option<PageId>,
        kind: String,
    },
    Excerpt {
        text: String,
        from: PageId,
        to: Option<PageId>,
        meta: Option<Meta>,
    },
}

fn draft_segment(segment: Segment, clean: &dyn Fn(&str) -> String, drafts: &mut Vec<Draft>) {
    let text = clean(&segment.content);
    if text.is_empty() {
        return;
    }

    let heading_kind = segment
        .kind()
        .filter(|kind| HEADING_KINDS.contains(kind))
        .map(str::to_string);

    let Some(kind) = heading_kind else {
        drafts.push(Draft::Excerpt {
            text,
            from: segment.from,
            to: segment.to,
            meta: segment.meta,
        });
        return;
    };

    let (title, body) = match text.split_once('\n') {
        Some((title, body)) => (title.trim().to_string(), body.trim().to_string()),
        None => (text, String::new()),
    };

    if body.is_empty() {
        drafts.push(Draft::Heading {
            text: title,
            from: segment.from,
            to: segment.to,
            kind,
        });
    } else {
        drafts.push(Draft::Heading {
            text: title,
            from: segment.from,
            to: None,
            kind,
        });
        drafts.push(Draft::Excerpt {
            text: body,
            from: segment.from,
            to: segment.to,
            meta: None,
        });
    }
}

/// Folds short excerpts into the excerpt right before them.
fn merge_short_excerpts(drafts: Vec<Draft>, min_length: usize) -> Vec<Draft> {
    let mut merged: Vec<Draft> = Vec::with_capacity(drafts.len());

    for draft in drafts {
        if let (
            Draft::Excerpt {
                text, from: cur_from, to: cur_to, ..
            },
            Some(Draft::Excerpt {
                text: prev_text,
                from: prev_from,
                to: prev_to,
                ..
            }),
        ) = (&draft, merged.last_mut())
        {
            if text.chars().count() < min_length {
                prev_text.push('\n');
                prev_text.push_str(text);
                let end = cur_to.unwrap_or(*cur_from);
                if end != *prev_from {
                    *prev_to = Some(end);
                }
                continue;
            }
        }
        merged.push(draft);
    }

    merged
}

fn build_excerpts(
    segments: Vec<Segment>,
    options: &ExcerptOptions,
    clean: &dyn Fn(&str) -> String,
) -> Excerpts {
    let mut drafts = Vec::with_capacity(segments.len());
    for segment in segments {
        draft_segment(segment, clean, &mut drafts);
    }

    let before = drafts.len();
    let drafts = merge_short_excerpts(drafts, options.merge_min_length);
    debug!("Merged {} short excerpts", before - drafts.len());

    let mut ids = IdGenerator::new();
    let mut result = Excerpts::default();

    for draft in drafts {
        match draft {
            Draft::Heading {
                text,
                from,
                to,
                kind,
            } => result.headings.push(Heading {
                id: ids.next_id(from, Some(&kind)),
                text,
                from,
                to,
            }),
            Draft::Excerpt {
                text,
                from,
                to,
                meta,
            } => {
                let kind = meta
                    .as_ref()
                    .and_then(|meta| meta.get("type"))
                    .and_then(|kind| kind.as_str());
                result.excerpts.push(Excerpt {
                    id: ids.next_id(from, kind),
                    text,
                    from,
                    to,
                    meta,
                });
            }
        }
    }

    info!(
        "Built {} excerpts and {} headings",
        result.excerpts.len(),
        result.headings.len()
    );
    result
}

fn clean_text(text: &str) -> String {
    preformat_arabic_text(&sanitize_arabic(text))
}

/// Segments pages with `options` and converts the segments into excerpts and headings.
pub fn map_pages_to_excerpts(
    pages: &[PageInput],
    options: &SegmentationOptions,
    excerpt_options: &ExcerptOptions,
) -> Result<Excerpts> {
    let segments = segment_pages(pages, options)?;
    Ok(build_excerpts(segments, excerpt_options, &clean_text))
}

/// Rules for Shamela HTML exports: title spans open chapters, numbered lines open entries.
pub fn shamela_options() -> SegmentationOptions {
    let mut chapter = Meta::new();
    chapter.insert("type".to_string(), "chapter".into());

    SegmentationOptions::new(vec![
        SplitRule::template("{{title}}").with_meta(chapter),
        SplitRule::line_starts_with(["{{numbered}}"]),
    ])
}

/// Like [`map_pages_to_excerpts`] with the Shamela rule set; markup is removed per segment.
pub fn segment_shamela_pages_to_excerpts(
    pages: &[PageInput],
    excerpt_options: &ExcerptOptions,
) -> Result<Excerpts> {
    let segments = segment_pages(pages, &shamela_options())?;
    Ok(build_excerpts(segments, excerpt_options, &|text: &str| {
        clean_text(&strip_html_tags(text))
    }))
}
