//! Joins pages into one searchable stream and maps stream offsets back to pages.

use crate::types::{PageId, PageInput};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("html tag regex"));

/// `\r\n` and lone `\r` become `\n`.
pub fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n").replace('\r', "\n")
}

/// Removes every tag, keeping the text between them.
pub fn strip_html_tags(content: &str) -> String {
    HTML_TAG.replace_all(content, "").into_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RemovedTag {
    /// Offset in the stripped text where the tag used to be.
    at: usize,
    len: usize,
}

/// A page's markup together with the offsets of the tags removed from it.
#[derive(Debug, Clone)]
pub struct StrippedHtml {
    pub text: String,
    pub original: String,
    removed: Vec<RemovedTag>,
}

impl StrippedHtml {
    pub fn new(original: String) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut removed = Vec::new();
        let mut last = 0;

        for tag in HTML_TAG.find_iter(&original) {
            text.push_str(&original[last..tag.start()]);
            removed.push(RemovedTag {
                at: text.len(),
                len: tag.len(),
            });
            last = tag.end();
        }
        text.push_str(&original[last..]);

        Self {
            text,
            original,
            removed,
        }
    }

    /// Original offset of stripped offset `pos`. `include_tags_at` decides whether tags
    /// sitting exactly at `pos` fall before (true) or after (false) the returned offset.
    pub fn original_offset(&self, pos: usize, include_tags_at: bool) -> usize {
        let shift: usize = self
            .removed
            .iter()
            .take_while(|tag| tag.at < pos || (include_tags_at && tag.at == pos))
            .map(|tag| tag.len)
            .sum();
        pos + shift
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBoundary {
    pub start: usize,
    pub end: usize,
    pub id: PageId,
}

/// Page ranges within the flattened stream plus the offsets of synthetic joins.
#[derive(Debug, Clone)]
pub struct PageMap {
    boundaries: Vec<PageBoundary>,
    page_breaks: HashSet<usize>,
}

impl PageMap {
    pub fn boundaries(&self) -> &[PageBoundary] {
        &self.boundaries
    }

    /// Index of the page owning `offset`. A join newline belongs to the page before it;
    /// offsets past the end belong to the last page.
    pub fn index_of(&self, offset: usize) -> usize {
        let index = self.boundaries.partition_point(|b| b.end < offset);
        index.min(self.boundaries.len().saturating_sub(1))
    }

    pub fn get_id(&self, offset: usize) -> PageId {
        self.boundaries[self.index_of(offset)].id
    }

    pub fn is_page_break(&self, offset: usize) -> bool {
        self.page_breaks.contains(&offset)
    }

    pub fn page_break_count(&self) -> usize {
        self.page_breaks.len()
    }
}

#[derive(Debug, Clone)]
pub struct FlattenedPages {
    pub content: String,
    pub page_map: PageMap,
    /// Per-page markup, present only when pages were stripped of HTML.
    markup: Option<Vec<StrippedHtml>>,
}

impl FlattenedPages {
    /// Flattens `pages`, returning `None` when there is nothing to flatten.
    pub fn new(pages: &[PageInput], strip_html: bool) -> Option<Self> {
        if pages.is_empty() {
            return None;
        }

        let mut markup = strip_html.then(|| Vec::with_capacity(pages.len()));
        let mut content = String::new();
        let mut boundaries = Vec::with_capacity(pages.len());
        let mut page_breaks = HashSet::new();

        for (idx, page) in pages.iter().enumerate() {
            if idx > 0 {
                page_breaks.insert(content.len());
                content.push('\n');
            }

            let normalized = normalize_line_endings(&page.content);
            let start = content.len();
            match markup.as_mut() {
                Some(markup) => {
                    let stripped = StrippedHtml::new(normalized);
                    content.push_str(&stripped.text);
                    markup.push(stripped);
                }
                None => content.push_str(&normalized),
            }

            boundaries.push(PageBoundary {
                start,
                end: content.len(),
                id: page.id,
            });
        }

        Some(Self {
            content,
            page_map: PageMap {
                boundaries,
                page_breaks,
            },
            markup,
        })
    }

    pub fn first_id(&self) -> PageId {
        self.page_map.get_id(0)
    }

    /// Original markup covering stream range `[start, end)`, with page joins as spaces.
    pub fn html_for(&self, start: usize, end: usize) -> Option<String> {
        let markup = self.markup.as_ref()?;
        let first = self.page_map.index_of(start);
        let last = self.page_map.index_of(end.saturating_sub(1).max(start));

        let pieces: Vec<&str> = (first..=last)
            .map(|idx| {
                let boundary = &self.page_map.boundaries[idx];
                let page = &markup[idx];
                let local = |offset: usize| offset.clamp(boundary.start, boundary.end) - boundary.start;
                let from = if idx == first {
                    page.original_offset(local(start), false)
                } else {
                    0
                };
                let to = if idx == last {
                    page.original_offset(local(end), true)
                } else {
                    page.original.len()
                };
                &page.original[from..to.max(from)]
            })
            .collect();

        Some(pieces.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pages() -> Vec<PageInput> {
        vec![
            PageInput::new(3, "ab\r\ncd"),
            PageInput::new(7, "ef\rgh"),
            PageInput::new(9, ""),
            PageInput::new(12, "ij"),
        ]
    }

    #[test]
    fn flattens_with_single_newline_joins() {
        let flat = FlattenedPages::new(&pages(), false).unwrap();
        assert_eq!(flat.content, "ab\ncd\nef\ngh\n\nij");
        assert!(flat.page_map.is_page_break(5));
        assert!(!flat.page_map.is_page_break(2));
        assert_eq!(flat.page_map.page_break_count(), 3);
        assert_eq!(
            flat.page_map.boundaries()[1],
            PageBoundary {
                start: 6,
                end: 11,
                id: 7
            }
        );
    }

    #[test]
    fn maps_offsets_to_page_ids() {
        let flat = FlattenedPages::new(&pages(), false).unwrap();
        let map = &flat.page_map;
        assert_eq!(map.get_id(0), 3);
        assert_eq!(map.get_id(4), 3);
        assert_eq!(map.get_id(5), 3);
        assert_eq!(map.get_id(6), 7);
        assert_eq!(map.get_id(14), 12);
        assert_eq!(map.get_id(1_000), 12);
    }

    #[test]
    fn no_pages_flattens_to_nothing() {
        assert!(FlattenedPages::new(&[], false).is_none());
    }

    #[test]
    fn strips_tags_before_flattening() {
        let pages = vec![
            PageInput::new(1, "<p>أ <b>ب</b></p>"),
            PageInput::new(2, "<span data-type=\"title\">ج</span>"),
        ];
        let flat = FlattenedPages::new(&pages, true).unwrap();
        assert_eq!(flat.content, "أ ب\nج");
        assert_eq!(flat.page_map.get_id(flat.content.len() - 1), 2);
    }

    #[test]
    fn stripped_offsets_map_back_to_markup() {
        let stripped = StrippedHtml::new("<p>ab<b>c</b></p>".to_string());
        assert_eq!(stripped.text, "abc");
        assert_eq!(stripped.original_offset(0, false), 0);
        assert_eq!(stripped.original_offset(2, false), 5);
        assert_eq!(stripped.original_offset(2, true), 8);
        assert_eq!(stripped.original_offset(3, true), 17);
    }

    #[test]
    fn html_spans_pages() {
        let pages = vec![
            PageInput::new(1, "<p>one</p>"),
            PageInput::new(2, "<i>two</i> three"),
        ];
        let flat = FlattenedPages::new(&pages, true).unwrap();
        assert_eq!(flat.content, "one\ntwo three");
        assert_eq!(flat.html_for(0, 7).as_deref(), Some("<p>one</p> <i>two</i>"));
        assert_eq!(flat.html_for(8, 13).as_deref(), Some("three"));
        assert!(FlattenedPages::new(&pages, false)
            .unwrap()
            .html_for(0, 3)
            .is_none());
    }
}
