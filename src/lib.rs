//! # Page Segmenter Library
//!
//! Segments page-based textual corpora (books, transcripts, web scrapes) into chapters,
//! numbered entries and paragraphs, tracking which pages every segment spans.
//! Rules are declarative and JSON-serialisable; templates can use `{{token}}` placeholders
//! for common Arabic character classes and book-structure markers.
//!
//! ## Example Usage
//!
//! ```rust
//! use page_segmenter::{segment_pages, PageInput, SegmentationOptions};
//!
//! let pages = vec![
//!     PageInput::new(10, "١ - أ كامل\n٢ - بداية"),
//!     PageInput::new(11, "تكملة\n٣ - ج"),
//! ];
//! let options = SegmentationOptions::from_json(
//!     r#"{ "rules": [{ "lineStartsWith": ["{{raqms}} {{dash}} "], "split": "before" }] }"#,
//! )?;
//!
//! let segments = segment_pages(&pages, &options)?;
//! assert_eq!(segments[1].content, "٢ - بداية تكملة");
//! assert_eq!((segments[1].from, segments[1].to), (10, Some(11)));
//! # Ok::<(), page_segmenter::SegmenterError>(())
//! ```

pub mod error;
pub mod services;
pub mod types;

pub use error::{Result, SegmenterError};
pub use services::arabic::{preformat_arabic_text, sanitize_arabic};
pub use services::excerpts::{
    get_segment_id, map_pages_to_excerpts, segment_shamela_pages_to_excerpts, IdGenerator,
};
pub use services::segmenter::{analyze_pages, segment_pages};
pub use services::tokens::expand_tokens;
pub use services::{ContentFetcher, OutputWriter, RuleCompiler, Segmenter, TokenExpander};
pub use types::{
    AnalysisReport, DocumentMetadata, ExcerptOptions, Excerpts, Occurrence, PageId, PageInput,
    RulePattern, Segment, SegmentationOptions, SplitPosition, SplitRule, SplitRuleConfig,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn book() -> Vec<PageInput> {
        vec![
            PageInput::new(1, "بسم الله الرحمن الرحيم\nباب الإيمان"),
            PageInput::new(2, "١ - حديث أول\r\n٢ - حديث"),
            PageInput::new(3, "ثان يمتد\n٣ - حديث ثالث."),
        ]
    }

    #[tokio::test]
    async fn test_basic_workflow() {
        let options = SegmentationOptions::from_json(
            &json!({
                "stripHtml": false,
                "rules": [
                    { "lineStartsWith": ["{{bab}}"], "meta": { "type": "chapter" } },
                    { "template": "^{{numbered}}", "min": 2 }
                ]
            })
            .to_string(),
        )
        .unwrap();

        let segments = segment_pages(&book(), &options).unwrap();

        let spans: Vec<(i64, Option<i64>, Option<&str>)> = segments
            .iter()
            .map(|s| (s.from, s.to, s.kind()))
            .collect();
        assert_eq!(
            spans,
            vec![
                (1, None, None),
                (1, None, Some("chapter")),
                (2, None, None),
                (2, Some(3), None),
                (3, None, None),
            ]
        );
        assert_eq!(segments[3].content, "٢ - حديث ثان يمتد");

        let excerpts = map_pages_to_excerpts(&book(), &options, &ExcerptOptions::default()).unwrap();
        assert_eq!(excerpts.headings.len(), 1);
        assert_eq!(excerpts.headings[0].id, "C1");
        assert_eq!(excerpts.excerpts.len(), 4);
    }

    #[test]
    fn options_round_trip_through_json() {
        let wire = json!({
            "rules": [
                { "regex": "^\\d+", "split": "after", "occurrence": "last", "maxSpan": 1 },
                { "template": "{{bab}}", "split": "before", "occurrence": "all", "min": 3, "max": 9,
                  "meta": { "type": "chapter" } },
                { "lineEndsWith": ["{{tarqim}}"], "split": "after", "occurrence": "first" }
            ],
            "stripHtml": true
        });

        let options: SegmentationOptions = serde_json::from_value(wire.clone()).unwrap();
        assert_eq!(options.rules[0].pattern, RulePattern::Regex("^\\d+".to_string()));
        assert_eq!(options.rules[0].max_span, Some(1));
        assert_eq!(options.rules[1].min, Some(3));
        assert!(options.strip_html);

        assert_eq!(serde_json::to_value(&options).unwrap(), wire);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let options = SegmentationOptions::from_json(r#"{"rules": [{"regex": "x"}]}"#).unwrap();
        let rule = &options.rules[0];
        assert_eq!(rule.split, SplitPosition::Before);
        assert_eq!(rule.occurrence, Occurrence::All);
        assert!(!options.strip_html);

        let empty = SegmentationOptions::from_json("{}").unwrap();
        assert!(empty.rules.is_empty());
    }

    #[test]
    fn ambiguous_rules_are_rejected() {
        let result = SegmentationOptions::from_json(
            r#"{"rules": [{"regex": "x"}, {"regex": "x", "lineStartsWith": ["y"]}]}"#,
        );
        match result {
            Err(SegmenterError::InvalidRule { rule, reason }) => {
                assert_eq!(rule, 1);
                assert!(reason.contains("lineStartsWith, regex"));
            }
            other => panic!("expected InvalidRule, got {:?}", other),
        }

        assert!(SegmentationOptions::from_json(r#"{"rules": [{"split": "after"}]}"#).is_err());
        assert!(SegmentationOptions::from_json(r#"{"rules": [{"lineEndsWith": []}]}"#).is_err());
        assert!(
            SegmentationOptions::from_json(r#"{"rules": [{"regex": "x", "min": 5, "max": 2}]}"#)
                .is_err()
        );
        assert!(serde_json::from_str::<SegmentationOptions>(r#"{"rules": [{}]}"#).is_err());
    }

    #[test]
    fn custom_tokens_flow_through_segmenter() {
        let segmenter = Segmenter::new(TokenExpander::default().with_token("qala", "قال"));
        let options = SegmentationOptions::new(vec![SplitRule::line_starts_with(["{{qala}}"])]);
        let pages = vec![PageInput::new(1, "قال أ\nقال ب")];

        let segments = segmenter.segment(&pages, &options).unwrap();
        assert_eq!(segments.len(), 2);
        assert!(segment_pages(&pages, &options).is_err());
    }

    #[test]
    fn occurrence_last_yields_one_split_globally() {
        let pages: Vec<PageInput> = (1..=6)
            .map(|id| PageInput::new(id, "أ، ب، ج"))
            .collect();
        let rule = SplitRule::regex("،").with_occurrence(Occurrence::Last);
        let (_, report) =
            analyze_pages(&pages, &SegmentationOptions::new(vec![rule.clone()])).unwrap();
        assert_eq!(report.rules[0].raw_matches, 12);
        assert_eq!(report.split_points, 1);

        let grouped = SegmentationOptions::new(vec![rule.with_max_span(1)]);
        assert_eq!(analyze_pages(&pages, &grouped).unwrap().1.split_points, 6);
    }
}
