use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pseg")]
#[command(about = "Segment page-based Arabic/English corpora into chapters, entries and paragraphs")]
#[command(version = "0.1.0")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output directory for segment files
    #[arg(short, long, global = true, default_value = "./output")]
    pub output: PathBuf,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Segment page documents with a rule set
    Segment(SegmentArgs),

    /// Build excerpts and headings from page documents
    Excerpts(ExcerptsArgs),

    /// Report how each rule matches without writing segments
    Analyze(AnalyzeArgs),

    /// Load and compile a rule set
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct SegmentArgs {
    /// Page documents (JSON files, directories or URLs)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Segmentation options JSON (file path or URL)
    #[arg(long, value_name = "OPTIONS")]
    pub options: String,

    /// Strip HTML tags before matching, overriding the options file
    #[arg(long)]
    pub strip_html: bool,

    /// Write a metadata report next to the segments (`--include-metadata false` to skip)
    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    pub include_metadata: bool,

    /// Force overwrite existing output files
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ExcerptsArgs {
    /// Page documents (JSON files, directories or URLs)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Segmentation options JSON (file path or URL)
    #[arg(long, value_name = "OPTIONS", required_unless_present = "shamela", conflicts_with = "shamela")]
    pub options: Option<String>,

    /// Use the built-in rules for Shamela HTML exports
    #[arg(long)]
    pub shamela: bool,

    /// Merge excerpts shorter than this many characters into the previous one
    #[arg(long, default_value = "0")]
    pub merge_min_length: usize,

    /// Force overwrite existing output files
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Page documents (JSON files, directories or URLs)
    #[arg(required = true, value_name = "SOURCE")]
    pub sources: Vec<String>,

    /// Segmentation options JSON (file path or URL)
    #[arg(long, value_name = "OPTIONS")]
    pub options: String,

    /// Output analysis to JSON file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Show every segment's page span
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Segmentation options JSON (file path or URL)
    #[arg(long, value_name = "OPTIONS")]
    pub options: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment_args(extra: &[&str]) -> SegmentArgs {
        let mut argv = vec!["pseg", "segment", "a.json", "--options", "o.json"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Segment(args) => args,
            _ => panic!("expected the segment command"),
        }
    }

    #[test]
    fn metadata_report_is_on_by_default() {
        assert!(segment_args(&[]).include_metadata);
    }

    #[test]
    fn metadata_report_can_be_switched_off() {
        assert!(!segment_args(&["--include-metadata=false"]).include_metadata);
        assert!(!segment_args(&["--include-metadata", "false"]).include_metadata);
        assert!(segment_args(&["--include-metadata", "true"]).include_metadata);
    }

    #[test]
    fn excerpts_needs_options_or_shamela() {
        let missing = Cli::try_parse_from(["pseg", "excerpts", "a.json"]);
        assert!(missing.is_err());

        let both = Cli::try_parse_from([
            "pseg", "excerpts", "a.json", "--shamela", "--options", "o.json",
        ]);
        assert!(both.is_err());

        assert!(Cli::try_parse_from(["pseg", "excerpts", "a.json", "--shamela"]).is_ok());
    }
}
