mod cli;

use anyhow::Context;
use clap::Parser;
use cli::{AnalyzeArgs, Cli, Commands, ExcerptsArgs, SegmentArgs, ValidateArgs};
use page_segmenter::{
    analyze_pages, map_pages_to_excerpts, segment_pages, segment_shamela_pages_to_excerpts,
    ContentFetcher, ExcerptOptions, OutputWriter, Result, RuleCompiler, SegmenterError,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose when set
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string().to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match &cli.command {
        Commands::Segment(args) => handle_segment_command(args, &cli.output).await,
        Commands::Excerpts(args) => handle_excerpts_command(args, &cli.output).await,
        Commands::Analyze(args) => handle_analyze_command(args).await,
        Commands::Validate(args) => handle_validate_command(args).await,
    };

    if let Err(e) = result {
        error!("Operation failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

fn check_output_directory(output_dir: &Path, force: bool) -> Result<()> {
    if output_dir.exists() && !force {
        let entries = std::fs::read_dir(output_dir).map_err(|e| SegmenterError::OutputDirectory {
            reason: format!("Cannot read output directory: {}", e),
        })?;

        if entries.count() > 0 {
            return Err(SegmenterError::OutputDirectory {
                reason: "Output directory is not empty. Use --force to overwrite.".to_string(),
            });
        }
    }
    Ok(())
}

async fn handle_segment_command(args: &SegmentArgs, output_dir: &Path) -> Result<()> {
    let sources = ContentFetcher::validate_sources(&args.sources)?;
    info!("Starting segmentation of {} sources", sources.len());

    check_output_directory(output_dir, args.force)?;

    let mut options = ContentFetcher::fetch_options(&args.options).await?;
    if args.strip_html {
        options.strip_html = true;
    }

    for (idx, source) in sources.iter().enumerate() {
        info!("Processing source {}/{}: {}", idx + 1, sources.len(), source);

        let (pages, metadata) = ContentFetcher::fetch_pages(source).await?;
        let segments = segment_pages(&pages, &options)?;
        let result =
            OutputWriter::write_segments(&segments, &metadata, output_dir, args.include_metadata)
                .await?;

        info!(
            "Created {} segments from {} pages of '{}':",
            result.total_segments, result.total_pages, result.source
        );
        info!("  - {}", result.output_file.display());
        if let Some(metadata_file) = &result.metadata_file {
            info!("  - {} (metadata)", metadata_file.display());
        }
    }

    info!("Segmentation completed successfully!");
    Ok(())
}

async fn handle_excerpts_command(args: &ExcerptsArgs, output_dir: &Path) -> Result<()> {
    let sources = ContentFetcher::validate_sources(&args.sources)?;
    check_output_directory(output_dir, args.force)?;

    let options = match &args.options {
        Some(options) => Some(ContentFetcher::fetch_options(options).await?),
        None => None,
    };
    let excerpt_options = ExcerptOptions {
        merge_min_length: args.merge_min_length,
    };

    for (pages, metadata) in ContentFetcher::fetch_multiple(&sources).await? {
        let excerpts = match &options {
            Some(options) => map_pages_to_excerpts(&pages, options, &excerpt_options)?,
            None => segment_shamela_pages_to_excerpts(&pages, &excerpt_options)?,
        };

        let output_file = OutputWriter::write_excerpts(&excerpts, &metadata, output_dir).await?;
        info!(
            "'{}': {} excerpts, {} headings -> {}",
            metadata.filename,
            excerpts.excerpts.len(),
            excerpts.headings.len(),
            output_file.display()
        );
    }

    Ok(())
}

async fn handle_analyze_command(args: &AnalyzeArgs) -> Result<()> {
    let sources = ContentFetcher::validate_sources(&args.sources)?;
    let options = ContentFetcher::fetch_options(&args.options).await?;

    let mut all_analyses = HashMap::new();

    for source in sources {
        info!("Analyzing: {}", source);

        let (pages, metadata) = ContentFetcher::fetch_pages(&source).await?;
        let (segments, report) = analyze_pages(&pages, &options)?;

        println!("\n=== Analysis for '{}' ===", metadata.filename);
        println!("Source type: {:?}", metadata.source_type);
        println!("Total pages: {}", metadata.total_pages);
        if let (Some(first), Some(last)) = (metadata.first_page, metadata.last_page) {
            println!("Page ids: {}-{}", first, last);
        }
        for rule in &report.rules {
            println!(
                "  Rule {}: {} matches, {} split points",
                rule.rule, rule.raw_matches, rule.split_points
            );
        }
        println!("Split points after dedup: {}", report.split_points);
        println!(
            "Segments: {} ({} span pages)",
            report.segments, report.cross_page_segments
        );

        let segments = if args.detailed {
            println!("\nSegment Details:");
            for (idx, segment) in segments.iter().enumerate() {
                let span = match segment.to {
                    Some(to) => format!("{}-{}", segment.from, to),
                    None => segment.from.to_string(),
                };
                let preview: String = segment.content.chars().take(40).collect();
                println!("  Segment {}: pages {} | {}", idx + 1, span, preview);
            }
            Some(segments)
        } else {
            None
        };

        all_analyses.insert(
            source.clone(),
            serde_json::json!({
                "document": metadata,
                "report": report,
                "segments": segments,
            }),
        );
    }

    if let Some(json_path) = &args.json_output {
        let json_content = serde_json::to_string_pretty(&all_analyses)
            .context("Failed to serialize analysis results")?;

        tokio::fs::write(json_path, json_content)
            .await
            .context("Failed to write JSON analysis file")?;

        info!("Analysis results written to: {}", json_path.display());
    }

    Ok(())
}

async fn handle_validate_command(args: &ValidateArgs) -> Result<()> {
    let options = ContentFetcher::fetch_options(&args.options).await?;
    let compiler = RuleCompiler::default();

    let mut unknown_total = 0;
    for (index, rule) in options.rules.iter().enumerate() {
        unknown_total += compiler.unknown_tokens(rule).len();
        let regex = compiler.compile(index, rule)?;
        println!("  Rule {}: /{}/", index, regex.as_str());
    }

    println!("\n=== Validation Summary ===");
    println!("Rules: {}", options.rules.len());
    println!("Strip HTML: {}", options.strip_html);
    if unknown_total > 0 {
        println!("Unknown tokens: {}", unknown_total);
    }

    println!("All rules compile!");
    Ok(())
}
