use crate::error::{Result, SegmenterError};
use crate::types::{DocumentMetadata, Excerpts, Segment, SegmentationResult};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

pub struct OutputWriter;

impl OutputWriter {
    pub async fn write_segments(
        segments: &[Segment],
        metadata: &DocumentMetadata,
        output_dir: &Path,
        include_metadata: bool,
    ) -> Result<SegmentationResult> {
        Self::ensure_output_directory(output_dir).await?;

        let output_file = Self::output_filename(output_dir, &metadata.filename, "segments");
        Self::write_json(&output_file, segments).await?;
        debug!("Wrote {} segments to {}", segments.len(), output_file.display());

        let metadata_file = if include_metadata {
            let metadata_path = Self::output_filename(output_dir, &metadata.filename, "metadata");
            Self::write_metadata_file(&metadata_path, metadata, segments, &output_file).await?;
            Some(metadata_path)
        } else {
            None
        };

        Ok(SegmentationResult {
            source: metadata.filename.clone(),
            total_pages: metadata.total_pages,
            total_segments: segments.len(),
            output_file,
            metadata_file,
        })
    }

    pub async fn write_excerpts(
        excerpts: &Excerpts,
        metadata: &DocumentMetadata,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        Self::ensure_output_directory(output_dir).await?;

        let output_file = Self::output_filename(output_dir, &metadata.filename, "excerpts");
        Self::write_json(&output_file, excerpts).await?;
        Ok(output_file)
    }

    pub async fn ensure_output_directory(output_dir: &Path) -> Result<()> {
        if !output_dir.exists() {
            fs::create_dir_all(output_dir).await.map_err(|e| {
                SegmenterError::OutputDirectory {
                    reason: format!("Failed to create output directory: {}", e),
                }
            })?;
            info!("Created output directory: {}", output_dir.display());
        }
        Ok(())
    }

    /// `<dir>/<source stem>_<kind>.json`
    pub fn output_filename(output_dir: &Path, source_name: &str, kind: &str) -> PathBuf {
        let base_name = Path::new(source_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");

        output_dir.join(format!("{}_{}.json", base_name, kind))
    }

    async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        let json_content = serde_json::to_string_pretty(value)?;

        fs::write(path, json_content).await.map_err(|e| {
            SegmenterError::OutputDirectory {
                reason: format!("Failed to write {}: {}", path.display(), e),
            }
        })
    }

    async fn write_metadata_file(
        metadata_path: &Path,
        metadata: &DocumentMetadata,
        segments: &[Segment],
        output_file: &Path,
    ) -> Result<()> {
        let report = serde_json::json!({
            "source": metadata.filename,
            "document_metadata": metadata,
            "total_segments": segments.len(),
            "cross_page_segments": segments.iter().filter(|s| s.to.is_some()).count(),
            "segments_file": output_file.file_name().and_then(|n| n.to_str()),
            "generated_at": chrono::Utc::now().to_rfc3339(),
        });

        Self::write_json(metadata_path, &report).await?;
        info!("Generated metadata file: {}", metadata_path.display());
        Ok(())
    }
}
