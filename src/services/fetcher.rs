use crate::error::{Result, SegmenterError};
use crate::types::{DocumentMetadata, PageDocument, PageInput, SegmentationOptions, SourceType};
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, warn};
use url::Url;
use walkdir::WalkDir;

pub struct ContentFetcher;

impl ContentFetcher {
    /// Raw text of a source, with its display name and kind.
    pub async fn fetch_content(source: &str) -> Result<(String, String, SourceType)> {
        if Self::is_url(source) {
            Self::fetch_from_url(source).await
        } else {
            Self::fetch_from_file(source).await
        }
    }

    /// Loads a page document (a bare array of pages or `{ "pages": [...] }`).
    pub async fn fetch_pages(source: &str) -> Result<(Vec<PageInput>, DocumentMetadata)> {
        let (content, filename, source_type) = Self::fetch_content(source).await?;
        let pages = Self::parse_pages(&content)?;

        let metadata = DocumentMetadata {
            filename,
            source_type,
            created_at: chrono::Utc::now().to_rfc3339(),
            total_pages: pages.len(),
            first_page: pages.first().map(|p| p.id),
            last_page: pages.last().map(|p| p.id),
        };

        info!("Loaded {} pages from {}", pages.len(), source);
        Ok((pages, metadata))
    }

    pub fn parse_pages(content: &str) -> Result<Vec<PageInput>> {
        let document: PageDocument = serde_json::from_str(content)?;
        Ok(document.into_pages())
    }

    /// Loads and validates segmentation options JSON.
    pub async fn fetch_options(source: &str) -> Result<SegmentationOptions> {
        let (content, _, _) = Self::fetch_content(source).await?;
        let options = SegmentationOptions::from_json(&content)?;
        debug!("Loaded {} rules from {}", options.rules.len(), source);
        Ok(options)
    }

    pub async fn fetch_multiple(
        sources: &[String],
    ) -> Result<Vec<(Vec<PageInput>, DocumentMetadata)>> {
        let mut results = Vec::new();

        for source in sources {
            match Self::fetch_pages(source).await {
                Ok(document) => results.push(document),
                Err(e) => {
                    warn!("Failed to fetch pages from {}: {}", source, e);
                    return Err(e);
                }
            }
        }

        Ok(results)
    }

    async fn fetch_from_url(url: &str) -> Result<(String, String, SourceType)> {
        info!("Fetching content from URL: {}", url);

        let parsed_url = Url::parse(url)?;
        let client = reqwest::Client::new();
        let response = client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(SegmenterError::HttpStatus {
                status: response.status().as_u16(),
            });
        }

        let content = response.text().await?;
        let filename = Self::extract_filename_from_url(&parsed_url);

        Ok((content, filename, SourceType::Url))
    }

    async fn fetch_from_file(file_path: &str) -> Result<(String, String, SourceType)> {
        debug!("Reading file: {}", file_path);

        let path = Path::new(file_path);

        if !path.exists() {
            return Err(SegmenterError::FileNotFound {
                path: file_path.to_string(),
            });
        }

        let content = fs::read_to_string(path).await?;
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok((content, filename, SourceType::LocalFile))
    }

    fn is_url(source: &str) -> bool {
        source.starts_with("http://") || source.starts_with("https://")
    }

    fn extract_filename_from_url(url: &Url) -> String {
        url.path_segments()
            .and_then(|segments| segments.last())
            .and_then(|name| if name.is_empty() { None } else { Some(name) })
            .unwrap_or("downloaded.json")
            .to_string()
    }

    /// Checks every source and expands directories into the `*.json` files below them.
    pub fn validate_sources(sources: &[String]) -> Result<Vec<String>> {
        let mut validated = Vec::new();

        for source in sources {
            if Self::is_url(source) {
                Url::parse(source)?;
                validated.push(source.clone());
                continue;
            }

            let path = Path::new(source);
            if path.is_file() {
                validated.push(source.clone());
            } else if path.is_dir() {
                let before = validated.len();
                for entry in WalkDir::new(path).sort_by_file_name() {
                    let entry = entry.map_err(|e| SegmenterError::Io(e.into()))?;
                    let is_json = entry.path().extension().and_then(|e| e.to_str()) == Some("json");
                    if entry.file_type().is_file() && is_json {
                        validated.push(entry.path().to_string_lossy().into_owned());
                    }
                }
                debug!(
                    "Directory {} contributed {} sources",
                    source,
                    validated.len() - before
                );
            } else {
                return Err(SegmenterError::FileNotFound {
                    path: source.clone(),
                });
            }
        }

        Ok(validated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_wrapped_page_documents() {
        let bare = ContentFetcher::parse_pages(r#"[{"id": 1, "content": "أ"}]"#).unwrap();
        assert_eq!(bare, vec![PageInput::new(1, "أ")]);

        let wrapped =
            ContentFetcher::parse_pages(r#"{"pages": [{"id": 2, "content": "ب"}]}"#).unwrap();
        assert_eq!(wrapped, vec![PageInput::new(2, "ب")]);

        assert!(ContentFetcher::parse_pages(r#"{"id": 1}"#).is_err());
    }

    #[test]
    fn directories_expand_to_json_files() {
        let dir = std::env::temp_dir().join(format!("pseg-sources-{}", std::process::id()));
        std::fs::create_dir_all(dir.join("nested")).unwrap();
        std::fs::write(dir.join("a.json"), "[]").unwrap();
        std::fs::write(dir.join("nested/b.json"), "[]").unwrap();
        std::fs::write(dir.join("notes.txt"), "").unwrap();

        let sources =
            ContentFetcher::validate_sources(&[dir.to_string_lossy().into_owned()]).unwrap();
        assert_eq!(sources.len(), 2);
        assert!(sources.iter().all(|s| s.ends_with(".json")));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_files_are_rejected() {
        let result = ContentFetcher::validate_sources(&["/no/such/pages.json".to_string()]);
        assert!(matches!(result, Err(SegmenterError::FileNotFound { .. })));
    }

    #[tokio::test]
    async fn options_load_from_file() {
        let path = std::env::temp_dir().join(format!("pseg-options-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"rules": [{"lineStartsWith": ["{{bab}}"]}]}"#).unwrap();

        let options = ContentFetcher::fetch_options(&path.to_string_lossy())
            .await
            .unwrap();
        assert_eq!(options.rules.len(), 1);
        assert!(!options.strip_html);

        std::fs::remove_file(&path).unwrap();
    }
}
