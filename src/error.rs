use thiserror::Error;

#[derive(Error, Debug)]
pub enum SegmenterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid pattern in rule {rule} ({pattern}): {source}")]
    InvalidPattern {
        rule: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid rule {rule}: {reason}")]
    InvalidRule { rule: usize, reason: String },

    #[error("Output directory error: {reason}")]
    OutputDirectory { reason: String },

    #[error("HTTP status error: {status}")]
    HttpStatus { status: u16 },

    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, SegmenterError>;
