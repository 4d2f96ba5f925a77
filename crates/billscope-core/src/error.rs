use thiserror::Error;

/// Errors raised outside the extraction stages: artifact encoding and
/// configuration loading. Extraction itself degrades instead of failing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config file not readable: {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),
}
