use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = LocalizerError> = std::result::Result<T, E>;

/// Errors raised while locating, downloading and rewriting media.
#[derive(Debug, Error)]
pub enum LocalizerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid selector `{selector}`: {message}")]
    Selector { selector: String, message: String },

    #[error("Element #{index} matched by `{selector}` has no `{attribute}` attribute")]
    MissingAttribute {
        selector: String,
        attribute: &'static str,
        index: usize,
    },

    #[error("Invalid media URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },

    #[error("Unsupported URL scheme for `{url}` (expected http or https)")]
    UnsupportedScheme { url: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Download of {url} failed: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Media URL(s) not found in the HTML source after download: {}", .urls.join(", "))]
    Unrewritten { urls: Vec<String> },

    #[error("Invalid replacement pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl LocalizerError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| LocalizerError::Io { path, source }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
