//! Configuration loading and validation
//!
//! The configuration is a TOML file (or JSON, when the file extension is
//! `.json`). Keys are accepted in snake_case as well as in camelCase:
//!
//! ```toml
//! html_path = "./public/index.html"
//! media_dir = "./public/medias"
//! media_src_selector = "img[src*='cdn.example.com'], video[src*='cdn.example.com']"
//! video_poster_selector = "video[poster*='cdn.example.com']"
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::error::ConfigError;
use crate::html_parser::compile_selector;

pub const DEFAULT_MEDIA_URL_PREFIX: &str = "./medias";

/// Validated, immutable configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// HTML file rewritten in place
    pub html_path: PathBuf,
    /// Directory receiving the downloaded media
    pub media_dir: PathBuf,
    /// Selector for elements carrying a `src` attribute
    pub media_src_selector: String,
    /// Selector for elements carrying a `poster` attribute
    pub video_poster_selector: Option<String>,
    /// Prefix written in front of each local filename, without trailing slash
    pub media_url_prefix: String,
    /// Base used to resolve relative and protocol-relative media URLs
    pub base_url: Option<Url>,
    pub user_agent: String,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(alias = "htmlPath")]
    html_path: PathBuf,
    #[serde(alias = "mediaDir")]
    media_dir: PathBuf,
    #[serde(alias = "mediaSrcSelector")]
    media_src_selector: String,
    #[serde(default, alias = "videoPosterSelector")]
    video_poster_selector: Option<String>,
    #[serde(default, alias = "mediaUrlPrefix")]
    media_url_prefix: Option<String>,
    #[serde(default, alias = "baseUrl")]
    base_url: Option<String>,
    #[serde(default, alias = "userAgent")]
    user_agent: Option<String>,
}

impl Config {
    /// Loads and validates a configuration file.
    ///
    /// Files ending in `.json` are parsed as JSON, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        raw.validate()
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_json::from_str(content)?;
        raw.validate()
    }
}

impl RawConfig {
    fn validate(self) -> Result<Config, ConfigError> {
        if self.html_path.as_os_str().is_empty() {
            return Err(ConfigError::Validation("html_path must not be empty".to_string()));
        }
        if self.media_dir.as_os_str().is_empty() {
            return Err(ConfigError::Validation("media_dir must not be empty".to_string()));
        }

        check_selector("media_src_selector", &self.media_src_selector)?;
        if let Some(selector) = &self.video_poster_selector {
            check_selector("video_poster_selector", selector)?;
        }

        let media_url_prefix = match self.media_url_prefix {
            Some(prefix) => {
                let trimmed = prefix.trim_end_matches('/');
                if trimmed.is_empty() {
                    return Err(ConfigError::Validation(
                        "media_url_prefix must not be empty".to_string(),
                    ));
                }
                trimmed.to_string()
            }
            None => DEFAULT_MEDIA_URL_PREFIX.to_string(),
        };

        let base_url = self
            .base_url
            .map(|raw| {
                Url::parse(&raw).map_err(|e| {
                    ConfigError::Validation(format!("base_url `{}` is not an absolute URL: {}", raw, e))
                })
            })
            .transpose()?;

        Ok(Config {
            html_path: self.html_path,
            media_dir: self.media_dir,
            media_src_selector: self.media_src_selector,
            video_poster_selector: self.video_poster_selector,
            media_url_prefix,
            base_url,
            user_agent: self.user_agent.unwrap_or_else(default_user_agent),
        })
    }
}

fn check_selector(field: &str, selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} must not be empty", field)));
    }
    compile_selector(selector)
        .map(|_| ())
        .map_err(|e| ConfigError::Validation(format!("{}: {}", field, e)))
}

fn default_user_agent() -> String {
    format!("media-localizer/{}", env!("CARGO_PKG_VERSION"))
}
