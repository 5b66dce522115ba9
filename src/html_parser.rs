use scraper::{Html, Selector};
use std::path::Path;
use url::Url;

use crate::error::{LocalizerError, Result};

/// Which attribute a selector group reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// `src` of images and videos
    Source,
    /// `poster` of videos
    Poster,
}

impl MediaKind {
    pub fn attribute(self) -> &'static str {
        match self {
            MediaKind::Source => "src",
            MediaKind::Poster => "poster",
        }
    }

    pub fn file_stem(self) -> &'static str {
        match self {
            MediaKind::Source => "media",
            MediaKind::Poster => "poster",
        }
    }
}

/// One remote URL found in the document and the local file it maps to.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaReference {
    pub kind: MediaKind,
    /// Position within the matches of its own selector group
    pub index: usize,
    /// Attribute value exactly as written in the document
    pub original_url: String,
    pub download_url: Url,
    pub local_filename: String,
}

impl MediaReference {
    /// Path written into the HTML in place of `original_url`.
    pub fn local_path(&self, prefix: &str) -> String {
        format!("{}/{}", prefix, self.local_filename)
    }

    /// Spellings of `original_url` that may appear in the HTML source. The
    /// attribute value is entity-decoded, so `&` is also searched as `&amp;`.
    pub fn source_forms(&self) -> Vec<String> {
        let mut forms = vec![self.original_url.clone()];
        if self.original_url.contains('&') {
            forms.push(self.original_url.replace('&', "&amp;"));
        }
        forms
    }
}

#[derive(Debug, Clone)]
struct SelectorGroup {
    kind: MediaKind,
    source: String,
    selector: Selector,
}

/// Finds media references in an HTML document.
#[derive(Debug, Clone)]
pub struct MediaLocator {
    groups: Vec<SelectorGroup>,
    base_url: Option<Url>,
}

impl MediaLocator {
    pub fn new(src_selector: &str, poster_selector: Option<&str>, base_url: Option<Url>) -> Result<Self> {
        let mut groups = vec![SelectorGroup {
            kind: MediaKind::Source,
            source: src_selector.to_string(),
            selector: compile_selector(src_selector)?,
        }];

        if let Some(poster) = poster_selector {
            groups.push(SelectorGroup {
                kind: MediaKind::Poster,
                source: poster.to_string(),
                selector: compile_selector(poster)?,
            });
        }

        Ok(Self { groups, base_url })
    }

    /// Returns every `src` reference in document order, followed by every
    /// `poster` reference in document order.
    pub fn locate(&self, html_content: &str) -> Result<Vec<MediaReference>> {
        let document = Html::parse_document(html_content);
        let mut references = Vec::new();

        for group in &self.groups {
            let attribute = group.kind.attribute();

            for (index, element) in document.select(&group.selector).enumerate() {
                let original_url = element
                    .value()
                    .attr(attribute)
                    .map(str::trim)
                    .filter(|value| !value.is_empty())
                    .ok_or_else(|| LocalizerError::MissingAttribute {
                        selector: group.source.clone(),
                        attribute,
                        index,
                    })?;

                let download_url = self.resolve_url(original_url)?;
                let local_filename = local_filename(group.kind, index, &download_url);

                references.push(MediaReference {
                    kind: group.kind,
                    index,
                    original_url: original_url.to_string(),
                    download_url,
                    local_filename,
                });
            }
        }

        Ok(references)
    }

    fn resolve_url(&self, url: &str) -> Result<Url> {
        let invalid = |source| LocalizerError::InvalidUrl {
            url: url.to_string(),
            source,
        };

        let resolved = if url.starts_with("http://") || url.starts_with("https://") {
            Url::parse(url).map_err(invalid)?
        } else if url.starts_with("//") {
            // Protocol-relative URL
            let scheme = self.base_url.as_ref().map(Url::scheme).unwrap_or("https");
            Url::parse(&format!("{}:{}", scheme, url)).map_err(invalid)?
        } else {
            match &self.base_url {
                Some(base) => base.join(url).map_err(invalid)?,
                None => Url::parse(url).map_err(invalid)?,
            }
        };

        match resolved.scheme() {
            "http" | "https" => Ok(resolved),
            _ => Err(LocalizerError::UnsupportedScheme {
                url: url.to_string(),
            }),
        }
    }
}

pub fn compile_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| LocalizerError::Selector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// `media_<index><ext>` or `poster_<index><ext>`, where `<ext>` is the
/// extension of the last path segment including the dot.
pub fn local_filename(kind: MediaKind, index: usize, url: &Url) -> String {
    format!("{}_{}{}", kind.file_stem(), index, url_extension(url))
}

fn url_extension(url: &Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .and_then(|segment| Path::new(segment).extension())
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}
