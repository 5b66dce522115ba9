//! In-place find/replace over text files
//!
//! Every call is a full load-modify-save cycle. Calls against the same path
//! are serialised through a per-path lock so that concurrent rewrites of one
//! file all land.

use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

use crate::error::{LocalizerError, Result};

/// What to search for.
#[derive(Debug, Clone)]
pub enum Pattern {
    /// Every literal occurrence
    Literal(String),
    /// Every literal occurrence of any of the alternatives, longest first
    AnyOf(Vec<String>),
    /// Every match; `$n` in the replacement expands capture groups
    Regex(Regex),
}

impl Pattern {
    pub fn literal(text: impl Into<String>) -> Self {
        Pattern::Literal(text.into())
    }

    pub fn any_of<I, S>(alternatives: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut alternatives: Vec<String> = alternatives
            .into_iter()
            .map(Into::into)
            .filter(|alternative| !alternative.is_empty())
            .collect();
        alternatives.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        alternatives.dedup();
        Pattern::AnyOf(alternatives)
    }

    pub fn regex(pattern: &str) -> Result<Self> {
        Ok(Pattern::Regex(Regex::new(pattern)?))
    }

    /// Returns the rewritten text and the number of replacements made.
    pub fn apply(&self, text: &str, replacement: &str) -> (String, usize) {
        match self {
            Pattern::Literal(needle) => {
                if needle.is_empty() {
                    return (text.to_string(), 0);
                }
                let count = text.matches(needle.as_str()).count();
                if count == 0 {
                    return (text.to_string(), 0);
                }
                (text.replace(needle.as_str(), replacement), count)
            }
            Pattern::AnyOf(alternatives) => {
                let mut text = text.to_string();
                let mut total = 0;
                for needle in alternatives {
                    let count = text.matches(needle.as_str()).count();
                    if count > 0 {
                        text = text.replace(needle.as_str(), replacement);
                        total += count;
                    }
                }
                (text, total)
            }
            Pattern::Regex(regex) => {
                let count = regex.find_iter(text).count();
                if count == 0 {
                    return (text.to_string(), 0);
                }
                (regex.replace_all(text, replacement).into_owned(), count)
            }
        }
    }
}

/// Outcome of one [`Rewriter::replace_in_file`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub file: PathBuf,
    pub replacements: usize,
    pub changed: bool,
}

#[derive(Clone, Default)]
pub struct Rewriter {
    locks: Arc<Mutex<HashMap<PathBuf, Arc<tokio::sync::Mutex<()>>>>>,
}

impl Rewriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, path: &Path) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(path.to_path_buf()).or_default().clone()
    }

    /// Replaces every occurrence of `pattern` in the file at `path` and
    /// writes the result back. Files with no match are left untouched.
    pub async fn replace_in_file(&self, path: &Path, pattern: &Pattern, replacement: &str) -> Result<Replacement> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().await;

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(LocalizerError::io(path))?;

        let (updated, replacements) = pattern.apply(&content, replacement);
        let changed = replacements > 0;
        if changed {
            tokio::fs::write(path, updated)
                .await
                .map_err(LocalizerError::io(path))?;
        }

        debug!(file = %path.display(), replacements, "rewrite complete");
        Ok(Replacement {
            file: path.to_path_buf(),
            replacements,
            changed,
        })
    }
}
