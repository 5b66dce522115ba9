use anyhow::{Context, Result};
use colored::*;
use futures::future::try_join_all;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::config::Config;
use crate::downloader::MediaDownloader;
use crate::error::LocalizerError;
use crate::file_manager::FileManager;
use crate::html_parser::{MediaLocator, MediaReference};
use crate::progress::ProgressReporter;
use crate::rewriter::{Pattern, Rewriter};

/// Totals of one completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub located: usize,
    pub downloaded: usize,
    pub bytes: u64,
    pub replacements: usize,
}

/// Moves the media referenced by one HTML page off its CDN.
///
/// The run is locate → create media dir → download everything → rewrite
/// everything. Rewriting only starts once every download has succeeded, so a
/// failed batch leaves the HTML untouched.
pub struct MediaMigrator {
    config: Config,
    downloader: MediaDownloader,
    rewriter: Rewriter,
}

impl MediaMigrator {
    pub fn new(config: Config) -> Result<Self> {
        let downloader = MediaDownloader::new(&config.user_agent)?;

        Ok(Self {
            config,
            downloader,
            rewriter: Rewriter::new(),
        })
    }

    pub async fn run(&self) -> Result<MigrationReport> {
        let html_path = &self.config.html_path;
        println!("🚀 Localizing media referenced by: {}", html_path.display().to_string().blue());
        println!("📁 Media directory: {:?}", self.config.media_dir);

        let html_content = tokio::fs::read_to_string(html_path)
            .await
            .with_context(|| format!("Failed to read HTML file: {:?}", html_path))?;

        let references = self.locate(&html_content)?;
        info!(count = references.len(), "located media references");

        let files = FileManager::new(&self.config.media_dir)
            .with_context(|| format!("Failed to create media directory: {:?}", self.config.media_dir))?;

        println!("📥 Downloading {} file(s)", references.len());
        let (progress, reporter) = ProgressReporter::spawn(references.len());
        let downloaded = self.downloader.download_all(&references, &files, progress).await;
        let totals = reporter.finish().await;
        let bytes = downloaded.context("Download failed, HTML file left unchanged")?;
        info!(files = totals.finished(), bytes, "downloads complete");

        let replacements = self.rewrite_all(&references).await?;
        info!(replacements, "rewrite complete");

        println!(
            "✅ Replaced {} occurrence(s) of {} media URL(s)",
            replacements,
            references.len()
        );

        Ok(MigrationReport {
            located: references.len(),
            downloaded: references.len(),
            bytes,
            replacements,
        })
    }

    fn locate(&self, html_content: &str) -> Result<Vec<MediaReference>> {
        let locator = MediaLocator::new(
            &self.config.media_src_selector,
            self.config.video_poster_selector.as_deref(),
            self.config.base_url.clone(),
        )?;

        let references = locator
            .locate(html_content)
            .with_context(|| format!("Failed to locate media in {:?}", self.config.html_path))?;
        Ok(references)
    }

    /// Rewrites every reference and fails if some URL was downloaded but
    /// never found in the HTML source.
    async fn rewrite_all(&self, references: &[MediaReference]) -> Result<usize> {
        let html_path = &self.config.html_path;
        let prefix = &self.config.media_url_prefix;

        let rewrites = references.iter().map(|reference| {
            let pattern = Pattern::any_of(reference.source_forms());
            let local_path = reference.local_path(prefix);
            async move {
                self.rewriter
                    .replace_in_file(html_path, &pattern, &local_path)
                    .await
            }
        });

        let outcomes = try_join_all(rewrites)
            .await
            .with_context(|| format!("Failed to rewrite {:?}", html_path))?;

        // Repeated URLs share their replacements: whichever rewrite ran first
        // took every occurrence.
        let mut per_url: HashMap<&str, usize> = HashMap::new();
        for (reference, outcome) in references.iter().zip(&outcomes) {
            *per_url.entry(reference.original_url.as_str()).or_default() += outcome.replacements;
        }

        let mut missed: Vec<String> = Vec::new();
        for reference in references {
            let url = reference.original_url.as_str();
            if per_url.get(url) == Some(&0) && !missed.iter().any(|m| m == url) {
                warn!(url, file = %reference.local_filename, "downloaded media URL not found in HTML source");
                missed.push(url.to_string());
            }
        }
        if !missed.is_empty() {
            return Err(LocalizerError::Unrewritten { urls: missed })
                .with_context(|| format!("Failed to rewrite {:?}", html_path));
        }

        Ok(outcomes.iter().map(|outcome| outcome.replacements).sum())
    }
}
