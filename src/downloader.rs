use futures::future::try_join_all;
use futures::StreamExt;
use reqwest::{Client, ClientBuilder};
use std::path::Path;
use tracing::debug;
use url::Url;

use crate::error::{LocalizerError, Result};
use crate::file_manager::{FileManager, PartialFile};
use crate::html_parser::MediaReference;
use crate::progress::{ProgressEvent, ProgressSender};

/// Streams remote media to disk.
#[derive(Clone)]
pub struct MediaDownloader {
    client: Client,
}

impl MediaDownloader {
    pub fn new(user_agent: &str) -> Result<Self> {
        let client = Self::build_http_client(user_agent).map_err(LocalizerError::Client)?;

        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    fn build_http_client(user_agent: &str) -> reqwest::Result<Client> {
        // No request timeout: a download runs until it completes or fails
        ClientBuilder::new()
            .use_rustls_tls()
            .user_agent(user_agent)
            .build()
    }

    /// Downloads `url` into `dest`, returning the number of bytes written.
    ///
    /// On any failure the partially written file is removed before the error
    /// is returned.
    pub async fn download(&self, id: usize, url: &Url, dest: &Path, progress: &ProgressSender) -> Result<u64> {
        let http_error = |source| LocalizerError::Http {
            url: url.to_string(),
            source,
        };

        let mut file = PartialFile::create(dest)?;

        debug!(%url, dest = %dest.display(), "starting download");
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(http_error)?;

        let _ = progress.send(ProgressEvent::Started {
            id,
            total: response.content_length(),
        });

        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(http_error)?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
            let _ = progress.send(ProgressEvent::Advanced {
                id,
                bytes: chunk.len() as u64,
            });
        }

        file.commit().await?;
        let _ = progress.send(ProgressEvent::Finished { id });
        debug!(%url, bytes = written, "download complete");

        Ok(written)
    }

    /// Downloads every reference concurrently. The first failure is returned
    /// immediately and the remaining downloads are dropped, which removes
    /// their partial files.
    pub async fn download_all(
        &self,
        references: &[MediaReference],
        files: &FileManager,
        progress: ProgressSender,
    ) -> Result<u64> {
        let downloads = references.iter().enumerate().map(|(id, reference)| {
            let dest = files.destination(&reference.local_filename);
            let progress = progress.clone();
            async move {
                self.download(id, &reference.download_url, &dest, &progress)
                    .await
            }
        });

        let sizes = try_join_all(downloads).await?;
        Ok(sizes.into_iter().sum())
    }
}
