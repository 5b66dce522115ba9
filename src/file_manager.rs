use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::error::{LocalizerError, Result};

/// Owns the directory that downloaded media is written to.
#[derive(Clone, Debug)]
pub struct FileManager {
    base_dir: PathBuf,
}

impl FileManager {
    /// Creates `base_dir` and any missing parents.
    pub fn new(base_dir: &Path) -> Result<Self> {
        let base_dir = base_dir.to_path_buf();
        fs::create_dir_all(&base_dir).map_err(LocalizerError::io(&base_dir))?;

        Ok(Self { base_dir })
    }

    pub fn destination(&self, filename: &str) -> PathBuf {
        self.base_dir.join(filename)
    }
}

/// A file being downloaded. Unless [`PartialFile::commit`] succeeds the file
/// is removed when the value is dropped, including when the owning future is
/// cancelled.
#[derive(Debug)]
pub struct PartialFile {
    path: PathBuf,
    file: Option<tokio::fs::File>,
    committed: bool,
}

impl PartialFile {
    /// Creates the file before returning, so there is no await point at
    /// which the file exists without a guard owning it.
    pub fn create(path: &Path) -> Result<Self> {
        let file = fs::File::create(path).map_err(LocalizerError::io(path))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Some(tokio::fs::File::from_std(file)),
            committed: false,
        })
    }

    pub async fn write_all(&mut self, buf: &[u8]) -> Result<()> {
        let path = &self.path;
        match self.file.as_mut() {
            Some(file) => file.write_all(buf).await.map_err(LocalizerError::io(path)),
            None => Ok(()),
        }
    }

    /// Flushes the file and keeps it on disk.
    pub async fn commit(mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await.map_err(LocalizerError::io(&self.path))?;
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for PartialFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        drop(self.file.take());
        match fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "removed partial download"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "could not remove partial download"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_creates_nested_media_dir() {
        let temp_dir = tempdir().unwrap();
        let media_dir = temp_dir.path().join("public").join("medias");

        let manager = FileManager::new(&media_dir).unwrap();
        assert!(media_dir.is_dir());
        assert_eq!(manager.destination("media_0.png"), media_dir.join("media_0.png"));
    }

    #[test]
    fn test_existing_media_dir_is_fine() {
        let temp_dir = tempdir().unwrap();
        FileManager::new(temp_dir.path()).unwrap();
        FileManager::new(temp_dir.path()).unwrap();
    }

    #[tokio::test]
    async fn test_committed_file_is_kept() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("media_0.png");

        let mut file = PartialFile::create(&path).unwrap();
        file.write_all(b"png bytes").await.unwrap();
        file.commit().await.unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"png bytes");
    }

    #[tokio::test]
    async fn test_uncommitted_file_is_removed_on_drop() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("media_1.mp4");

        let mut file = PartialFile::create(&path).unwrap();
        file.write_all(b"half a vid").await.unwrap();
        assert!(path.exists());
        drop(file);

        assert!(!path.exists());
    }
}
