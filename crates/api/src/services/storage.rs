//! Upload storage on the local filesystem.
//!
//! Stored files are addressed by URL path (`/uploads/{name}`). Asset files may
//! also point at external `http(s)` URLs, which are never read locally.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;

/// URL prefix under which stored files are addressed.
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

/// Where a download's bytes live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileLocation {
    /// Stored locally under the upload directory.
    Local(String),
    /// Hosted elsewhere; clients are redirected.
    External(String),
}

impl FileLocation {
    /// Classify a file URL. Returns None for anything that is neither an
    /// upload path nor an absolute http(s) URL.
    pub fn classify(url: &str) -> Option<Self> {
        if url.starts_with("https://") || url.starts_with("http://") {
            return Some(FileLocation::External(url.to_string()));
        }
        let name = url.strip_prefix(UPLOAD_URL_PREFIX)?;
        safe_name(name).then(|| FileLocation::Local(name.to_string()))
    }
}

/// A single path segment with no traversal.
fn safe_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// File storage abstraction.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persist bytes under `name`, returning the URL to reference them by.
    async fn save(&self, name: &str, bytes: Vec<u8>) -> Result<String>;

    /// Read a stored file by name. Returns None if it doesn't exist.
    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;
}

/// FileStorage backed by a local directory.
pub struct LocalFileStorage {
    root: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        if !safe_name(name) {
            bail!("invalid file name: {:?}", name);
        }
        Ok(self.root.join(name))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn save(&self, name: &str, bytes: Vec<u8>) -> Result<String> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.root)
            .await
            .with_context(|| format!("Failed to create upload dir {}", self.root.display()))?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Stored upload");
        Ok(format!("{}{}", UPLOAD_URL_PREFIX, name))
    }

    async fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_local_and_external() {
        assert_eq!(
            FileLocation::classify("/uploads/abc.rbxm"),
            Some(FileLocation::Local("abc.rbxm".into()))
        );
        assert_eq!(
            FileLocation::classify("https://cdn.example.com/a.rbxm"),
            Some(FileLocation::External("https://cdn.example.com/a.rbxm".into()))
        );
    }

    #[test]
    fn classify_rejects_traversal_and_unknown_schemes() {
        assert_eq!(FileLocation::classify("/uploads/../secrets.env"), None);
        assert_eq!(FileLocation::classify("/uploads/a/b.rbxm"), None);
        assert_eq!(FileLocation::classify("/uploads/"), None);
        assert_eq!(FileLocation::classify("file:///etc/passwd"), None);
        assert_eq!(FileLocation::classify("/etc/passwd"), None);
    }

    #[tokio::test]
    async fn save_then_read() {
        let dir = std::env::temp_dir().join(format!("storefront-test-{}", uuid::Uuid::new_v4()));
        let storage = LocalFileStorage::new(&dir);

        let url = storage.save("door.rbxm", b"model".to_vec()).await.unwrap();
        let bytes = storage.read("door.rbxm").await.unwrap();

        assert_eq!(url, "/uploads/door.rbxm");
        assert_eq!(bytes.as_deref(), Some(&b"model"[..]));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn missing_file_reads_as_none() {
        let dir = std::env::temp_dir().join(format!("storefront-test-{}", uuid::Uuid::new_v4()));
        let storage = LocalFileStorage::new(&dir);

        assert_eq!(storage.read("gone.rbxm").await.unwrap(), None);
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let storage = LocalFileStorage::new(std::env::temp_dir());

        assert!(storage.read("../etc/passwd").await.is_err());
        assert!(storage.save("a/../../b", vec![]).await.is_err());
    }
}
