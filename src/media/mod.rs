// ============================================================================
// Attachment Storage
// ============================================================================
//
// Objects are plain files under MEDIA_DATA_DIR, named by the pipeline
// (see utils::generate_object_name). Presentation URLs point at
// GET /media/{object} and are signed, so they stop working after the TTL.
//
// ============================================================================

pub mod signing;

pub use signing::{MediaError, UrlSigner};

use anyhow::{Context, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::pipeline::AttachmentStore;
use crate::utils::is_valid_object_name;

/// Attachment store on the local filesystem
#[derive(Clone)]
pub struct DiskAttachmentStore {
    data_dir: PathBuf,
    signer: UrlSigner,
}

impl DiskAttachmentStore {
    /// Create the store, making sure the data directory exists
    pub async fn new(data_dir: impl Into<PathBuf>, signer: UrlSigner) -> Result<Self> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir)
            .await
            .with_context(|| format!("Failed to create media directory {}", data_dir.display()))?;
        info!(data_dir = %data_dir.display(), "Attachment store ready");
        Ok(Self { data_dir, signer })
    }

    pub fn signer(&self) -> &UrlSigner {
        &self.signer
    }

    fn object_path(&self, object_name: &str) -> Result<PathBuf, MediaError> {
        if !is_valid_object_name(object_name) {
            return Err(MediaError::InvalidObjectName);
        }
        Ok(self.data_dir.join(object_name))
    }

    /// Read an object back
    pub async fn read(&self, object_name: &str) -> Result<Bytes, MediaError> {
        let path = self.object_path(object_name)?;
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) => {
                debug!(error = %e, object = %object_name, "Attachment object not readable");
                Err(MediaError::NotFound)
            }
        }
    }
}

async fn write_then_rename(tmp_path: &Path, path: &Path, data: &[u8]) -> Result<()> {
    let mut file = fs::File::create(tmp_path)
        .await
        .context("Failed to create attachment file")?;
    file.write_all(data)
        .await
        .context("Failed to write attachment file")?;
    file.sync_all().await.context("Failed to sync attachment file")?;
    drop(file);

    fs::rename(tmp_path, path)
        .await
        .context("Failed to move attachment into place")?;
    Ok(())
}

#[async_trait::async_trait]
impl AttachmentStore for DiskAttachmentStore {
    async fn upload(&self, object_name: &str, content_type: &str, data: Bytes) -> Result<()> {
        let path = self
            .object_path(object_name)
            .map_err(|e| anyhow::anyhow!("{}: {}", e, object_name))?;

        // Write to a temp file first so readers never see a partial object
        let tmp_path = self.data_dir.join(format!(".{}.part", object_name));
        if let Err(e) = write_then_rename(&tmp_path, &path, &data).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    warn!(error = %cleanup, path = %tmp_path.display(), "Failed to remove partial attachment");
                }
            }
            return Err(e);
        }

        debug!(
            object = %object_name,
            content_type = %content_type,
            size_bytes = data.len(),
            "Attachment stored"
        );
        Ok(())
    }

    fn presigned_url(&self, object_name: &str, expires_at: DateTime<Utc>) -> String {
        self.signer.url_for(object_name, expires_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(dir: &tempfile::TempDir) -> DiskAttachmentStore {
        DiskAttachmentStore::new(
            dir.path(),
            UrlSigner::new("0123456789abcdef0123456789abcdef", "http://localhost:8080"),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        store
            .upload("1-abc-cat.png", "image/png", Bytes::from_static(b"meow"))
            .await
            .unwrap();

        assert_eq!(store.read("1-abc-cat.png").await.unwrap(), Bytes::from_static(b"meow"));
        // no temp file left behind
        assert!(!dir.path().join(".1-abc-cat.png.part").exists());
    }

    #[tokio::test]
    async fn test_failed_upload_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        // a non-empty directory in the way makes the final rename fail
        std::fs::create_dir(dir.path().join("1-abc-cat.png")).unwrap();
        std::fs::write(dir.path().join("1-abc-cat.png").join("keep"), b"x").unwrap();

        let result = store
            .upload("1-abc-cat.png", "image/png", Bytes::from_static(b"meow"))
            .await;

        assert!(result.is_err());
        assert!(!dir.path().join(".1-abc-cat.png.part").exists());
    }

    #[tokio::test]
    async fn test_dotted_filename_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        for filename in ["archive..tar.gz", "notes...txt"] {
            let object_name = crate::utils::generate_object_name(filename);
            store
                .upload(&object_name, "application/octet-stream", Bytes::from_static(b"x"))
                .await
                .unwrap();
            assert_eq!(store.read(&object_name).await.unwrap(), Bytes::from_static(b"x"));
        }
    }

    #[tokio::test]
    async fn test_read_missing_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        assert_eq!(store.read("nope.png").await, Err(MediaError::NotFound));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;

        assert!(store
            .upload("../escape.txt", "text/plain", Bytes::from_static(b"x"))
            .await
            .is_err());
        assert_eq!(
            store.read("../escape.txt").await,
            Err(MediaError::InvalidObjectName)
        );
    }

    #[tokio::test]
    async fn test_presigned_url_uses_signer() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir).await;
        let expires_at = DateTime::from_timestamp(1_700_000_000, 0).unwrap();

        assert_eq!(
            store.presigned_url("1-abc-cat.png", expires_at),
            store.signer().url_for("1-abc-cat.png", expires_at)
        );
    }
}
