use std::path::PathBuf;

use async_trait::async_trait;
use tastebook_shared::id::new_object_id;
use tastebook_shared::{Error, Result};

#[derive(Debug, Clone)]
pub struct StoredMedia {
    pub url: String,
    pub public_id: String,
}

/// Opaque blob storage for recipe and profile images. Keyed by a public id
/// so replacement and deletion never need the original filename.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn store(&self, extension: &str, bytes: Vec<u8>) -> Result<StoredMedia>;
    async fn remove(&self, public_id: &str) -> Result<()>;
}

/// Local-disk media store. Files land under one flat directory named by
/// their public id.
pub struct DiskMediaStore {
    dir: PathBuf,
    base_url: String,
}

impl DiskMediaStore {
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into(),
        }
    }

    fn sanitize_extension(extension: &str) -> &str {
        let ext = extension.trim_start_matches('.');
        if ext.chars().all(|c| c.is_ascii_alphanumeric()) && !ext.is_empty() {
            ext
        } else {
            "bin"
        }
    }
}

#[async_trait]
impl MediaStore for DiskMediaStore {
    async fn store(&self, extension: &str, bytes: Vec<u8>) -> Result<StoredMedia> {
        let public_id = format!(
            "{}.{}",
            new_object_id(),
            Self::sanitize_extension(extension)
        );

        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|err| Error::Internal(format!("media dir unavailable: {err}")))?;
        tokio::fs::write(self.dir.join(&public_id), bytes)
            .await
            .map_err(|err| Error::Internal(format!("media write failed: {err}")))?;

        Ok(StoredMedia {
            url: format!("{}/{}", self.base_url, public_id),
            public_id,
        })
    }

    async fn remove(&self, public_id: &str) -> Result<()> {
        // The id is generated here, never caller-supplied paths.
        if public_id.contains('/') || public_id.contains("..") {
            return Err(Error::InvalidInput("Invalid media id".to_string()));
        }
        match tokio::fs::remove_file(self.dir.join(public_id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Error::Internal(format!("media delete failed: {err}"))),
        }
    }
}
