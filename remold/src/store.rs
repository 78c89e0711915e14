//! A blob directory laid out like an OCI image layout: `blobs/<alg>/<hex>`.
//!
//! The CLI uses it both to read config blobs and to receive the schema 1
//! empty layer placeholder during conversion.

use async_trait::async_trait;
use libremold::{BlobDestination, BlobInfo, BlobReader, BlobSource, Digest, Reference};
use libremold::{RemoldError, Result};
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;

#[derive(Debug, Clone)]
pub struct BlobDir {
    root: PathBuf,
    reference: Option<Reference>,
}

impl BlobDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            reference: None,
        }
    }

    /// Sets the reference reported to conversions writing into this directory.
    pub fn with_reference(mut self, reference: Option<Reference>) -> Self {
        self.reference = reference;
        self
    }

    pub fn blob_path(&self, digest: &Digest) -> PathBuf {
        self.root
            .join("blobs")
            .join(digest.algorithm())
            .join(digest.hex())
    }
}

#[async_trait]
impl BlobSource for BlobDir {
    async fn get_blob(&self, digest: &Digest) -> Result<(BlobReader, i64)> {
        let path = self.blob_path(digest);
        debug!(path = %path.display(), "opening blob");
        let file = tokio::fs::File::open(&path).await.map_err(|e| {
            let message = match e.kind() {
                ErrorKind::NotFound => format!("blob {} not found in {}", digest, self.root.display()),
                _ => format!("opening blob {}", digest),
            };
            RemoldError::retrieval_with_source(message, e)
        })?;
        let size = match file.metadata().await {
            Ok(metadata) => i64::try_from(metadata.len()).unwrap_or(-1),
            Err(_) => -1,
        };
        Ok((Box::new(file), size))
    }
}

#[async_trait]
impl BlobDestination for BlobDir {
    fn reference(&self) -> Option<Reference> {
        self.reference.clone()
    }

    async fn has_blob(&self, digest: &Digest) -> Result<bool> {
        tokio::fs::try_exists(self.blob_path(digest))
            .await
            .map_err(|e| RemoldError::commit_with_source(format!("checking blob {}", digest), e))
    }

    async fn put_blob(&self, content: &[u8], info: &BlobInfo) -> Result<BlobInfo> {
        info.digest.verify(content)?;

        let path = self.blob_path(&info.digest);
        let commit_err =
            |e: std::io::Error| RemoldError::commit_with_source(format!("writing {}", path.display()), e);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(commit_err)?;
        }
        let partial = path.with_extension("partial");
        tokio::fs::write(&partial, content).await.map_err(commit_err)?;
        tokio::fs::rename(&partial, &path).await.map_err(commit_err)?;
        debug!(path = %path.display(), "stored blob");

        Ok(BlobInfo {
            size: content.len() as i64,
            ..info.clone()
        })
    }
}
