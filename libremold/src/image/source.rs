//! Blob capabilities supplied by the caller.
//!
//! remold never talks to a registry or a filesystem itself. Config blobs are
//! read through a [`BlobSource`]; the schema 1 empty layer placeholder is
//! written through a [`BlobDestination`]. Both are async: dropping the future
//! of a remold operation cancels the pending capability call with it.

use crate::blob::BlobInfo;
use crate::digest::Digest;
use crate::error::{Result, RemoldError};
use crate::reference::Reference;
use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

/// A stream of blob bytes.
pub type BlobReader = Box<dyn AsyncRead + Send + Unpin>;

/// Read access to content-addressed blobs.
#[async_trait]
pub trait BlobSource: Send + Sync {
    /// Opens the blob with `digest`, returning its content and size (`-1` if unknown).
    ///
    /// Implementations need not verify the content; callers do.
    async fn get_blob(&self, digest: &Digest) -> Result<(BlobReader, i64)>;
}

/// Write access to the place a converted image is committed to.
#[async_trait]
pub trait BlobDestination: Send + Sync {
    /// The reference the image is being written under, if known.
    fn reference(&self) -> Option<Reference> {
        None
    }

    /// Reports whether the destination already stores `digest`.
    async fn has_blob(&self, _digest: &Digest) -> Result<bool> {
        Ok(false)
    }

    /// Stores `content`, returning the descriptor of what was stored.
    async fn put_blob(&self, content: &[u8], info: &BlobInfo) -> Result<BlobInfo>;
}

/// Reads a whole blob from `source` and checks it against `digest`.
pub(crate) async fn read_verified_blob(
    source: Option<&dyn BlobSource>,
    digest: &Digest,
) -> Result<Vec<u8>> {
    let source = source.ok_or_else(|| {
        RemoldError::retrieval(format!("no blob source to read blob {} from", digest))
    })?;

    let (mut reader, _) = source.get_blob(digest).await.map_err(|e| match e {
        RemoldError::Retrieval { .. } => e,
        other => RemoldError::retrieval_with_source(format!("fetching blob {}", digest), other),
    })?;

    let mut blob = Vec::new();
    reader
        .read_to_end(&mut blob)
        .await
        .map_err(|e| RemoldError::retrieval_with_source(format!("reading blob {}", digest), e))?;

    digest.verify(&blob)?;
    Ok(blob)
}
