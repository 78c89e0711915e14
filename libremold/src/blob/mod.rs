//! Blob descriptors shared by every manifest schema.

use crate::compression::{CompressionAlgorithm, CompressionOperation};
use crate::digest::Digest;
use serde::Serialize;
use std::collections::BTreeMap;


/// Size value meaning "not known".
pub const UNKNOWN_SIZE: i64 = -1;

/// A gzip-compressed tar archive with no entries.
///
/// Schema 1 manifests need a real blob for every history entry, including
/// metadata-only build steps; those all point at this blob.
pub const GZIPPED_EMPTY_LAYER: [u8; 32] = [
    31, 139, 8, 0, 0, 9, 110, 136, 0, 255, 98, 24, 5, 163, 96, 20, 140, 88, 0, 8, 0, 0, 255, 255,
    46, 175, 181, 239, 0, 4, 0, 0,
];

/// Digest of [`GZIPPED_EMPTY_LAYER`].
pub const GZIPPED_EMPTY_LAYER_DIGEST: &str =
    "sha256:a3ed95caeb02ffe68cdd9fd84406680ae93d633cb16422d00e8a7c22955b46d4";

/// A reference to a content-addressed blob plus what happened to it in transit.
///
/// `compression_operation` and `compression_algorithm` describe a copy in
/// progress; they are never serialized into a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobInfo {
    pub digest: Digest,
    pub size: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub media_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(skip)]
    pub compression_operation: CompressionOperation,
    #[serde(skip)]
    pub compression_algorithm: Option<CompressionAlgorithm>,
}

impl BlobInfo {
    /// Creates a descriptor with no media type, URLs or annotations.
    ///
    /// # Examples
    ///
    /// ```
    /// use libremold::blob::{BlobInfo, UNKNOWN_SIZE};
    /// use libremold::Digest;
    ///
    /// let digest = Digest::sha256(b"layer").unwrap();
    /// let info = BlobInfo::new(digest, UNKNOWN_SIZE);
    /// assert!(!info.has_known_size());
    /// ```
    pub fn new(digest: Digest, size: i64) -> Self {
        BlobInfo {
            digest,
            size,
            media_type: String::new(),
            urls: Vec::new(),
            annotations: BTreeMap::new(),
            compression_operation: CompressionOperation::default(),
            compression_algorithm: None,
        }
    }

    /// Sets the media type.
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.media_type = media_type.into();
        self
    }

    /// Sets the external retrieval locations.
    pub fn with_urls(mut self, urls: Vec<String>) -> Self {
        self.urls = urls;
        self
    }

    /// Sets the annotations.
    pub fn with_annotations(mut self, annotations: BTreeMap<String, String>) -> Self {
        self.annotations = annotations;
        self
    }

    /// Marks the blob as (re)compressed with `algorithm`.
    pub fn compressed_with(mut self, algorithm: CompressionAlgorithm) -> Self {
        self.compression_operation = CompressionOperation::Compress;
        self.compression_algorithm = Some(algorithm);
        self
    }

    /// Marks the blob as decompressed.
    pub fn decompressed(mut self) -> Self {
        self.compression_operation = CompressionOperation::Decompress;
        self.compression_algorithm = None;
        self
    }

    pub fn has_known_size(&self) -> bool {
        self.size >= 0
    }

    /// Returns the descriptor of the shared empty layer placeholder.
    pub fn gzipped_empty_layer() -> crate::error::Result<Self> {
        let digest = GZIPPED_EMPTY_LAYER_DIGEST.parse()?;
        Ok(BlobInfo::new(digest, GZIPPED_EMPTY_LAYER.len() as i64))
    }
}

/// A layer as listed by a manifest.
///
/// `empty_layer` is only ever true for schema 1 history entries that carry
/// the placeholder blob instead of real content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerInfo {
    #[serde(flatten)]
    pub info: BlobInfo,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub empty_layer: bool,
}
