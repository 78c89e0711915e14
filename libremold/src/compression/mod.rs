//! Layer compression bookkeeping.
//!
//! A layer media type encodes a base kind (regular or non-distributable) and a
//! compression suffix. The tables here map between the two for each schema and
//! decide which compression changes a schema can express. No bytes are ever
//! compressed or decompressed here; only media types change.

use crate::blob::BlobInfo;
use crate::error::{Result, RemoldError};
use crate::media_type::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;


/// A compression algorithm a layer blob may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionAlgorithm {
    Gzip,
    Zstd,
    /// Recognized on input only; no layer media type carries it.
    Bzip2,
    /// Recognized on input only; no layer media type carries it.
    Xz,
}

impl CompressionAlgorithm {
    /// Returns the canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            CompressionAlgorithm::Gzip => "gzip",
            CompressionAlgorithm::Zstd => "zstd",
            CompressionAlgorithm::Bzip2 => "bzip2",
            CompressionAlgorithm::Xz => "xz",
        }
    }
}

impl fmt::Display for CompressionAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompressionAlgorithm {
    type Err = RemoldError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "gzip" => Ok(CompressionAlgorithm::Gzip),
            "zstd" => Ok(CompressionAlgorithm::Zstd),
            "bzip2" => Ok(CompressionAlgorithm::Bzip2),
            "xz" => Ok(CompressionAlgorithm::Xz),
            other => Err(RemoldError::validation(format!(
                "unknown compression algorithm {:?}",
                other
            ))),
        }
    }
}

/// What happened to a layer's compression while it was being copied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionOperation {
    /// The blob is byte-identical to the original; keep its media type.
    #[default]
    PreserveOriginal,
    /// The blob was (re)compressed with `compression_algorithm`.
    Compress,
    /// The blob was decompressed.
    Decompress,
}

/// The base content kind of a layer, independent of compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerKind {
    Regular,
    NonDistributable,
}

/// All compression variants of one layer kind within one schema.
///
/// `None` marks a variant the schema cannot express.
#[derive(Debug)]
pub struct MediaTypeSet {
    pub kind: LayerKind,
    pub uncompressed: Option<&'static str>,
    pub gzip: Option<&'static str>,
    pub zstd: Option<&'static str>,
}

impl MediaTypeSet {
    fn contains(&self, media_type: &str) -> bool {
        [self.uncompressed, self.gzip, self.zstd]
            .iter()
            .any(|variant| *variant == Some(media_type))
    }

    fn classify(&self, media_type: &str) -> Option<Option<CompressionAlgorithm>> {
        if self.uncompressed == Some(media_type) {
            Some(None)
        } else if self.gzip == Some(media_type) {
            Some(Some(CompressionAlgorithm::Gzip))
        } else if self.zstd == Some(media_type) {
            Some(Some(CompressionAlgorithm::Zstd))
        } else {
            None
        }
    }
}

/// The compression variants of every layer kind in one schema.
#[derive(Debug)]
pub struct CompressionTable {
    schema: &'static str,
    sets: &'static [MediaTypeSet],
}

/// OCI v1 layers accept every variant for both kinds.
pub static OCI1_COMPRESSION: CompressionTable = CompressionTable {
    schema: "OCI",
    sets: &[
        MediaTypeSet {
            kind: LayerKind::NonDistributable,
            uncompressed: Some(OCI_LAYER_NON_DISTRIBUTABLE),
            gzip: Some(OCI_LAYER_NON_DISTRIBUTABLE_GZIP),
            zstd: Some(OCI_LAYER_NON_DISTRIBUTABLE_ZSTD),
        },
        MediaTypeSet {
            kind: LayerKind::Regular,
            uncompressed: Some(OCI_LAYER),
            gzip: Some(OCI_LAYER_GZIP),
            zstd: Some(OCI_LAYER_ZSTD),
        },
    ],
};

/// Docker schema 2 layers cannot be zstd-compressed.
pub static SCHEMA2_COMPRESSION: CompressionTable = CompressionTable {
    schema: "docker",
    sets: &[
        MediaTypeSet {
            kind: LayerKind::NonDistributable,
            uncompressed: Some(DOCKER_V2_SCHEMA2_FOREIGN_LAYER),
            gzip: Some(DOCKER_V2_SCHEMA2_FOREIGN_LAYER_GZIP),
            zstd: None,
        },
        MediaTypeSet {
            kind: LayerKind::Regular,
            uncompressed: Some(DOCKER_V2_SCHEMA2_LAYER_UNCOMPRESSED),
            gzip: Some(DOCKER_V2_SCHEMA2_LAYER),
            zstd: None,
        },
    ],
};

impl CompressionTable {
    /// Resolves `(kind, algorithm)` to a media type.
    ///
    /// # Examples
    ///
    /// ```
    /// use libremold::compression::{CompressionAlgorithm, LayerKind, OCI1_COMPRESSION};
    /// use libremold::media_type;
    ///
    /// let mt = OCI1_COMPRESSION
    ///     .media_type(LayerKind::Regular, Some(CompressionAlgorithm::Zstd))
    ///     .unwrap();
    /// assert_eq!(mt, media_type::OCI_LAYER_ZSTD);
    /// ```
    pub fn media_type(
        &self,
        kind: LayerKind,
        algorithm: Option<CompressionAlgorithm>,
    ) -> Result<&'static str> {
        let set = self
            .sets
            .iter()
            .find(|set| set.kind == kind)
            .ok_or_else(|| {
                RemoldError::compression_incompatible(format!(
                    "{:?} layers are not supported by {} manifests",
                    kind, self.schema
                ))
            })?;
        select_variant(set, algorithm, self.schema)
    }

    /// Splits a layer media type into its kind and compression.
    ///
    /// Returns `None` when the media type is not a layer type of this schema.
    pub fn classify(
        &self,
        media_type: &str,
    ) -> Option<(LayerKind, Option<CompressionAlgorithm>)> {
        self.sets
            .iter()
            .find_map(|set| set.classify(media_type).map(|algorithm| (set.kind, algorithm)))
    }

    /// Returns the variant of `media_type`'s layer kind with the given compression.
    pub fn compression_variant(
        &self,
        media_type: &str,
        algorithm: Option<CompressionAlgorithm>,
    ) -> Result<&'static str> {
        match self.sets.iter().find(|set| set.contains(media_type)) {
            Some(set) => select_variant(set, algorithm, self.schema),
            None => match algorithm {
                Some(_) => Err(RemoldError::unsupported(format!(
                    "unsupported MIME type for compression: {}",
                    media_type
                ))),
                None => Err(RemoldError::unsupported(format!(
                    "unsupported MIME type for decompression: {}",
                    media_type
                ))),
            },
        }
    }

    /// Computes the media type a layer ends up with after the update in `updated`.
    ///
    /// `media_type` is the layer's current media type; `updated` carries the
    /// compression operation and algorithm that were applied while copying.
    pub fn updated_media_type(&self, media_type: &str, updated: &BlobInfo) -> Result<String> {
        match updated.compression_operation {
            // A named algorithm wins over the original suffix, which may be stale.
            CompressionOperation::PreserveOriginal => match updated.compression_algorithm {
                Some(algorithm) => Ok(self
                    .compression_variant(media_type, Some(algorithm))?
                    .to_string()),
                None => Ok(media_type.to_string()),
            },
            CompressionOperation::Decompress => {
                if let Some(algorithm) = updated.compression_algorithm {
                    return Err(RemoldError::validation(format!(
                        "layer {} is being decompressed, but compression algorithm {} was specified",
                        updated.digest, algorithm
                    )));
                }
                Ok(self.compression_variant(media_type, None)?.to_string())
            }
            CompressionOperation::Compress => {
                let algorithm = updated.compression_algorithm.ok_or_else(|| {
                    RemoldError::validation(format!(
                        "layer {} must be compressed, but no compression algorithm was specified",
                        updated.digest
                    ))
                })?;
                Ok(self
                    .compression_variant(media_type, Some(algorithm))?
                    .to_string())
            }
        }
    }
}

fn select_variant(
    set: &MediaTypeSet,
    algorithm: Option<CompressionAlgorithm>,
    schema: &str,
) -> Result<&'static str> {
    let variant = match algorithm {
        None => set.uncompressed,
        Some(CompressionAlgorithm::Gzip) => set.gzip,
        Some(CompressionAlgorithm::Zstd) => set.zstd,
        Some(other) => {
            return Err(RemoldError::compression_incompatible(format!(
                "{} compression is not supported for {} layers",
                other, schema
            )));
        }
    };
    variant.ok_or_else(|| match algorithm {
        Some(algorithm) => RemoldError::compression_incompatible(format!(
            "{} compression is not supported for {} images",
            algorithm, schema
        )),
        None => RemoldError::compression_incompatible(format!(
            "uncompressed variant is not supported for {} images",
            schema
        )),
    })
}
