//! Wire formats of the three manifest schemas.
//!
//! Each submodule owns one schema: parsing with format validation, canonical
//! serialization and layer descriptor updates. Cross-schema conversion lives in
//! [`crate::image`].

pub mod config;
pub mod oci1;
pub mod schema1;
pub mod schema2;

pub use config::{ImageConfig, ImageHistory};
pub use oci1::Oci1Manifest;
pub use schema1::Schema1Manifest;
pub use schema2::Schema2Manifest;

use crate::blob::BlobInfo;
use crate::digest::Digest;
use crate::error::{Result, RemoldError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;


/// A descriptor as written in OCI and Docker schema 2 manifests.
///
/// Carries every OCI 1.1 descriptor field so parsed manifests serialize back
/// unchanged. Docker schema 2 only ever fills the first five.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Descriptor {
    pub media_type: String,
    pub digest: Digest,
    pub size: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    /// Base64 encoded content embedded in the descriptor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
}

/// The platform a descriptor's content runs on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub architecture: String,
    pub os: String,
    #[serde(
        default,
        rename = "os.version",
        skip_serializing_if = "Option::is_none"
    )]
    pub os_version: Option<String>,
    #[serde(default, rename = "os.features", skip_serializing_if = "Vec::is_empty")]
    pub os_features: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl Descriptor {
    pub fn new(media_type: impl Into<String>, digest: Digest, size: i64) -> Self {
        Descriptor {
            media_type: media_type.into(),
            digest,
            size,
            urls: Vec::new(),
            annotations: BTreeMap::new(),
            artifact_type: None,
            data: None,
            platform: None,
        }
    }

    pub fn to_blob_info(&self) -> BlobInfo {
        BlobInfo::new(self.digest.clone(), self.size)
            .with_media_type(self.media_type.clone())
            .with_urls(self.urls.clone())
            .with_annotations(self.annotations.clone())
    }

    /// Points this descriptor at the blob `info` describes.
    ///
    /// Fields `BlobInfo` has no notion of are kept, except embedded `data`,
    /// which is dropped once the digest changes.
    pub(crate) fn retarget(&self, media_type: String, info: &BlobInfo) -> Self {
        let data = if info.digest == self.digest {
            self.data.clone()
        } else {
            None
        };
        Descriptor {
            media_type,
            digest: info.digest.clone(),
            size: info.size,
            urls: info.urls.clone(),
            annotations: info.annotations.clone(),
            data,
            ..self.clone()
        }
    }
}

impl From<&BlobInfo> for Descriptor {
    fn from(info: &BlobInfo) -> Self {
        Descriptor {
            urls: info.urls.clone(),
            annotations: info.annotations.clone(),
            ..Descriptor::new(info.media_type.clone(), info.digest.clone(), info.size)
        }
    }
}

/// Top-level fields a schema may legitimately contain.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AllowedFields {
    pub config: bool,
    pub fs_layers: bool,
    pub history: bool,
    pub layers: bool,
    pub manifests: bool,
}

#[derive(Deserialize)]
struct DetectedFields {
    #[serde(default, rename = "mediaType")]
    media_type: Option<String>,
    #[serde(default)]
    config: Option<serde_json::Value>,
    #[serde(default, rename = "fsLayers")]
    fs_layers: Option<serde_json::Value>,
    #[serde(default)]
    history: Option<serde_json::Value>,
    #[serde(default)]
    layers: Option<serde_json::Value>,
    #[serde(default)]
    manifests: Option<serde_json::Value>,
}

/// Rejects documents that could be mistaken for another schema.
///
/// A manifest with fields from several schemas would be read differently by
/// different consumers, so any field outside `allowed` is an error. A present
/// `mediaType` must equal `expected`; an absent one is accepted.
pub(crate) fn validate_unambiguous_format(
    manifest: &[u8],
    expected: &str,
    allowed: AllowedFields,
) -> Result<()> {
    let detected: DetectedFields = serde_json::from_slice(manifest)
        .map_err(|e| RemoldError::parse_with_source("manifest is not valid JSON", e))?;

    if let Some(media_type) = detected.media_type.as_deref().filter(|mt| *mt != expected) {
        return Err(RemoldError::parse(format!(
            "manifest has mediaType {:?}, expected {:?}",
            media_type, expected
        )));
    }

    let checks = [
        ("config", detected.config.is_some(), allowed.config),
        ("fsLayers", detected.fs_layers.is_some(), allowed.fs_layers),
        ("history", detected.history.is_some(), allowed.history),
        ("layers", detected.layers.is_some(), allowed.layers),
        ("manifests", detected.manifests.is_some(), allowed.manifests),
    ];
    for (field, present, permitted) in checks {
        if present && !permitted {
            return Err(RemoldError::parse(format!(
                "{} manifest contains a {:?} field",
                expected, field
            )));
        }
    }
    Ok(())
}

pub(crate) fn check_schema_version(found: i64, expected: i64) -> Result<()> {
    if found != expected {
        return Err(RemoldError::parse(format!(
            "unsupported manifest schemaVersion {}, expected {}",
            found, expected
        )));
    }
    Ok(())
}

pub(crate) fn check_layer_count(current: usize, supplied: usize) -> Result<()> {
    if current != supplied {
        return Err(RemoldError::structural(format!(
            "error preparing updated manifest: layer count changed from {} to {}",
            current, supplied
        )));
    }
    Ok(())
}
