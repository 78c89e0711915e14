//! OCI image manifest, schema version 2.

use super::{AllowedFields, Descriptor, check_layer_count, check_schema_version};
use crate::blob::{BlobInfo, LayerInfo};
use crate::compression::OCI1_COMPRESSION;
use crate::error::{Result, RemoldError};
use crate::media_type::{OCI_IMAGE_CONFIG, OCI_IMAGE_MANIFEST, supported_oci1_media_type};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[cfg(test)]
#[path = "oci1_tests.rs"]
mod tests;

/// An OCI image manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Oci1Manifest {
    pub schema_version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact_type: Option<String>,
    pub config: Descriptor,
    pub layers: Vec<Descriptor>,
    /// The manifest this one refers to, for referrers such as signatures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Descriptor>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Oci1Manifest {
    /// Builds a manifest from its descriptors.
    pub fn from_components(
        config: Descriptor,
        layers: Vec<Descriptor>,
        annotations: BTreeMap<String, String>,
    ) -> Self {
        Oci1Manifest {
            schema_version: 2,
            media_type: Some(OCI_IMAGE_MANIFEST.to_string()),
            artifact_type: None,
            config,
            layers,
            subject: None,
            annotations,
        }
    }

    /// Parses an OCI manifest, rejecting documents that carry fields of other schemas.
    pub fn from_blob(manifest: &[u8]) -> Result<Self> {
        super::validate_unambiguous_format(
            manifest,
            OCI_IMAGE_MANIFEST,
            AllowedFields {
                config: true,
                layers: true,
                ..AllowedFields::default()
            },
        )?;
        let parsed: Oci1Manifest = serde_json::from_slice(manifest)
            .map_err(|e| RemoldError::parse_with_source("invalid OCI manifest", e))?;
        check_schema_version(parsed.schema_version, 2)?;
        Ok(parsed)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| RemoldError::parse_with_source("serializing OCI manifest", e))
    }

    /// Whether this manifest describes a container image rather than an
    /// artifact with some other config type.
    pub fn is_image(&self) -> bool {
        self.config.media_type == OCI_IMAGE_CONFIG
    }

    pub fn config_info(&self) -> BlobInfo {
        self.config.to_blob_info()
    }

    pub fn layer_infos(&self) -> Vec<LayerInfo> {
        self.layers
            .iter()
            .map(|layer| LayerInfo {
                info: layer.to_blob_info(),
                empty_layer: false,
            })
            .collect()
    }

    /// Returns a copy of this manifest with its layer descriptors replaced.
    pub fn updated_layer_infos(&self, infos: &[BlobInfo]) -> Result<Self> {
        self.clone().with_layer_infos(infos)
    }

    /// Replaces the layer descriptors, consuming the manifest.
    ///
    /// Each layer keeps its base kind; the compression part of its media type
    /// follows the operation recorded in the matching `BlobInfo`. Digest, size,
    /// URLs and annotations are taken from `infos`; platform and artifact type
    /// stay as they were.
    pub fn with_layer_infos(mut self, infos: &[BlobInfo]) -> Result<Self> {
        check_layer_count(self.layers.len(), infos.len())?;

        let mut layers = Vec::with_capacity(infos.len());
        for (original, info) in self.layers.iter().zip(infos) {
            supported_oci1_media_type(&original.media_type).map_err(|_| {
                RemoldError::validation(format!(
                    "error preparing updated manifest: unknown media type of original layer {}: {:?}",
                    original.digest, original.media_type
                ))
            })?;
            let media_type = OCI1_COMPRESSION.updated_media_type(&original.media_type, info)?;
            layers.push(original.retarget(media_type, info));
        }
        self.layers = layers;
        Ok(self)
    }
}
