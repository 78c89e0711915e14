//! Docker Distribution schema 2 manifest.

use super::{AllowedFields, Descriptor, check_layer_count, check_schema_version};
use crate::blob::{BlobInfo, LayerInfo};
use crate::compression::SCHEMA2_COMPRESSION;
use crate::error::{Result, RemoldError};
use crate::media_type::{DOCKER_V2_SCHEMA2, supported_schema2_media_type};
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "schema2_tests.rs"]
mod tests;

/// A Docker schema 2 image manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema2Manifest {
    pub schema_version: i64,
    pub media_type: String,
    pub config: Descriptor,
    pub layers: Vec<Descriptor>,
}

impl Schema2Manifest {
    pub fn from_components(config: Descriptor, layers: Vec<Descriptor>) -> Self {
        Schema2Manifest {
            schema_version: 2,
            media_type: DOCKER_V2_SCHEMA2.to_string(),
            config,
            layers,
        }
    }

    /// Parses a schema 2 manifest.
    ///
    /// The `mediaType` field is mandatory here; without it a schema 2 manifest
    /// cannot be told apart from an early OCI one.
    pub fn from_blob(manifest: &[u8]) -> Result<Self> {
        super::validate_unambiguous_format(
            manifest,
            DOCKER_V2_SCHEMA2,
            AllowedFields {
                config: true,
                layers: true,
                ..AllowedFields::default()
            },
        )?;
        let parsed: Schema2Manifest = serde_json::from_slice(manifest)
            .map_err(|e| RemoldError::parse_with_source("invalid docker schema 2 manifest", e))?;
        check_schema_version(parsed.schema_version, 2)?;
        if parsed.media_type != DOCKER_V2_SCHEMA2 {
            return Err(RemoldError::parse(format!(
                "docker schema 2 manifest has mediaType {:?}",
                parsed.media_type
            )));
        }
        Ok(parsed)
    }

    pub fn serialize(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| RemoldError::parse_with_source("serializing docker schema 2 manifest", e))
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
    /// Annotations in `infos` are dropped; schema 2 descriptors cannot carry them.
    pub fn with_layer_infos(mut self, infos: &[BlobInfo]) -> Result<Self> {
        check_layer_count(self.layers.len(), infos.len())?;

        let mut layers = Vec::with_capacity(infos.len());
        for (original, info) in self.layers.iter().zip(infos) {
            supported_schema2_media_type(&original.media_type).map_err(|_| {
                RemoldError::validation(format!(
                    "error preparing updated manifest: unknown media type of original layer {}: {:?}",
                    original.digest, original.media_type
                ))
            })?;
            let media_type = SCHEMA2_COMPRESSION.updated_media_type(&original.media_type, info)?;
            layers.push(Descriptor {
                urls: info.urls.clone(),
                ..Descriptor::new(media_type, info.digest.clone(), info.size)
            });
        }
        self.layers = layers;
        Ok(self)
    }
}
