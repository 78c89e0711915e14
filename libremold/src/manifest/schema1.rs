//! Docker Distribution schema 1 manifest.
//!
//! Schema 1 lists layers most-recent-first and pairs every layer with a
//! `v1Compatibility` history string; both are exposed base-first here so they
//! line up with the other schemas.

use super::{AllowedFields, check_layer_count, check_schema_version};
use crate::blob::{BlobInfo, LayerInfo, UNKNOWN_SIZE};
use crate::compression::SCHEMA2_COMPRESSION;
use crate::digest::Digest;
use crate::error::{Result, RemoldError};
use crate::media_type::{DOCKER_V2_SCHEMA1, DOCKER_V2_SCHEMA1_SIGNED, DOCKER_V2_SCHEMA2_LAYER};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[cfg(test)]
#[path = "schema1_tests.rs"]
mod tests;

/// Timestamp written for history records that carry none.
pub const ZERO_TIMESTAMP: &str = "0001-01-01T00:00:00Z";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FsLayer {
    pub blob_sum: Digest,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct V1History {
    #[serde(rename = "v1Compatibility")]
    pub v1_compatibility: String,
}

/// The legacy v1 image JSON embedded in each history entry.
///
/// Field order matches what Docker writes for non-top entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V1Compatibility {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub parent: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub comment: String,
    #[serde(default)]
    pub created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_config: Option<V1ContainerConfig>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub author: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub throwaway: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct V1ContainerConfig {
    #[serde(rename = "Cmd", default)]
    pub cmd: Option<Vec<String>>,
}

/// A Docker schema 1 manifest, signed or unsigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema1Manifest {
    pub schema_version: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub architecture: String,
    pub fs_layers: Vec<FsLayer>,
    pub history: Vec<V1History>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signatures: Option<Vec<serde_json::Value>>,
    #[serde(skip)]
    media_type: String,
    #[serde(skip)]
    extracted: Vec<V1Compatibility>,
}

impl Schema1Manifest {
    /// Builds an unsigned manifest from most-recent-first layers and history.
    pub fn from_components(
        name: impl Into<String>,
        tag: impl Into<String>,
        architecture: impl Into<String>,
        fs_layers: Vec<FsLayer>,
        history: Vec<V1History>,
        media_type: &str,
    ) -> Result<Self> {
        let mut manifest = Schema1Manifest {
            schema_version: 1,
            name: name.into(),
            tag: tag.into(),
            architecture: architecture.into(),
            fs_layers,
            history,
            signatures: None,
            media_type: media_type.to_string(),
            extracted: Vec::new(),
        };
        manifest.initialize()?;
        Ok(manifest)
    }

    /// Parses a schema 1 manifest and checks its layer chain.
    pub fn from_blob(manifest: &[u8]) -> Result<Self> {
        let mut parsed: Schema1Manifest = serde_json::from_slice(manifest)
            .map_err(|e| RemoldError::parse_with_source("invalid docker schema 1 manifest", e))?;
        check_schema_version(parsed.schema_version, 1)?;
        parsed.media_type = if parsed.signatures.is_some() {
            DOCKER_V2_SCHEMA1_SIGNED.to_string()
        } else {
            DOCKER_V2_SCHEMA1.to_string()
        };
        super::validate_unambiguous_format(
            manifest,
            &parsed.media_type,
            AllowedFields {
                fs_layers: true,
                history: true,
                ..AllowedFields::default()
            },
        )?;
        parsed.initialize()?;
        parsed.fix_manifest_layers()?;
        Ok(parsed)
    }

    fn initialize(&mut self) -> Result<()> {
        if self.fs_layers.len() != self.history.len() {
            return Err(RemoldError::parse(format!(
                "length of history ({}) not equal to number of layers ({})",
                self.history.len(),
                self.fs_layers.len()
            )));
        }
        if self.fs_layers.is_empty() {
            return Err(RemoldError::parse("no fsLayers in schema 1 manifest"));
        }
        self.extracted = self
            .history
            .iter()
            .enumerate()
            .map(|(i, h)| {
                serde_json::from_str(&h.v1_compatibility).map_err(|e| {
                    RemoldError::parse_with_source(
                        format!("invalid v1Compatibility in history entry {}", i),
                        e,
                    )
                })
            })
            .collect::<Result<_>>()?;
        Ok(())
    }

    /// Validates v1 IDs and parent links, collapsing adjacent duplicate entries.
    fn fix_manifest_layers(&mut self) -> Result<()> {
        for compat in &self.extracted {
            validate_v1_id(&compat.id)?;
        }
        if self.extracted.last().is_some_and(|base| !base.parent.is_empty()) {
            return Err(RemoldError::parse(
                "invalid parent ID in the base layer of the image",
            ));
        }

        let mut seen = HashSet::new();
        let mut last_id: Option<&str> = None;
        for compat in &self.extracted {
            if last_id != Some(compat.id.as_str()) && seen.contains(compat.id.as_str()) {
                return Err(RemoldError::parse(format!(
                    "ID {} appears multiple times in manifest",
                    compat.id
                )));
            }
            last_id = Some(compat.id.as_str());
            seen.insert(compat.id.as_str());
        }

        for i in (0..self.extracted.len().saturating_sub(1)).rev() {
            if self.extracted[i].id == self.extracted[i + 1].id {
                self.fs_layers.remove(i);
                self.history.remove(i);
                self.extracted.remove(i);
            } else if self.extracted[i].parent != self.extracted[i + 1].id {
                return Err(RemoldError::parse(format!(
                    "invalid parent ID: expected {}, got {}",
                    self.extracted[i + 1].id,
                    self.extracted[i].parent
                )));
            }
        }
        Ok(())
    }

    /// Returns the manifest media type: signed when signatures were parsed.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Returns a copy reporting `media_type`, which must be a schema 1 type.
    pub(crate) fn with_media_type(mut self, media_type: &str) -> Self {
        self.media_type = media_type.to_string();
        self
    }

    /// Serializes the manifest.
    ///
    /// Signatures are written back only if they were parsed and the manifest
    /// has not been modified since; no signature is ever created.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| {
            RemoldError::parse_with_source("serializing docker schema 1 manifest", e)
        })
    }

    /// Parsed `v1Compatibility` entries, most-recent-first.
    pub fn v1_compatibility(&self) -> &[V1Compatibility] {
        &self.extracted
    }

    /// Returns the layers base-first, including the empty ones.
    pub fn layer_infos(&self) -> Vec<LayerInfo> {
        self.fs_layers
            .iter()
            .zip(&self.extracted)
            .rev()
            .map(|(layer, compat)| LayerInfo {
                info: BlobInfo::new(layer.blob_sum.clone(), UNKNOWN_SIZE)
                    .with_media_type(DOCKER_V2_SCHEMA2_LAYER),
                empty_layer: compat.throwaway,
            })
            .collect()
    }

    /// Returns a copy of this manifest with its layer digests replaced.
    pub fn updated_layer_infos(&self, infos: &[BlobInfo]) -> Result<Self> {
        self.clone().with_layer_infos(infos)
    }

    /// Replaces the layer digests, consuming the manifest.
    ///
    /// `infos` is base-first and must include the empty layers. History entries
    /// keep their IDs; only the blob sums change.
    pub fn with_layer_infos(mut self, infos: &[BlobInfo]) -> Result<Self> {
        check_layer_count(self.fs_layers.len(), infos.len())?;

        let mut fs_layers = Vec::with_capacity(infos.len());
        for info in infos.iter().rev() {
            let media_type = SCHEMA2_COMPRESSION.updated_media_type(DOCKER_V2_SCHEMA2_LAYER, info)?;
            if media_type != DOCKER_V2_SCHEMA2_LAYER {
                return Err(RemoldError::compression_incompatible(format!(
                    "schema 1 layers must be gzip-compressed, layer {} would be {}",
                    info.digest, media_type
                )));
            }
            fs_layers.push(FsLayer {
                blob_sum: info.digest.clone(),
            });
        }
        self.fs_layers = fs_layers;
        self.drop_signatures();
        Ok(self)
    }

    /// Sets the embedded repository name and tag, consuming the manifest.
    pub fn with_embedded_reference(mut self, name: &str, tag: &str) -> Self {
        if self.name != name || self.tag != tag {
            self.name = name.to_string();
            self.tag = tag.to_string();
            self.drop_signatures();
        }
        self
    }

    /// Invalidates the signatures after a modification, so the manifest no
    /// longer claims to be signed.
    fn drop_signatures(&mut self) {
        self.signatures = None;
        self.media_type = DOCKER_V2_SCHEMA1.to_string();
    }
}

fn validate_v1_id(id: &str) -> Result<()> {
    let valid = id.len() == 64
        && id
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !valid {
        return Err(RemoldError::parse(format!("image ID {:?} is invalid", id)));
    }
    Ok(())
}
