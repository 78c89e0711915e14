//! Config blob retrieval and image inspection.

use super::GenericManifest;
use super::source::{BlobSource, read_verified_blob};
use crate::digest::Digest;
use crate::error::{Result, RemoldError};
use crate::manifest::ImageConfig;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;

/// A schema-independent summary of an image.
///
/// Computed fresh on every [`GenericManifest::inspect`] call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInspectInfo {
    pub tag: String,
    pub created: Option<DateTime<Utc>>,
    pub docker_version: String,
    pub labels: BTreeMap<String, String>,
    pub architecture: String,
    pub variant: String,
    pub os: String,
    pub author: String,
    /// Layer digests from the manifest, base-first.
    pub layers: Vec<Digest>,
    pub env: Vec<String>,
}

fn parse_created(created: Option<&str>) -> Result<Option<DateTime<Utc>>> {
    created
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| {
                    RemoldError::parse_with_source(format!("invalid creation time {:?}", s), e)
                })
        })
        .transpose()
}

impl GenericManifest {
    /// Returns the raw config blob.
    ///
    /// An inline blob is returned as is. Otherwise the blob is read from
    /// `source` and its digest checked against the config descriptor. Schema 1
    /// manifests have no config blob and yield an empty one.
    pub async fn config_blob(&self, source: Option<&dyn BlobSource>) -> Result<Vec<u8>> {
        match self {
            GenericManifest::Oci1 {
                config_blob: Some(blob),
                ..
            }
            | GenericManifest::Schema2 {
                config_blob: Some(blob),
                ..
            } => Ok(blob.clone()),
            GenericManifest::Oci1 { manifest, .. } => {
                read_verified_blob(source, &manifest.config.digest).await
            }
            GenericManifest::Schema2 { manifest, .. } => {
                read_verified_blob(source, &manifest.config.digest).await
            }
            GenericManifest::Schema1 { .. } => Ok(Vec::new()),
        }
    }

    /// Summarizes the image.
    ///
    /// OCI and schema 2 manifests read their config through
    /// [`config_blob`](Self::config_blob); schema 1 manifests use the top
    /// history entry. Nothing is returned unless every field parses. OCI
    /// artifacts are not images and are rejected.
    pub async fn inspect(&self, source: Option<&dyn BlobSource>) -> Result<ImageInspectInfo> {
        let (config, tag) = match self {
            GenericManifest::Schema1 { manifest } => {
                let top = manifest.history.first().ok_or_else(|| {
                    RemoldError::parse("schema 1 manifest has no history entries")
                })?;
                let config = ImageConfig::from_blob(top.v1_compatibility.as_bytes())?;
                (config, manifest.tag.clone())
            }
            GenericManifest::Oci1 { manifest, .. } if !manifest.is_image() => {
                return Err(RemoldError::validation(format!(
                    "cannot inspect an OCI artifact with config type {:?} as an image",
                    manifest.config.media_type
                )));
            }
            _ => {
                let blob = self.config_blob(source).await?;
                (ImageConfig::from_blob(&blob)?, String::new())
            }
        };

        Ok(ImageInspectInfo {
            tag,
            created: parse_created(config.created.as_deref())?,
            docker_version: config.docker_version.clone(),
            labels: config.labels(),
            architecture: config.architecture.clone(),
            variant: config.variant.clone().unwrap_or_default(),
            os: config.os.clone(),
            author: config.author.clone().unwrap_or_default(),
            layers: self
                .layer_infos()
                .into_iter()
                .map(|layer| layer.info.digest)
                .collect(),
            env: config.env(),
        })
    }
}
