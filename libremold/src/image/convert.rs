//! Cross-schema manifest conversion.

use super::ManifestUpdateOptions;
use super::source::BlobDestination;
use crate::blob::{BlobInfo, GZIPPED_EMPTY_LAYER};
use crate::compression::{CompressionTable, OCI1_COMPRESSION, SCHEMA2_COMPRESSION};
use crate::digest::Digest;
use crate::reference::Reference;
use crate::error::{Result, RemoldError};
use crate::manifest::schema1::{FsLayer, V1Compatibility, V1ContainerConfig, V1History, ZERO_TIMESTAMP};
use crate::manifest::{Descriptor, ImageConfig, Oci1Manifest, Schema1Manifest, Schema2Manifest};
use crate::media_type::{DOCKER_V2_SCHEMA2_CONFIG, OCI_IMAGE_CONFIG};
use chrono::DateTime;
use sha2::{Digest as _, Sha256};
use std::collections::BTreeMap;
use tracing::{debug, warn};

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;

/// Rewrites a layer media type from one schema's table into another's.
fn convert_layer_media_type(
    media_type: &str,
    from: &CompressionTable,
    to: &CompressionTable,
) -> Result<&'static str> {
    let (kind, algorithm) = from.classify(media_type).ok_or_else(|| {
        RemoldError::unsupported(format!(
            "unknown layer media type {:?} during manifest conversion",
            media_type
        ))
    })?;
    to.media_type(kind, algorithm)
}

/// Converts an OCI image manifest to Docker schema 2.
///
/// Fails for artifacts (non-image configs) and for layers schema 2 cannot
/// describe, zstd in particular. Annotations have no schema 2 equivalent and
/// are dropped.
pub(crate) fn oci1_to_schema2(manifest: &Oci1Manifest) -> Result<Schema2Manifest> {
    if !manifest.is_image() {
        return Err(RemoldError::unsupported(format!(
            "cannot convert an OCI artifact with config type {:?} to a docker image",
            manifest.config.media_type
        )));
    }

    let dropped_annotations = !manifest.annotations.is_empty()
        || !manifest.config.annotations.is_empty()
        || manifest.layers.iter().any(|l| !l.annotations.is_empty());
    if dropped_annotations {
        warn!("dropping OCI annotations, docker schema 2 cannot represent them");
    }
    if manifest.subject.is_some() {
        warn!("dropping OCI subject, docker schema 2 cannot represent it");
    }

    let layers = manifest
        .layers
        .iter()
        .map(|layer| {
            let media_type =
                convert_layer_media_type(&layer.media_type, &OCI1_COMPRESSION, &SCHEMA2_COMPRESSION)?;
            Ok(Descriptor {
                urls: layer.urls.clone(),
                ..Descriptor::new(media_type, layer.digest.clone(), layer.size)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let config = Descriptor {
        urls: manifest.config.urls.clone(),
        ..Descriptor::new(
            DOCKER_V2_SCHEMA2_CONFIG,
            manifest.config.digest.clone(),
            manifest.config.size,
        )
    };
    Ok(Schema2Manifest::from_components(config, layers))
}

/// Converts a Docker schema 2 manifest to an OCI image manifest.
pub(crate) fn schema2_to_oci1(manifest: &Schema2Manifest) -> Result<Oci1Manifest> {
    let layers = manifest
        .layers
        .iter()
        .map(|layer| {
            let media_type =
                convert_layer_media_type(&layer.media_type, &SCHEMA2_COMPRESSION, &OCI1_COMPRESSION)?;
            Ok(Descriptor {
                urls: layer.urls.clone(),
                ..Descriptor::new(media_type, layer.digest.clone(), layer.size)
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let config = Descriptor {
        urls: manifest.config.urls.clone(),
        ..Descriptor::new(
            OCI_IMAGE_CONFIG,
            manifest.config.digest.clone(),
            manifest.config.size,
        )
    };
    Ok(Oci1Manifest::from_components(config, layers, BTreeMap::new()))
}

/// Computes a legacy v1 image ID the way `docker push` did.
///
/// The ID is the sha256 of the blob's hex digest joined by spaces with `parts`.
fn v1_id(blob: &Digest, parts: &[&[u8]]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(blob.hex().as_bytes());
    for part in parts {
        hasher.update(b" ");
        hasher.update(part);
    }
    format!("{:x}", hasher.finalize())
}

/// Re-emits a config timestamp the way docker wrote them into v1 history:
/// fractional seconds without trailing zeros, and `Z` for a zero offset.
fn v1_timestamp(created: &str) -> Result<String> {
    let parsed = DateTime::parse_from_rfc3339(created).map_err(|e| {
        RemoldError::parse_with_source(format!("invalid creation time {:?}", created), e)
    })?;

    let mut out = parsed.format("%Y-%m-%dT%H:%M:%S").to_string();
    let nanos = parsed.timestamp_subsec_nanos();
    if nanos > 0 {
        let fraction = format!("{:09}", nanos);
        out.push('.');
        out.push_str(fraction.trim_end_matches('0'));
    }
    if parsed.offset().local_minus_utc() == 0 {
        out.push('Z');
    } else {
        out.push_str(&parsed.format("%:z").to_string());
    }
    Ok(out)
}

/// Builds the `v1Compatibility` of the top entry from the full config.
///
/// Everything in the config is kept except `rootfs` and `history`.
fn top_v1_compatibility(
    config_blob: &[u8],
    id: &str,
    parent: &str,
    throwaway: bool,
) -> Result<String> {
    let mut raw: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(config_blob)
        .map_err(|e| RemoldError::parse_with_source("invalid image config JSON", e))?;
    raw.remove("rootfs");
    raw.remove("history");
    raw.insert("id".to_string(), id.into());
    if !parent.is_empty() {
        raw.insert("parent".to_string(), parent.into());
    }
    if throwaway {
        raw.insert("throwaway".to_string(), true.into());
    }
    serde_json::to_string(&raw)
        .map_err(|e| RemoldError::parse_with_source("encoding v1Compatibility", e))
}

/// Makes sure `destination` stores the empty layer placeholder.
async fn ensure_gzipped_empty_layer(
    destination: Option<&dyn BlobDestination>,
    placeholder: &BlobInfo,
) -> Result<()> {
    let destination = destination.ok_or_else(|| {
        RemoldError::commit("converting to schema 1 needs a destination for the empty layer blob")
    })?;

    if destination.has_blob(&placeholder.digest).await? {
        debug!(digest = %placeholder.digest, "destination already has the empty layer");
        return Ok(());
    }

    debug!("uploading empty layer during conversion to schema 1");
    let stored = destination
        .put_blob(&GZIPPED_EMPTY_LAYER, placeholder)
        .await
        .map_err(|e| match e {
            RemoldError::Commit { .. } => e,
            other => RemoldError::commit_with_source("uploading empty layer", other),
        })?;
    if stored.digest != placeholder.digest {
        return Err(RemoldError::verification(format!(
            "uploaded empty layer has digest {} instead of {}",
            stored.digest, placeholder.digest
        )));
    }
    Ok(())
}

/// Synthesizes a schema 1 manifest from a schema 2 manifest and its config.
///
/// Each config history record becomes one schema 1 history entry. Records
/// flagged `empty_layer` reference the shared empty layer blob; the others
/// consume the manifest's layers in order. Schema 1 lists everything
/// most-recent-first, so entry `i` of the history lands at `len - 1 - i`.
pub(crate) async fn schema2_to_schema1(
    manifest: &Schema2Manifest,
    config_blob: &[u8],
    options: &ManifestUpdateOptions<'_>,
    media_type: &str,
) -> Result<Schema1Manifest> {
    let config = ImageConfig::from_blob(config_blob)?;
    if config.history.is_empty() {
        return Err(RemoldError::structural(
            "cannot convert an image with 0 history entries to schema 1",
        ));
    }

    // Without any reference the name and tag are left empty.
    let reference = options
        .embedded_reference
        .clone()
        .or_else(|| options.destination.and_then(|d| d.reference()));
    let (name, tag) = reference
        .as_ref()
        .map(Reference::schema1_name_and_tag)
        .unwrap_or_default();

    let placeholder = BlobInfo::gzipped_empty_layer()?;
    let mut placeholder_stored = false;
    let mut layers = manifest.layers.iter();

    let mut fs_layers = Vec::with_capacity(config.history.len());
    let mut history = Vec::with_capacity(config.history.len());
    let mut parent = String::new();
    let mut id = String::new();
    for entry in &config.history {
        parent = std::mem::take(&mut id);

        let blob = if entry.empty_layer {
            if !placeholder_stored {
                ensure_gzipped_empty_layer(options.destination, &placeholder).await?;
                placeholder_stored = true;
            }
            placeholder.digest.clone()
        } else {
            let layer = layers.next().ok_or_else(|| {
                RemoldError::structural(format!(
                    "invalid image configuration, needs more than the {} distributed layers",
                    manifest.layers.len()
                ))
            })?;
            layer.digest.clone()
        };

        id = v1_id(&blob, &[parent.as_bytes()]);
        let compat = V1Compatibility {
            id: id.clone(),
            parent: parent.clone(),
            comment: entry.comment.clone().unwrap_or_default(),
            created: match entry.created.as_deref() {
                Some(created) => v1_timestamp(created)?,
                None => ZERO_TIMESTAMP.to_string(),
            },
            container_config: Some(V1ContainerConfig {
                cmd: Some(vec![entry.created_by.clone().unwrap_or_default()]),
            }),
            author: entry.author.clone().unwrap_or_default(),
            throwaway: entry.empty_layer,
        };
        let v1_compatibility = serde_json::to_string(&compat)
            .map_err(|e| RemoldError::parse_with_source("encoding v1Compatibility", e))?;

        fs_layers.push(FsLayer { blob_sum: blob });
        history.push(V1History { v1_compatibility });
    }

    let unused = layers.count();
    if unused > 0 {
        return Err(RemoldError::structural(format!(
            "image configuration history references {} of {} layers",
            manifest.layers.len() - unused,
            manifest.layers.len()
        )));
    }

    fs_layers.reverse();
    history.reverse();

    // The top entry carries the whole config, with an ID covering it too.
    let top_id = v1_id(&fs_layers[0].blob_sum, &[parent.as_bytes(), config_blob]);
    let top_throwaway = config.history.last().is_some_and(|h| h.empty_layer);
    history[0].v1_compatibility =
        top_v1_compatibility(config_blob, &top_id, &parent, top_throwaway)?;

    debug!(
        entries = history.len(),
        layers = manifest.layers.len(),
        "synthesized schema 1 history"
    );
    Schema1Manifest::from_components(
        name,
        tag,
        config.architecture.clone(),
        fs_layers,
        history,
        media_type,
    )
}
