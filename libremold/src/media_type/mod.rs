//! Media type catalog.
//!
//! Constants for every media type remold understands, the per-schema
//! validation helpers, and [`guess_media_type`] for manifests delivered
//! without a trustworthy `Content-Type`.

use crate::error::{Result, RemoldError};
use serde::Deserialize;

#[cfg(test)]
mod tests;

/// OCI content descriptor
pub const OCI_DESCRIPTOR: &str = "application/vnd.oci.descriptor.v1+json";
/// OCI layout header (`oci-layout` file)
pub const OCI_LAYOUT_HEADER: &str = "application/vnd.oci.layout.header.v1+json";
/// OCI image manifest
pub const OCI_IMAGE_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";
/// OCI image index
pub const OCI_IMAGE_INDEX: &str = "application/vnd.oci.image.index.v1+json";
/// OCI image configuration
pub const OCI_IMAGE_CONFIG: &str = "application/vnd.oci.image.config.v1+json";
/// OCI layer, uncompressed tar
pub const OCI_LAYER: &str = "application/vnd.oci.image.layer.v1.tar";
/// OCI layer, gzip-compressed tar
pub const OCI_LAYER_GZIP: &str = "application/vnd.oci.image.layer.v1.tar+gzip";
/// OCI layer, zstd-compressed tar
pub const OCI_LAYER_ZSTD: &str = "application/vnd.oci.image.layer.v1.tar+zstd";
/// OCI non-distributable layer, uncompressed tar
pub const OCI_LAYER_NON_DISTRIBUTABLE: &str =
    "application/vnd.oci.image.layer.nondistributable.v1.tar";
/// OCI non-distributable layer, gzip-compressed tar
pub const OCI_LAYER_NON_DISTRIBUTABLE_GZIP: &str =
    "application/vnd.oci.image.layer.nondistributable.v1.tar+gzip";
/// OCI non-distributable layer, zstd-compressed tar
pub const OCI_LAYER_NON_DISTRIBUTABLE_ZSTD: &str =
    "application/vnd.oci.image.layer.nondistributable.v1.tar+zstd";

/// Docker schema 1 manifest, unsigned
pub const DOCKER_V2_SCHEMA1: &str = "application/vnd.docker.distribution.manifest.v1+json";
/// Docker schema 1 manifest, JWS-signed
pub const DOCKER_V2_SCHEMA1_SIGNED: &str =
    "application/vnd.docker.distribution.manifest.v1+prettyjws";
/// Docker schema 2 manifest
pub const DOCKER_V2_SCHEMA2: &str = "application/vnd.docker.distribution.manifest.v2+json";
/// Docker schema 2 manifest list
pub const DOCKER_V2_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";
/// Docker schema 2 image configuration
pub const DOCKER_V2_SCHEMA2_CONFIG: &str = "application/vnd.docker.container.image.v1+json";
/// Docker schema 2 layer, gzip-compressed tar
pub const DOCKER_V2_SCHEMA2_LAYER: &str = "application/vnd.docker.image.rootfs.diff.tar.gzip";
/// Docker schema 2 layer, uncompressed tar
pub const DOCKER_V2_SCHEMA2_LAYER_UNCOMPRESSED: &str =
    "application/vnd.docker.image.rootfs.diff.tar";
/// Docker schema 2 foreign layer, uncompressed tar
pub const DOCKER_V2_SCHEMA2_FOREIGN_LAYER: &str =
    "application/vnd.docker.image.rootfs.foreign.diff.tar";
/// Docker schema 2 foreign layer, gzip-compressed tar
pub const DOCKER_V2_SCHEMA2_FOREIGN_LAYER_GZIP: &str =
    "application/vnd.docker.image.rootfs.foreign.diff.tar.gzip";

/// Validates `media_type` against the OCI v1 catalog.
///
/// # Examples
///
/// ```
/// use libremold::media_type::{self, supported_oci1_media_type};
///
/// assert!(supported_oci1_media_type(media_type::OCI_LAYER_ZSTD).is_ok());
/// assert!(supported_oci1_media_type("application/vnd.oci.image.layer.v1.tar+unknown").is_err());
/// ```
pub fn supported_oci1_media_type(media_type: &str) -> Result<()> {
    match media_type {
        OCI_DESCRIPTOR
        | OCI_IMAGE_CONFIG
        | OCI_LAYER
        | OCI_LAYER_GZIP
        | OCI_LAYER_ZSTD
        | OCI_LAYER_NON_DISTRIBUTABLE
        | OCI_LAYER_NON_DISTRIBUTABLE_GZIP
        | OCI_LAYER_NON_DISTRIBUTABLE_ZSTD
        | OCI_IMAGE_MANIFEST
        | OCI_LAYOUT_HEADER => Ok(()),
        other => Err(RemoldError::validation(format!(
            "unsupported OCIv1 media type: {:?}",
            other
        ))),
    }
}

/// Validates `media_type` against the Docker schema 1 / schema 2 catalog.
pub fn supported_schema2_media_type(media_type: &str) -> Result<()> {
    match media_type {
        DOCKER_V2_LIST
        | DOCKER_V2_SCHEMA1
        | DOCKER_V2_SCHEMA1_SIGNED
        | DOCKER_V2_SCHEMA2_CONFIG
        | DOCKER_V2_SCHEMA2_FOREIGN_LAYER
        | DOCKER_V2_SCHEMA2_FOREIGN_LAYER_GZIP
        | DOCKER_V2_SCHEMA2_LAYER
        | DOCKER_V2_SCHEMA2
        | DOCKER_V2_SCHEMA2_LAYER_UNCOMPRESSED => Ok(()),
        other => Err(RemoldError::validation(format!(
            "unsupported docker v2s2 media type: {:?}",
            other
        ))),
    }
}

/// Validates `media_type` against every catalog remold knows.
pub fn supported_media_type(media_type: &str) -> Result<()> {
    if supported_oci1_media_type(media_type).is_ok()
        || supported_schema2_media_type(media_type).is_ok()
        || media_type == OCI_IMAGE_INDEX
    {
        return Ok(());
    }
    Err(RemoldError::validation(format!(
        "unsupported media type: {:?}",
        media_type
    )))
}

/// Returns true for both schema 1 media types.
pub fn is_schema1(media_type: &str) -> bool {
    media_type == DOCKER_V2_SCHEMA1 || media_type == DOCKER_V2_SCHEMA1_SIGNED
}

#[derive(Deserialize)]
struct ManifestMeta {
    #[serde(default, rename = "mediaType")]
    media_type: String,
    #[serde(default, rename = "schemaVersion")]
    schema_version: i64,
    #[serde(default)]
    signatures: Option<serde_json::Value>,
    #[serde(default)]
    config: Option<ConfigMeta>,
    #[serde(default)]
    manifests: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct ConfigMeta {
    #[serde(default, rename = "mediaType")]
    media_type: String,
}

/// Guesses the media type of a manifest blob from its contents.
///
/// Returns an empty string when the blob is not JSON or carries no usable hint.
/// A recognized top-level `mediaType` wins; otherwise `schemaVersion` and the
/// shape of the document decide.
pub fn guess_media_type(manifest: &[u8]) -> String {
    let meta: ManifestMeta = match serde_json::from_slice(manifest) {
        Ok(meta) => meta,
        Err(_) => return String::new(),
    };

    match meta.media_type.as_str() {
        DOCKER_V2_SCHEMA2 | DOCKER_V2_LIST | OCI_IMAGE_MANIFEST | OCI_IMAGE_INDEX => {
            return meta.media_type;
        }
        _ => {}
    }

    match meta.schema_version {
        1 => {
            if meta.signatures.is_some() {
                DOCKER_V2_SCHEMA1_SIGNED.to_string()
            } else {
                DOCKER_V2_SCHEMA1.to_string()
            }
        }
        2 => {
            // OCI manifests before image-spec 1.0.2 had no mediaType field
            match meta.config.as_ref().map(|c| c.media_type.as_str()) {
                Some(OCI_IMAGE_CONFIG) => return OCI_IMAGE_MANIFEST.to_string(),
                Some(DOCKER_V2_SCHEMA2_CONFIG) => return DOCKER_V2_SCHEMA2.to_string(),
                _ => {}
            }
            if meta.manifests.is_some() {
                return OCI_IMAGE_INDEX.to_string();
            }
            if meta.config.is_some() {
                // An OCI artifact with a custom config type
                return OCI_IMAGE_MANIFEST.to_string();
            }
            DOCKER_V2_SCHEMA2.to_string()
        }
        _ => String::new(),
    }
}
