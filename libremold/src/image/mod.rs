//! The generic manifest: one type over all three schemas.
//!
//! [`GenericManifest`] is what the rest of a copy pipeline works with. It
//! answers descriptor queries uniformly, converts between schemas through
//! [`GenericManifest::updated_image`] and reads the config blob for inspection.
//! Every operation leaves the receiver untouched; updates return a new value.

mod convert;
mod inspect;
mod source;

pub use inspect::ImageInspectInfo;
pub use source::{BlobDestination, BlobReader, BlobSource};

use crate::blob::{BlobInfo, LayerInfo};
use crate::error::{Result, RemoldError};
use crate::manifest::{Oci1Manifest, Schema1Manifest, Schema2Manifest};
use crate::media_type::*;
use crate::reference::Reference;
use tracing::debug;

#[cfg(test)]
mod tests;

/// A parsed manifest of any supported schema.
///
/// OCI and schema 2 manifests may carry their config blob inline, e.g. when
/// built in memory or after a conversion that already read it; otherwise it
/// is fetched on demand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenericManifest {
    Oci1 {
        manifest: Oci1Manifest,
        config_blob: Option<Vec<u8>>,
    },
    Schema2 {
        manifest: Schema2Manifest,
        config_blob: Option<Vec<u8>>,
    },
    Schema1 {
        manifest: Schema1Manifest,
    },
}

/// Changes requested from [`GenericManifest::updated_image`].
#[derive(Clone, Default)]
pub struct ManifestUpdateOptions<'a> {
    /// Replacement layer descriptors, one per existing layer.
    pub layer_infos: Option<Vec<BlobInfo>>,
    /// The reference to embed; only schema 1 stores one.
    pub embedded_reference: Option<Reference>,
    /// The manifest media type to convert to; `None` keeps the schema.
    pub target_media_type: Option<String>,
    /// Where to read the config blob from when it is not inline.
    pub source: Option<&'a dyn BlobSource>,
    /// Where the converted image goes; required to store the schema 1
    /// empty layer placeholder.
    pub destination: Option<&'a dyn BlobDestination>,
}

/// The schema a conversion produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Oci1,
    Schema2,
    Schema1(&'static str),
}

impl Target {
    fn parse(media_type: Option<&str>) -> Result<Option<Self>> {
        match media_type {
            None | Some("") => Ok(None),
            Some(OCI_IMAGE_MANIFEST) => Ok(Some(Target::Oci1)),
            Some(DOCKER_V2_SCHEMA2) => Ok(Some(Target::Schema2)),
            Some(DOCKER_V2_SCHEMA1) => Ok(Some(Target::Schema1(DOCKER_V2_SCHEMA1))),
            Some(DOCKER_V2_SCHEMA1_SIGNED) => Ok(Some(Target::Schema1(DOCKER_V2_SCHEMA1_SIGNED))),
            Some(other) => Err(RemoldError::unsupported(format!(
                "conversion to manifest type {:?} is not supported",
                other
            ))),
        }
    }
}

impl GenericManifest {
    /// Parses a manifest blob.
    ///
    /// `media_type` is the type announced by the transport; when it is absent
    /// or empty the type is guessed from the content.
    ///
    /// # Examples
    ///
    /// ```
    /// use libremold::GenericManifest;
    ///
    /// let blob = br#"{
    ///     "schemaVersion": 2,
    ///     "mediaType": "application/vnd.oci.image.manifest.v1+json",
    ///     "config": {
    ///         "mediaType": "application/vnd.oci.image.config.v1+json",
    ///         "digest": "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855",
    ///         "size": 0
    ///     },
    ///     "layers": []
    /// }"#;
    /// let manifest = GenericManifest::from_blob(blob, None).unwrap();
    /// assert_eq!(manifest.manifest_media_type(), "application/vnd.oci.image.manifest.v1+json");
    /// ```
    pub fn from_blob(manifest: &[u8], media_type: Option<&str>) -> Result<Self> {
        let media_type = match media_type.filter(|mt| !mt.is_empty()) {
            Some(mt) => mt.to_string(),
            None => guess_media_type(manifest),
        };

        match media_type.as_str() {
            OCI_IMAGE_MANIFEST => Ok(Self::from_oci1(Oci1Manifest::from_blob(manifest)?)),
            DOCKER_V2_SCHEMA2 => Ok(Self::from_schema2(Schema2Manifest::from_blob(manifest)?)),
            DOCKER_V2_SCHEMA1 | DOCKER_V2_SCHEMA1_SIGNED => Ok(GenericManifest::Schema1 {
                manifest: Schema1Manifest::from_blob(manifest)?,
            }),
            OCI_IMAGE_INDEX | DOCKER_V2_LIST => Err(RemoldError::unsupported(format!(
                "{} is a list of manifests, not a single image",
                media_type
            ))),
            "" => Err(RemoldError::parse("unable to determine the manifest type")),
            other => Err(RemoldError::unsupported(format!(
                "unsupported manifest media type {:?}",
                other
            ))),
        }
    }

    pub fn from_oci1(manifest: Oci1Manifest) -> Self {
        GenericManifest::Oci1 {
            manifest,
            config_blob: None,
        }
    }

    pub fn from_schema2(manifest: Schema2Manifest) -> Self {
        GenericManifest::Schema2 {
            manifest,
            config_blob: None,
        }
    }

    pub fn from_schema1(manifest: Schema1Manifest) -> Self {
        GenericManifest::Schema1 { manifest }
    }

    /// Attaches the config blob so it is not fetched later.
    ///
    /// The blob is trusted as given. Schema 1 manifests have no config blob and
    /// are returned unchanged.
    pub fn with_config_blob(self, blob: Vec<u8>) -> Self {
        match self {
            GenericManifest::Oci1 { manifest, .. } => GenericManifest::Oci1 {
                manifest,
                config_blob: Some(blob),
            },
            GenericManifest::Schema2 { manifest, .. } => GenericManifest::Schema2 {
                manifest,
                config_blob: Some(blob),
            },
            schema1 @ GenericManifest::Schema1 { .. } => schema1,
        }
    }

    /// Serializes the manifest to its wire form.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        match self {
            GenericManifest::Oci1 { manifest, .. } => manifest.serialize(),
            GenericManifest::Schema2 { manifest, .. } => manifest.serialize(),
            GenericManifest::Schema1 { manifest } => manifest.serialize(),
        }
    }

    pub fn manifest_media_type(&self) -> &str {
        match self {
            GenericManifest::Oci1 { .. } => OCI_IMAGE_MANIFEST,
            GenericManifest::Schema2 { .. } => DOCKER_V2_SCHEMA2,
            GenericManifest::Schema1 { manifest } => manifest.media_type(),
        }
    }

    /// Returns the config descriptor; schema 1 manifests have none.
    pub fn config_info(&self) -> Option<BlobInfo> {
        match self {
            GenericManifest::Oci1 { manifest, .. } => Some(manifest.config_info()),
            GenericManifest::Schema2 { manifest, .. } => Some(manifest.config_info()),
            GenericManifest::Schema1 { .. } => None,
        }
    }

    /// Returns the layers base-first, with resolved media types.
    pub fn layer_infos(&self) -> Vec<LayerInfo> {
        match self {
            GenericManifest::Oci1 { manifest, .. } => manifest.layer_infos(),
            GenericManifest::Schema2 { manifest, .. } => manifest.layer_infos(),
            GenericManifest::Schema1 { manifest } => manifest.layer_infos(),
        }
    }

    /// Reports whether an embedded reference would have to change to match `candidate`.
    ///
    /// Only schema 1 embeds a repository name and tag.
    pub fn embedded_reference_conflicts(&self, candidate: &Reference) -> bool {
        match self {
            GenericManifest::Schema1 { manifest } => {
                let (name, tag) = candidate.schema1_name_and_tag();
                manifest.name != name || manifest.tag != tag
            }
            _ => false,
        }
    }

    /// Returns a copy with the layer descriptors replaced.
    pub fn updated_layer_infos(&self, infos: &[BlobInfo]) -> Result<Self> {
        self.clone().with_layer_infos(infos)
    }

    /// Replaces the layer descriptors, consuming the manifest.
    ///
    /// For schema 1 the list includes empty layers.
    pub fn with_layer_infos(self, infos: &[BlobInfo]) -> Result<Self> {
        Ok(match self {
            GenericManifest::Oci1 {
                manifest,
                config_blob,
            } => GenericManifest::Oci1 {
                manifest: manifest.with_layer_infos(infos)?,
                config_blob,
            },
            GenericManifest::Schema2 {
                manifest,
                config_blob,
            } => GenericManifest::Schema2 {
                manifest: manifest.with_layer_infos(infos)?,
                config_blob,
            },
            GenericManifest::Schema1 { manifest } => GenericManifest::Schema1 {
                manifest: manifest.with_layer_infos(infos)?,
            },
        })
    }

    fn with_embedded_reference(self, reference: &Reference) -> Self {
        match self {
            GenericManifest::Schema1 { manifest } => {
                let (name, tag) = reference.schema1_name_and_tag();
                GenericManifest::Schema1 {
                    manifest: manifest.with_embedded_reference(name, tag),
                }
            }
            other => other,
        }
    }

    /// Reports whether applying `options` needs the diff IDs of the layers.
    ///
    /// Only leaving schema 1 does: its history carries no diff IDs, while
    /// the config of the other schemas must list them.
    pub fn updated_image_needs_layer_diff_ids(&self, options: &ManifestUpdateOptions<'_>) -> bool {
        match self {
            GenericManifest::Schema1 { .. } => matches!(
                Target::parse(options.target_media_type.as_deref()),
                Ok(Some(Target::Oci1 | Target::Schema2))
            ),
            _ => false,
        }
    }

    /// Applies `options`, returning a new manifest; the receiver is never modified.
    ///
    /// Steps run in order: the target type is checked, layer descriptors are
    /// replaced, the embedded reference is set and finally the schema is
    /// converted. Supported conversions are OCI to schema 2 and back, OCI or
    /// schema 2 to schema 1, and any schema to itself.
    pub async fn updated_image(&self, options: &ManifestUpdateOptions<'_>) -> Result<Self> {
        let target = Target::parse(options.target_media_type.as_deref())?;
        if let (GenericManifest::Schema1 { .. }, Some(Target::Oci1 | Target::Schema2)) =
            (self, target)
        {
            return Err(RemoldError::unsupported(format!(
                "conversion from {} to {} requires layer diff IDs",
                self.manifest_media_type(),
                options.target_media_type.as_deref().unwrap_or_default()
            )));
        }

        let mut updated = self.clone();
        if let Some(infos) = &options.layer_infos {
            updated = updated.with_layer_infos(infos)?;
        }
        if let Some(reference) = &options.embedded_reference {
            updated = updated.with_embedded_reference(reference);
        }

        let Some(target) = target else {
            return Ok(updated);
        };
        debug!(
            from = self.manifest_media_type(),
            to = ?target,
            "updating manifest schema"
        );

        match (updated, target) {
            (manifest @ GenericManifest::Oci1 { .. }, Target::Oci1) => Ok(manifest),
            (manifest @ GenericManifest::Schema2 { .. }, Target::Schema2) => Ok(manifest),
            (GenericManifest::Schema1 { manifest }, Target::Schema1(media_type)) => {
                Ok(GenericManifest::Schema1 {
                    manifest: manifest.with_media_type(media_type),
                })
            }
            (
                GenericManifest::Oci1 {
                    manifest,
                    config_blob,
                },
                Target::Schema2,
            ) => Ok(GenericManifest::Schema2 {
                manifest: convert::oci1_to_schema2(&manifest)?,
                config_blob,
            }),
            (
                GenericManifest::Schema2 {
                    manifest,
                    config_blob,
                },
                Target::Oci1,
            ) => Ok(GenericManifest::Oci1 {
                manifest: convert::schema2_to_oci1(&manifest)?,
                config_blob,
            }),
            (
                updated @ (GenericManifest::Oci1 { .. } | GenericManifest::Schema2 { .. }),
                Target::Schema1(media_type),
            ) => {
                let manifest = updated.convert_to_schema1(options, media_type).await?;
                Ok(GenericManifest::Schema1 { manifest })
            }
            (updated, target) => Err(RemoldError::unsupported(format!(
                "conversion from {} to {:?} is not supported",
                updated.manifest_media_type(),
                target
            ))),
        }
    }

    async fn convert_to_schema1(
        &self,
        options: &ManifestUpdateOptions<'_>,
        media_type: &'static str,
    ) -> Result<Schema1Manifest> {
        match self {
            GenericManifest::Oci1 { manifest, .. } => {
                let schema2 = convert::oci1_to_schema2(manifest)?;
                let config = self.config_blob(options.source).await?;
                convert::schema2_to_schema1(&schema2, &config, options, media_type).await
            }
            GenericManifest::Schema2 { manifest, .. } => {
                let config = self.config_blob(options.source).await?;
                convert::schema2_to_schema1(manifest, &config, options, media_type).await
            }
            GenericManifest::Schema1 { .. } => Err(RemoldError::unsupported(
                "schema 1 manifests cannot be rebuilt as schema 1",
            )),
        }
    }
}
