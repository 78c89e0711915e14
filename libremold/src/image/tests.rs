use super::*;
use crate::blob::GZIPPED_EMPTY_LAYER_DIGEST;
use crate::digest::Digest;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub(crate) const OCI1: &str = include_str!("../../tests/fixtures/oci1.json");
pub(crate) const OCI1_CONFIG: &str = include_str!("../../tests/fixtures/oci1-config.json");
pub(crate) const OCI1_ALL_MEDIA_TYPES: &str =
    include_str!("../../tests/fixtures/oci1-all-media-types.json");
pub(crate) const OCI1_TO_SCHEMA1: &str = include_str!("../../tests/fixtures/oci1-to-schema1.json");
pub(crate) const OCI1_TO_SCHEMA2: &str = include_str!("../../tests/fixtures/oci1-to-schema2.json");
pub(crate) const SCHEMA2: &str = include_str!("../../tests/fixtures/schema2.json");
pub(crate) const SCHEMA1: &str = include_str!("../../tests/fixtures/schema1.json");

/// Blob source serving fixed blobs by digest.
#[derive(Default)]
pub(crate) struct MemorySource {
    blobs: HashMap<String, Vec<u8>>,
    pub(crate) requests: AtomicUsize,
}

impl MemorySource {
    pub(crate) fn with_blob(digest: &Digest, blob: &[u8]) -> Self {
        let mut source = MemorySource::default();
        source.blobs.insert(digest.to_string(), blob.to_vec());
        source
    }
}

#[async_trait]
impl BlobSource for MemorySource {
    async fn get_blob(&self, digest: &Digest) -> Result<(BlobReader, i64)> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let blob = self
            .blobs
            .get(&digest.to_string())
            .cloned()
            .ok_or_else(|| RemoldError::retrieval(format!("blob {} not found", digest)))?;
        let size = blob.len() as i64;
        Ok((Box::new(std::io::Cursor::new(blob)), size))
    }
}

/// Blob destination recording what was stored.
#[derive(Default)]
pub(crate) struct MemoryDestination {
    pub(crate) reference: Option<Reference>,
    pub(crate) stored: Mutex<HashMap<String, Vec<u8>>>,
    pub(crate) puts: AtomicUsize,
    pub(crate) already_has_blobs: bool,
    pub(crate) reported_digest: Option<Digest>,
}

impl MemoryDestination {
    pub(crate) fn for_reference(reference: &str) -> Self {
        MemoryDestination {
            reference: Some(Reference::from_str(reference).unwrap()),
            ..MemoryDestination::default()
        }
    }

    pub(crate) fn stored_blob(&self, digest: &str) -> Option<Vec<u8>> {
        self.stored.lock().unwrap().get(digest).cloned()
    }
}

#[async_trait]
impl BlobDestination for MemoryDestination {
    fn reference(&self) -> Option<Reference> {
        self.reference.clone()
    }

    async fn has_blob(&self, _digest: &Digest) -> Result<bool> {
        Ok(self.already_has_blobs)
    }

    async fn put_blob(&self, content: &[u8], info: &BlobInfo) -> Result<BlobInfo> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.stored
            .lock()
            .unwrap()
            .insert(info.digest.to_string(), content.to_vec());
        let mut stored = info.clone();
        if let Some(digest) = &self.reported_digest {
            stored.digest = digest.clone();
        }
        Ok(stored)
    }
}

pub(crate) fn oci1_fixture() -> GenericManifest {
    GenericManifest::from_blob(OCI1.as_bytes(), None).unwrap()
}

/// The OCI fixture with its config attached inline.
pub(crate) fn oci1_with_inline_config() -> GenericManifest {
    oci1_fixture().with_config_blob(OCI1_CONFIG.as_bytes().to_vec())
}

/// The OCI fixture pointing at the real digest of the config fixture.
pub(crate) fn oci1_with_config_digest() -> (GenericManifest, Digest) {
    let mut manifest = crate::manifest::Oci1Manifest::from_blob(OCI1.as_bytes()).unwrap();
    let digest = Digest::sha256(OCI1_CONFIG.as_bytes()).unwrap();
    manifest.config.digest = digest.clone();
    manifest.config.size = OCI1_CONFIG.len() as i64;
    (GenericManifest::from_oci1(manifest), digest)
}

pub(crate) fn json(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes).unwrap()
}

#[test]
fn test_from_blob_guesses_type() {
    assert!(matches!(oci1_fixture(), GenericManifest::Oci1 { .. }));
    assert!(matches!(
        GenericManifest::from_blob(SCHEMA2.as_bytes(), None).unwrap(),
        GenericManifest::Schema2 { .. }
    ));
    let schema1 = GenericManifest::from_blob(SCHEMA1.as_bytes(), None).unwrap();
    assert_eq!(schema1.manifest_media_type(), DOCKER_V2_SCHEMA1_SIGNED);
}

#[test]
fn test_from_blob_with_announced_type() {
    let manifest = GenericManifest::from_blob(OCI1.as_bytes(), Some(OCI_IMAGE_MANIFEST)).unwrap();
    assert_eq!(manifest.manifest_media_type(), OCI_IMAGE_MANIFEST);

    // announced type wins, and the content must agree with it
    assert!(GenericManifest::from_blob(OCI1.as_bytes(), Some(DOCKER_V2_SCHEMA2)).is_err());
}

#[test]
fn test_from_blob_rejects_lists_and_garbage() {
    let index = br#"{"schemaVersion":2,"mediaType":"application/vnd.oci.image.index.v1+json","manifests":[]}"#;
    let err = GenericManifest::from_blob(index, None).unwrap_err();
    assert!(err.is_unsupported_conversion());

    let err = GenericManifest::from_blob(b"garbage", None).unwrap_err();
    assert!(matches!(err, RemoldError::Parse { .. }));

    assert!(GenericManifest::from_blob(OCI1.as_bytes(), Some("text/plain")).is_err());
}

#[test]
fn test_serialize_round_trip_all_schemas() {
    for fixture in [OCI1, SCHEMA2, SCHEMA1] {
        let manifest = GenericManifest::from_blob(fixture.as_bytes(), None).unwrap();
        assert_eq!(json(&manifest.serialize().unwrap()), json(fixture.as_bytes()));
    }
}

#[test]
fn test_config_info() {
    let info = oci1_fixture().config_info().unwrap();
    assert_eq!(
        info.digest.to_string(),
        "sha256:9ca4bda0a6b3727a6ffcc43e981cad0f24e2ec79d338f6ba325b4dfd0756fb8f"
    );
    assert_eq!(info.size, 5940);

    let schema1 = GenericManifest::from_blob(SCHEMA1.as_bytes(), None).unwrap();
    assert!(schema1.config_info().is_none());
}

#[test]
fn test_layer_infos() {
    let digests: Vec<String> = oci1_fixture()
        .layer_infos()
        .into_iter()
        .map(|l| l.info.digest.to_string())
        .collect();
    assert_eq!(
        digests,
        vec![
            "sha256:6a5a5368e0c2d3e5909184fa28ddfd56072e7ff3ee9a945876f7eee5896ef5bb",
            "sha256:1bbf5d58d24c47512e234a5623474acf65ae00d4d1414272a893204f44cc680c",
            "sha256:8f5dc8a4b12c307ac84de90cdd9a7f3915d1be04c9388868ca118831099c67a9",
            "sha256:bbd6b22eb11afce63cc76f6bc41042d99f10d6024c96b655dafba930b8d25909",
            "sha256:960e52ecf8200cbd84e70eb2ad8678f4367e50d14357021872c10fa3fc5935fa",
        ]
    );
}

#[test]
fn test_embedded_reference_conflicts() {
    let reference = Reference::from_str("notbusybox:notlatest").unwrap();
    assert!(!oci1_fixture().embedded_reference_conflicts(&reference));
    let schema2 = GenericManifest::from_blob(SCHEMA2.as_bytes(), None).unwrap();
    assert!(!schema2.embedded_reference_conflicts(&reference));

    let schema1 = GenericManifest::from_blob(SCHEMA1.as_bytes(), None).unwrap();
    assert!(schema1.embedded_reference_conflicts(&reference));
    let same = Reference::from_str("httpd:latest").unwrap();
    assert!(!schema1.embedded_reference_conflicts(&same));
    let other_tag = Reference::from_str("httpd:2.4").unwrap();
    assert!(schema1.embedded_reference_conflicts(&other_tag));
}

#[test]
fn test_needs_layer_diff_ids() {
    let to = |mt: &str| ManifestUpdateOptions {
        target_media_type: Some(mt.to_string()),
        ..ManifestUpdateOptions::default()
    };
    let oci1 = oci1_fixture();
    assert!(!oci1.updated_image_needs_layer_diff_ids(&ManifestUpdateOptions::default()));
    assert!(!oci1.updated_image_needs_layer_diff_ids(&to(DOCKER_V2_SCHEMA2)));
    assert!(!oci1.updated_image_needs_layer_diff_ids(&to(DOCKER_V2_SCHEMA1_SIGNED)));

    let schema1 = GenericManifest::from_blob(SCHEMA1.as_bytes(), None).unwrap();
    assert!(!schema1.updated_image_needs_layer_diff_ids(&to(DOCKER_V2_SCHEMA1)));
    assert!(schema1.updated_image_needs_layer_diff_ids(&to(DOCKER_V2_SCHEMA2)));
    assert!(schema1.updated_image_needs_layer_diff_ids(&to(OCI_IMAGE_MANIFEST)));
}

#[tokio::test]
async fn test_updated_image_layer_infos() {
    let original = oci1_fixture();
    let mut infos: Vec<BlobInfo> = original.layer_infos().into_iter().map(|l| l.info).collect();
    infos.rotate_left(1);

    let updated = original
        .updated_image(&ManifestUpdateOptions {
            layer_infos: Some(infos.clone()),
            ..ManifestUpdateOptions::default()
        })
        .await
        .unwrap();
    let updated_infos: Vec<BlobInfo> = updated.layer_infos().into_iter().map(|l| l.info).collect();
    assert_eq!(updated_infos, infos);

    infos.push(infos[0].clone());
    let err = original
        .updated_image(&ManifestUpdateOptions {
            layer_infos: Some(infos),
            ..ManifestUpdateOptions::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RemoldError::Structural { .. }));
}

#[tokio::test]
async fn test_updated_image_ignores_embedded_reference_for_oci() {
    let original = oci1_fixture();
    let updated = original
        .updated_image(&ManifestUpdateOptions {
            embedded_reference: Some(Reference::from_str("busybox:latest").unwrap()),
            ..ManifestUpdateOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(updated, original);
    let other = Reference::from_str("notbusybox:notlatest").unwrap();
    assert!(!updated.embedded_reference_conflicts(&other));
}

#[tokio::test]
async fn test_updated_image_sets_schema1_embedded_reference() {
    let original = GenericManifest::from_blob(SCHEMA1.as_bytes(), None).unwrap();
    let reference = Reference::from_str("busybox:1.36").unwrap();
    let updated = original
        .updated_image(&ManifestUpdateOptions {
            embedded_reference: Some(reference.clone()),
            ..ManifestUpdateOptions::default()
        })
        .await
        .unwrap();
    assert!(!updated.embedded_reference_conflicts(&reference));
    assert!(original.embedded_reference_conflicts(&reference));
    assert_eq!(original.manifest_media_type(), DOCKER_V2_SCHEMA1_SIGNED);
    assert_eq!(updated.manifest_media_type(), DOCKER_V2_SCHEMA1);
}

#[tokio::test]
async fn test_updated_image_identity_and_unsupported_targets() {
    let original = oci1_fixture();
    let same = original
        .updated_image(&ManifestUpdateOptions {
            target_media_type: Some(OCI_IMAGE_MANIFEST.to_string()),
            ..ManifestUpdateOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(same, original);

    for target in ["this is invalid", OCI_IMAGE_INDEX, DOCKER_V2_LIST] {
        let err = original
            .updated_image(&ManifestUpdateOptions {
                target_media_type: Some(target.to_string()),
                ..ManifestUpdateOptions::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RemoldError::UnsupportedConversion { .. }), "{target}");
    }
}

#[tokio::test]
async fn test_schema1_cannot_leave_schema1() {
    let original = GenericManifest::from_blob(SCHEMA1.as_bytes(), None).unwrap();
    for target in [DOCKER_V2_SCHEMA2, OCI_IMAGE_MANIFEST] {
        let err = original
            .updated_image(&ManifestUpdateOptions {
                target_media_type: Some(target.to_string()),
                ..ManifestUpdateOptions::default()
            })
            .await
            .unwrap_err();
        assert!(err.is_unsupported_conversion());
    }

    let unsigned = original
        .updated_image(&ManifestUpdateOptions {
            target_media_type: Some(DOCKER_V2_SCHEMA1.to_string()),
            ..ManifestUpdateOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(unsigned.manifest_media_type(), DOCKER_V2_SCHEMA1);
}

#[tokio::test]
async fn test_updated_image_never_mutates_receiver() {
    let original = oci1_with_inline_config();
    let before = original.serialize().unwrap();
    let destination = MemoryDestination::for_reference("httpd-copy:latest");
    let infos: Vec<BlobInfo> = original
        .layer_infos()
        .into_iter()
        .map(|l| l.info)
        .rev()
        .collect();

    for target in [
        None,
        Some(DOCKER_V2_SCHEMA2),
        Some(DOCKER_V2_SCHEMA1_SIGNED),
        Some("this is invalid"),
    ] {
        let _ = original
            .updated_image(&ManifestUpdateOptions {
                layer_infos: Some(infos.clone()),
                target_media_type: target.map(str::to_string),
                destination: Some(&destination),
                ..ManifestUpdateOptions::default()
            })
            .await;
        assert_eq!(original.serialize().unwrap(), before);
    }
    assert_eq!(original, oci1_with_inline_config());
}

#[test]
fn test_placeholder_digest_constant() {
    assert_eq!(
        BlobInfo::gzipped_empty_layer().unwrap().digest.to_string(),
        GZIPPED_EMPTY_LAYER_DIGEST
    );
}
