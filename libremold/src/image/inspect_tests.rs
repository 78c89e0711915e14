use super::*;
use crate::image::tests::*;
use crate::image::{BlobReader, BlobSource};
use async_trait::async_trait;
use chrono::TimeZone;
use std::io;
use std::sync::atomic::Ordering;

/// A source whose blobs fail halfway through reading.
struct BrokenSource;

#[async_trait]
impl BlobSource for BrokenSource {
    async fn get_blob(&self, _digest: &Digest) -> Result<(BlobReader, i64)> {
        let reader = tokio_test::io::Builder::new()
            .read(b"{")
            .read_error(io::Error::other("connection reset"))
            .build();
        Ok((Box::new(reader), -1))
    }
}

/// A source that fails with a non-retrieval error.
struct RejectingSource;

#[async_trait]
impl BlobSource for RejectingSource {
    async fn get_blob(&self, digest: &Digest) -> Result<(BlobReader, i64)> {
        Err(RemoldError::validation(format!("refusing {}", digest)))
    }
}

#[tokio::test]
async fn test_config_blob_is_verified() {
    let (manifest, digest) = oci1_with_config_digest();
    let source = MemorySource::with_blob(&digest, OCI1_CONFIG.as_bytes());

    let blob = manifest.config_blob(Some(&source)).await.unwrap();
    assert_eq!(blob, OCI1_CONFIG.as_bytes());
    assert_eq!(source.requests.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_config_blob_digest_mismatch() {
    let (manifest, digest) = oci1_with_config_digest();
    let source = MemorySource::with_blob(&digest, b"{\"architecture\":\"arm64\"}");

    let err = manifest.config_blob(Some(&source)).await.unwrap_err();
    assert!(matches!(err, RemoldError::Verification { .. }));
}

#[tokio::test]
async fn test_config_blob_without_source() {
    let (manifest, _) = oci1_with_config_digest();
    let err = manifest.config_blob(None).await.unwrap_err();
    assert!(matches!(err, RemoldError::Retrieval { .. }));
}

#[tokio::test]
async fn test_config_blob_source_failures_are_retrieval_errors() {
    let (manifest, _) = oci1_with_config_digest();

    let err = manifest.config_blob(Some(&RejectingSource)).await.unwrap_err();
    assert!(matches!(err, RemoldError::Retrieval { .. }));

    let err = manifest.config_blob(Some(&BrokenSource)).await.unwrap_err();
    assert!(matches!(err, RemoldError::Retrieval { .. }));
    assert!(std::error::Error::source(&err).is_some());
}

#[tokio::test]
async fn test_inline_config_blob_skips_source() {
    let manifest = oci1_with_inline_config();
    let source = MemorySource::default();
    let blob = manifest.config_blob(Some(&source)).await.unwrap();
    assert_eq!(blob, OCI1_CONFIG.as_bytes());
    assert_eq!(source.requests.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_schema1_has_no_config_blob() {
    let manifest = GenericManifest::from_blob(SCHEMA1.as_bytes(), None).unwrap();
    assert!(manifest.config_blob(None).await.unwrap().is_empty());
}

fn expected_env() -> Vec<String> {
    vec![
        "PATH=/usr/local/apache2/bin:/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin",
        "HTTPD_PREFIX=/usr/local/apache2",
        "HTTPD_VERSION=2.4.23",
        "HTTPD_SHA1=5101be34ac4a509b245adb70a56690a84fcc4e7f",
        "HTTPD_BZ2_URL=https://www.apache.org/dyn/closer.cgi?action=download&filename=httpd/httpd-2.4.23.tar.bz2",
        "HTTPD_ASC_URL=https://www.apache.org/dist/httpd/httpd-2.4.23.tar.bz2.asc",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

#[tokio::test]
async fn test_inspect_oci1() {
    let (manifest, digest) = oci1_with_config_digest();
    let source = MemorySource::with_blob(&digest, OCI1_CONFIG.as_bytes());

    let info = manifest.inspect(Some(&source)).await.unwrap();
    let created = Utc.with_ymd_and_hms(2016, 9, 23, 23, 20, 45).unwrap()
        + chrono::Duration::nanoseconds(789_764_590);
    assert_eq!(info.tag, "");
    assert_eq!(info.created, Some(created));
    assert_eq!(info.docker_version, "1.12.1");
    assert!(info.labels.is_empty());
    assert_eq!(info.architecture, "amd64");
    assert_eq!(info.variant, "");
    assert_eq!(info.os, "linux");
    assert_eq!(info.author, "");
    assert_eq!(info.env, expected_env());
    let layers: Vec<Digest> = manifest
        .layer_infos()
        .into_iter()
        .map(|l| l.info.digest)
        .collect();
    assert_eq!(info.layers, layers);
}

#[tokio::test]
async fn test_inspect_is_all_or_nothing() {
    let manifest = oci1_fixture().with_config_blob(b"{\"created\": 42}".to_vec());
    let err = manifest.inspect(None).await.unwrap_err();
    assert!(matches!(err, RemoldError::Parse { .. }));

    let manifest = oci1_fixture().with_config_blob(b"{\"created\": \"yesterday\"}".to_vec());
    let err = manifest.inspect(None).await.unwrap_err();
    assert!(matches!(err, RemoldError::Parse { .. }));
}

#[tokio::test]
async fn test_inspect_labels_and_variant() {
    let config = serde_json::json!({
        "architecture": "arm64",
        "variant": "v8",
        "os": "linux",
        "author": "ops@example.com",
        "config": { "Labels": { "org.opencontainers.image.title": "web" } },
        "history": []
    });
    let manifest = oci1_fixture().with_config_blob(serde_json::to_vec(&config).unwrap());
    let info = manifest.inspect(None).await.unwrap();
    assert_eq!(info.variant, "v8");
    assert_eq!(info.author, "ops@example.com");
    assert_eq!(info.created, None);
    assert_eq!(
        info.labels.get("org.opencontainers.image.title").map(String::as_str),
        Some("web")
    );
    assert!(info.env.is_empty());
}

#[tokio::test]
async fn test_inspect_schema1() {
    let manifest = GenericManifest::from_blob(SCHEMA1.as_bytes(), None).unwrap();
    let info = manifest.inspect(None).await.unwrap();
    assert_eq!(info.tag, "latest");
    assert_eq!(info.docker_version, "1.12.1");
    assert_eq!(info.architecture, "amd64");
    assert_eq!(info.os, "linux");
    assert_eq!(info.env, expected_env());
    assert_eq!(info.layers.len(), 15);
    assert_eq!(
        info.created.map(|c| c.to_rfc3339()),
        Some("2016-09-23T23:20:45.789764590+00:00".to_string())
    );
}

#[tokio::test]
async fn test_inspect_after_conversion_matches_source() {
    let (manifest, digest) = oci1_with_config_digest();
    let source = MemorySource::with_blob(&digest, OCI1_CONFIG.as_bytes());
    let options = crate::image::ManifestUpdateOptions {
        target_media_type: Some(crate::media_type::DOCKER_V2_SCHEMA2.to_string()),
        ..Default::default()
    };
    let converted = manifest.updated_image(&options).await.unwrap();

    let before = manifest.inspect(Some(&source)).await.unwrap();
    let after = converted.inspect(Some(&source)).await.unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_inspect_rejects_artifacts() {
    let artifact = GenericManifest::from_blob(
        include_str!("../../tests/fixtures/oci1-referrer.json").as_bytes(),
        None,
    )
    .unwrap();
    let source = MemorySource::with_blob(&artifact.config_info().unwrap().digest, b"{}");

    let err = artifact.inspect(Some(&source)).await.unwrap_err();
    assert!(matches!(err, RemoldError::Validation { .. }));
    assert_eq!(source.requests.load(Ordering::SeqCst), 0);
}
