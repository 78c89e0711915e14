use super::*;

#[test]
fn test_supported_oci1_media_types() {
    for media_type in [
        OCI_DESCRIPTOR,
        OCI_IMAGE_CONFIG,
        OCI_LAYER,
        OCI_LAYER_GZIP,
        OCI_LAYER_NON_DISTRIBUTABLE,
        OCI_LAYER_NON_DISTRIBUTABLE_GZIP,
        OCI_LAYER_NON_DISTRIBUTABLE_ZSTD,
        OCI_LAYER_ZSTD,
        OCI_IMAGE_MANIFEST,
        OCI_LAYOUT_HEADER,
    ] {
        assert!(
            supported_oci1_media_type(media_type).is_ok(),
            "{media_type} should be supported"
        );
    }
}

#[test]
fn test_unknown_oci1_media_type_is_rejected() {
    let err = supported_oci1_media_type(
        "application/vnd.oci.image.layer.nondistributable.v1.tar+unknown",
    )
    .unwrap_err();
    assert!(matches!(err, RemoldError::Validation { .. }));
    assert!(err.to_string().contains("tar+unknown"));
}

#[test]
fn test_docker_types_are_not_oci1_types() {
    assert!(supported_oci1_media_type(DOCKER_V2_SCHEMA2_LAYER).is_err());
    assert!(supported_schema2_media_type(DOCKER_V2_SCHEMA2_LAYER).is_ok());
    assert!(supported_schema2_media_type(OCI_LAYER_GZIP).is_err());
}

#[test]
fn test_supported_media_type_covers_both_catalogs() {
    assert!(supported_media_type(OCI_LAYER_ZSTD).is_ok());
    assert!(supported_media_type(DOCKER_V2_SCHEMA1_SIGNED).is_ok());
    assert!(supported_media_type(OCI_IMAGE_INDEX).is_ok());
    assert!(supported_media_type("text/plain").is_err());
}

#[test]
fn test_is_schema1() {
    assert!(is_schema1(DOCKER_V2_SCHEMA1));
    assert!(is_schema1(DOCKER_V2_SCHEMA1_SIGNED));
    assert!(!is_schema1(DOCKER_V2_SCHEMA2));
}

#[test]
fn test_guess_media_type_prefers_declared_type() {
    let manifest = br#"{"schemaVersion": 2, "mediaType": "application/vnd.docker.distribution.manifest.v2+json"}"#;
    assert_eq!(guess_media_type(manifest), DOCKER_V2_SCHEMA2);
}

#[test]
fn test_guess_media_type_schema1() {
    let unsigned = br#"{"schemaVersion": 1, "name": "library/busybox", "fsLayers": []}"#;
    assert_eq!(guess_media_type(unsigned), DOCKER_V2_SCHEMA1);

    let signed = br#"{"schemaVersion": 1, "signatures": [{"signature": "x"}]}"#;
    assert_eq!(guess_media_type(signed), DOCKER_V2_SCHEMA1_SIGNED);
}

#[test]
fn test_guess_media_type_oci_without_media_type() {
    let manifest = br#"{
        "schemaVersion": 2,
        "config": {"mediaType": "application/vnd.oci.image.config.v1+json", "size": 1, "digest": "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"},
        "layers": []
    }"#;
    assert_eq!(guess_media_type(manifest), OCI_IMAGE_MANIFEST);
}

#[test]
fn test_guess_media_type_index_without_media_type() {
    let manifest = br#"{"schemaVersion": 2, "manifests": []}"#;
    assert_eq!(guess_media_type(manifest), OCI_IMAGE_INDEX);
}

#[test]
fn test_guess_media_type_invalid_input() {
    assert_eq!(guess_media_type(b"not json"), "");
    assert_eq!(guess_media_type(br#"{"schemaVersion": 3}"#), "");
}
