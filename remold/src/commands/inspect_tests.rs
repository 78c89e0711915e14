use super::*;
use crate::commands::tests::{SCHEMA1, Workspace};

#[tokio::test]
async fn test_inspect_reads_config_from_blob_dir() {
    let ws = Workspace::oci1();
    let view = inspect(&ws.manifest, Some(&ws.blobs), None).await.unwrap();
    assert_eq!(view.media_type, libremold::media_type::OCI_IMAGE_MANIFEST);
    assert_eq!(view.info.architecture, "amd64");
    assert_eq!(view.info.layers.len(), 5);
}

#[tokio::test]
async fn test_inspect_with_config_file() {
    let ws = Workspace::oci1();
    let view = inspect(&ws.manifest, None, Some(&ws.config)).await.unwrap();
    assert_eq!(view.info.docker_version, "1.12.1");
}

#[tokio::test]
async fn test_inspect_without_config_fails() {
    let ws = Workspace::oci1();
    assert!(inspect(&ws.manifest, None, None).await.is_err());
}

#[tokio::test]
async fn test_inspect_schema1_needs_no_blobs() {
    let ws = Workspace::oci1();
    let path = ws.file("schema1.json", SCHEMA1);
    let view = inspect(&path, None, None).await.unwrap();
    assert_eq!(view.info.tag, "latest");
    assert_eq!(view.info.layers.len(), 15);
}

#[tokio::test]
async fn test_pretty_output() {
    let ws = Workspace::oci1();
    let view = inspect(&ws.manifest, Some(&ws.blobs), None).await.unwrap();
    let pretty = view.format_pretty();
    assert!(pretty.contains("linux/amd64"));
    assert!(pretty.contains("Layers (5):"));
    assert!(pretty.contains("HTTPD_VERSION=2.4.23"));
    assert!(pretty.contains("2016-09-23T23:20:45"));
}

#[tokio::test]
async fn test_json_output_is_flat() {
    let ws = Workspace::oci1();
    let view = inspect(&ws.manifest, Some(&ws.blobs), None).await.unwrap();
    let json = format::format_output(&view, OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["architecture"], "amd64");
    assert_eq!(value["media_type"], libremold::media_type::OCI_IMAGE_MANIFEST);
}
