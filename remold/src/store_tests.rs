use super::*;
use libremold::blob::{GZIPPED_EMPTY_LAYER, GZIPPED_EMPTY_LAYER_DIGEST};
use std::str::FromStr;
use tokio::io::AsyncReadExt;

#[test]
fn test_blob_path_layout() {
    let dir = BlobDir::new("/images/httpd");
    let digest = Digest::from_str(GZIPPED_EMPTY_LAYER_DIGEST).unwrap();
    assert_eq!(
        dir.blob_path(&digest),
        PathBuf::from(
            "/images/httpd/blobs/sha256/a3ed95caeb02ffe68cdd9fd84406680ae93d633cb16422d00e8a7c22955b46d4"
        )
    );
}

#[tokio::test]
async fn test_put_then_get() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = BlobDir::new(tmp.path());
    let info = BlobInfo::gzipped_empty_layer().unwrap();

    assert!(!dir.has_blob(&info.digest).await.unwrap());
    let stored = dir.put_blob(&GZIPPED_EMPTY_LAYER, &info).await.unwrap();
    assert_eq!(stored.digest, info.digest);
    assert_eq!(stored.size, 32);
    assert!(dir.has_blob(&info.digest).await.unwrap());

    let (mut reader, size) = dir.get_blob(&info.digest).await.unwrap();
    let mut content = Vec::new();
    reader.read_to_end(&mut content).await.unwrap();
    assert_eq!(size, 32);
    assert_eq!(content, GZIPPED_EMPTY_LAYER);
}

#[tokio::test]
async fn test_put_rejects_mismatched_content() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = BlobDir::new(tmp.path());
    let info = BlobInfo::gzipped_empty_layer().unwrap();

    let err = dir.put_blob(b"not the empty layer", &info).await.unwrap_err();
    assert!(matches!(err, RemoldError::Verification { .. }));
    assert!(!dir.has_blob(&info.digest).await.unwrap());
}

#[tokio::test]
async fn test_missing_blob_is_retrieval_error() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = BlobDir::new(tmp.path());
    let digest = Digest::sha256(b"absent").unwrap();
    let err = match dir.get_blob(&digest).await {
        Ok(_) => panic!("blob should be missing"),
        Err(e) => e,
    };
    assert!(matches!(err, RemoldError::Retrieval { .. }));
    assert!(err.to_string().contains("not found"));
}

#[test]
fn test_reference_is_reported() {
    let reference = Reference::from_str("httpd-copy:latest").unwrap();
    let dir = BlobDir::new("/tmp").with_reference(Some(reference.clone()));
    assert_eq!(BlobDestination::reference(&dir), Some(reference));
}
