//! Basic usage example for the remold library.
//!
//! This example parses a manifest file, lists its layers and prints the
//! manifest converted to every format it can be expressed in.
//!
//! Run with: cargo run --example basic_usage -- path/to/manifest.json

use libremold::media_type::{DOCKER_V2_SCHEMA2, OCI_IMAGE_MANIFEST};
use libremold::{GenericManifest, ManifestUpdateOptions};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: basic_usage <manifest.json>");
        return Ok(());
    };

    let bytes = std::fs::read(&path)?;
    let manifest = GenericManifest::from_blob(&bytes, None)?;
    println!("✓ Parsed {} ({})\n", path, manifest.manifest_media_type());

    for (i, layer) in manifest.layer_infos().iter().enumerate() {
        let marker = if layer.empty_layer { " (empty)" } else { "" };
        println!("  {:>2}. {}{}", i + 1, layer.info.digest, marker);
    }
    println!();

    for target in [OCI_IMAGE_MANIFEST, DOCKER_V2_SCHEMA2] {
        let options = ManifestUpdateOptions {
            target_media_type: Some(target.to_string()),
            ..Default::default()
        };
        match manifest.updated_image(&options).await {
            Ok(converted) => {
                println!("✓ As {}:", target);
                println!("{}\n", String::from_utf8_lossy(&converted.serialize()?));
            }
            Err(e) if e.is_unsupported_conversion() => {
                println!("✗ Cannot express as {}: {}\n", target, e);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
