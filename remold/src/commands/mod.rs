use libremold::{GenericManifest, RemoldError, Result};
use std::path::Path;

/// Convert command handlers
pub mod convert;

/// Inspect command handlers
pub mod inspect;

/// Layers command handlers
pub mod layers;

/// Media type command handlers
pub mod media_type;

/// Version command handlers
pub mod version;


/// Reads a file the user pointed at.
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        RemoldError::retrieval_with_source(format!("reading {}", path.display()), e)
    })
}

/// Parses a manifest file, attaching the config blob file when one is given.
///
/// The config blob must match the manifest's config digest.
pub(crate) fn load_manifest(path: &Path, config_blob: Option<&Path>) -> Result<GenericManifest> {
    let manifest = GenericManifest::from_blob(&read_file(path)?, None)?;
    let Some(config_path) = config_blob else {
        return Ok(manifest);
    };

    let blob = read_file(config_path)?;
    if let Some(info) = manifest.config_info() {
        info.digest.verify(&blob)?;
    }
    Ok(manifest.with_config_blob(blob))
}
