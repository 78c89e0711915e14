use crate::context::{AppContext, VerbosityLevel};
use crate::format;
use crate::store::BlobDir;
use libremold::{
    BlobDestination, BlobSource, GenericManifest, ManifestUpdateOptions, Reference, RemoldError,
    Result,
};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

#[cfg(test)]
#[path = "convert_tests.rs"]
mod tests;

/// Arguments of the convert command.
#[derive(Debug, Clone, Copy)]
pub struct ConvertRequest<'a> {
    pub manifest: &'a Path,
    /// Target manifest media type; falls back to `conversion.default_target`.
    pub target: Option<&'a str>,
    /// OCI-layout style blob directory, used as source and destination.
    pub blobs: Option<&'a Path>,
    pub config_blob: Option<&'a Path>,
    /// Reference to embed in schema 1 manifests.
    pub name: Option<&'a str>,
}

impl<'a> ConvertRequest<'a> {
    pub fn new(manifest: &'a Path) -> Self {
        Self {
            manifest,
            target: None,
            blobs: None,
            config_blob: None,
            name: None,
        }
    }
}

/// Converts the manifest described by `request`.
pub async fn convert(ctx: &AppContext, request: &ConvertRequest<'_>) -> Result<GenericManifest> {
    let target = request
        .target
        .or(ctx.config.conversion.default_target.as_deref())
        .ok_or_else(|| {
            RemoldError::validation(
                "no target media type, pass --to or set conversion.default_target",
            )
        })?;

    let manifest = super::load_manifest(request.manifest, request.config_blob)?;
    let reference = request.name.map(Reference::from_str).transpose()?;
    if let Some(reference) = &reference {
        if manifest.embedded_reference_conflicts(reference) {
            warn!(%reference, "manifest embeds a different reference, it will be rewritten");
        }
    }

    let store = request
        .blobs
        .map(|dir| BlobDir::new(dir).with_reference(reference.clone()));
    let options = ManifestUpdateOptions {
        embedded_reference: reference,
        target_media_type: Some(target.to_string()),
        source: store.as_ref().map(|s| s as &dyn BlobSource),
        destination: store.as_ref().map(|s| s as &dyn BlobDestination),
        ..ManifestUpdateOptions::default()
    };
    if manifest.updated_image_needs_layer_diff_ids(&options) {
        return Err(RemoldError::unsupported(format!(
            "converting {} to {} needs the diff IDs of the uncompressed layers, \
             which cannot be computed from the manifest alone",
            manifest.manifest_media_type(),
            target
        )));
    }

    manifest.updated_image(&options).await
}

/// Handle the convert command
pub async fn handle_convert(ctx: &AppContext, request: &ConvertRequest<'_>, output: Option<&Path>) {
    let converted = match convert(ctx, request).await {
        Ok(converted) => converted,
        Err(e) => {
            format::error(ctx, &e.to_string());
            std::process::exit(1);
        }
    };

    let bytes = match converted.serialize() {
        Ok(bytes) => bytes,
        Err(e) => {
            format::error(ctx, &e.to_string());
            std::process::exit(1);
        }
    };

    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, &bytes) {
                format::error(ctx, &format!("writing {}: {}", path.display(), e));
                std::process::exit(1);
            }
            format::success(
                ctx,
                &format!(
                    "Wrote {} manifest to {}",
                    converted.manifest_media_type(),
                    path.display()
                ),
            );
        }
        None => {
            println!("{}", String::from_utf8_lossy(&bytes));
            format::print(
                ctx,
                VerbosityLevel::Verbose,
                &format!("Converted to {}", converted.manifest_media_type()),
            );
        }
    }
}
