use crate::context::{AppContext, VerbosityLevel};
use crate::format::{self, Formattable, OutputFormat};
use crate::store::BlobDir;
use libremold::format::format_created;
use libremold::{BlobSource, ImageInspectInfo, Result};
use serde::Serialize;
use std::path::Path;

#[cfg(test)]
#[path = "inspect_tests.rs"]
mod tests;

/// Inspection result together with the manifest format it came from.
#[derive(Debug, Serialize)]
pub struct InspectView {
    pub media_type: String,
    #[serde(flatten)]
    pub info: ImageInspectInfo,
}

impl Formattable for InspectView {
    fn format_pretty(&self) -> String {
        let info = &self.info;
        let mut platform = format!("{}/{}", info.os, info.architecture);
        if !info.variant.is_empty() {
            platform.push('/');
            platform.push_str(&info.variant);
        }
        let created = format_created(info.created.as_ref());
        let or_na = |s: &str| if s.is_empty() { "N/A".to_string() } else { s.to_string() };

        let mut output = format!(
            "Media type:     {}\nTag:            {}\nCreated:        {}\nPlatform:       {}\nAuthor:         {}\nDocker version: {}\n",
            self.media_type,
            or_na(&info.tag),
            created,
            platform,
            or_na(&info.author),
            or_na(&info.docker_version),
        );

        output.push_str(&format!("\nLayers ({}):\n", info.layers.len()));
        for layer in &info.layers {
            output.push_str(&format!("  {}\n", layer));
        }
        if !info.env.is_empty() {
            output.push_str("\nEnv:\n");
            for var in &info.env {
                output.push_str(&format!("  {}\n", var));
            }
        }
        if !info.labels.is_empty() {
            output.push_str("\nLabels:\n");
            for (key, value) in &info.labels {
                output.push_str(&format!("  {}={}\n", key, value));
            }
        }
        output
    }
}

/// Inspects the manifest at `manifest_path`.
///
/// The config blob comes from `config_blob` when given, else from `blobs`.
pub async fn inspect(
    manifest_path: &Path,
    blobs: Option<&Path>,
    config_blob: Option<&Path>,
) -> Result<InspectView> {
    let manifest = super::load_manifest(manifest_path, config_blob)?;
    let store = blobs.map(BlobDir::new);
    let source = store.as_ref().map(|s| s as &dyn BlobSource);
    let info = manifest.inspect(source).await?;
    Ok(InspectView {
        media_type: manifest.manifest_media_type().to_string(),
        info,
    })
}

/// Handle the inspect command
pub async fn handle_inspect(
    ctx: &AppContext,
    manifest_path: &Path,
    blobs: Option<&Path>,
    config_blob: Option<&Path>,
    format: OutputFormat,
) {
    format::print(
        ctx,
        VerbosityLevel::Verbose,
        &format!("Inspecting {}", manifest_path.display()),
    );

    let view = match inspect(manifest_path, blobs, config_blob).await {
        Ok(view) => view,
        Err(e) => {
            format::error(ctx, &e.to_string());
            std::process::exit(1);
        }
    };

    match format::format_output(&view, format) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => {
            format::error(ctx, &e);
            std::process::exit(1);
        }
    }
}
