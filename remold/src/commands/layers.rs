use crate::context::AppContext;
use crate::format::{self, Formattable, OutputFormat};
use libremold::format::format_blob_size;
use libremold::{LayerInfo, Result};
use serde::Serialize;
use std::path::Path;
use tabled::Tabled;

#[cfg(test)]
#[path = "layers_tests.rs"]
mod tests;

/// One row of the layer table, base layer first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct LayerRow {
    #[tabled(rename = "#")]
    pub index: usize,

    #[tabled(rename = "DIGEST")]
    pub digest: String,

    #[tabled(rename = "MEDIA TYPE")]
    pub media_type: String,

    /// Size formatted for display
    #[tabled(rename = "SIZE")]
    #[serde(skip)]
    pub size_display: String,

    /// Raw size, `-1` when the manifest does not record it
    #[tabled(skip)]
    pub size: i64,

    #[tabled(rename = "EMPTY")]
    pub empty_layer: bool,
}

impl LayerRow {
    pub fn new(index: usize, layer: &LayerInfo) -> Self {
        Self {
            index,
            digest: layer.info.digest.to_string(),
            media_type: layer.info.media_type.clone(),
            size_display: format_blob_size(layer.info.size),
            size: layer.info.size,
            empty_layer: layer.empty_layer,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct LayerTable(pub Vec<LayerRow>);

impl Formattable for LayerTable {
    fn format_pretty(&self) -> String {
        use tabled::{Table, settings::Style};
        Table::new(&self.0).with(Style::empty()).to_string()
    }
}

/// Lists the layers of the manifest at `manifest_path`.
pub fn layers(manifest_path: &Path) -> Result<LayerTable> {
    let manifest = super::load_manifest(manifest_path, None)?;
    let rows = manifest
        .layer_infos()
        .iter()
        .enumerate()
        .map(|(i, layer)| LayerRow::new(i + 1, layer))
        .collect();
    Ok(LayerTable(rows))
}

/// Handle the layers command
pub fn handle_layers(ctx: &AppContext, manifest_path: &Path, quiet: bool, format: OutputFormat) {
    let table = match layers(manifest_path) {
        Ok(table) => table,
        Err(e) => {
            format::error(ctx, &e.to_string());
            std::process::exit(1);
        }
    };

    // Handle quiet mode
    if quiet {
        for row in &table.0 {
            println!("{}", row.digest);
        }
        return;
    }

    match format::format_output(&table, format) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            format::error(ctx, &e);
            std::process::exit(1);
        }
    }
}
