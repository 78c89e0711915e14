use crate::context::AppContext;
use crate::format::{self, Formattable, OutputFormat};
use libremold::compression::{LayerKind, OCI1_COMPRESSION, SCHEMA2_COMPRESSION};
use libremold::media_type::{
    self, DOCKER_V2_SCHEMA2, OCI_IMAGE_INDEX, OCI_IMAGE_MANIFEST, DOCKER_V2_LIST, is_schema1,
};
use serde::Serialize;

#[cfg(test)]
#[path = "media_type_tests.rs"]
mod tests;

/// What remold knows about a media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaTypeInfo {
    pub media_type: String,
    pub supported: bool,
    /// Catalogs listing the type: `oci`, `docker`.
    pub catalogs: Vec<&'static str>,
    /// `manifest`, `index`, `layer`, or `other`.
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<&'static str>,
}

impl Formattable for MediaTypeInfo {
    fn format_pretty(&self) -> String {
        let mut output = format!(
            "{}\n  supported: {}\n  role:      {}\n",
            self.media_type,
            if self.supported { "yes" } else { "no" },
            self.role
        );
        if !self.catalogs.is_empty() {
            output.push_str(&format!("  catalogs:  {}\n", self.catalogs.join(", ")));
        }
        if let Some(kind) = self.layer_kind {
            output.push_str(&format!(
                "  layer:     {} ({})\n",
                kind,
                self.compression.unwrap_or("uncompressed")
            ));
        }
        output
    }
}

/// Classifies `value` against the media type catalogs and compression tables.
pub fn describe(value: &str) -> MediaTypeInfo {
    let mut catalogs = Vec::new();
    if media_type::supported_oci1_media_type(value).is_ok() {
        catalogs.push("oci");
    }
    if media_type::supported_schema2_media_type(value).is_ok() {
        catalogs.push("docker");
    }

    let layer = OCI1_COMPRESSION
        .classify(value)
        .or_else(|| SCHEMA2_COMPRESSION.classify(value));
    let role = if value == OCI_IMAGE_MANIFEST || value == DOCKER_V2_SCHEMA2 || is_schema1(value) {
        "manifest"
    } else if value == OCI_IMAGE_INDEX || value == DOCKER_V2_LIST {
        "index"
    } else if layer.is_some() {
        "layer"
    } else {
        "other"
    };

    MediaTypeInfo {
        media_type: value.to_string(),
        supported: media_type::supported_media_type(value).is_ok(),
        catalogs,
        role,
        layer_kind: layer.map(|(kind, _)| match kind {
            LayerKind::Regular => "regular",
            LayerKind::NonDistributable => "non-distributable",
        }),
        compression: layer.and_then(|(_, algorithm)| algorithm.map(|a| a.name())),
    }
}

/// Handle the media-type command
pub fn handle_media_type(ctx: &AppContext, value: &str, format: OutputFormat) {
    let info = describe(value);
    match format::format_output(&info, format) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => {
            format::error(ctx, &e);
            std::process::exit(1);
        }
    }
    if !info.supported {
        if let Err(e) = media_type::supported_media_type(value) {
            format::error(ctx, &e.to_string());
        }
        std::process::exit(1);
    }
}
