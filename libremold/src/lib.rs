//! remold - Container Image Manifest Library
//!
//! remold parses container image manifests in the three formats found in
//! registries (OCI image manifest, Docker schema 2 and Docker schema 1),
//! answers uniform queries about them and converts between them.
//!
//! # Quick Start
//!
//! ```no_run
//! use libremold::{GenericManifest, ManifestUpdateOptions, media_type};
//!
//! # async fn run() -> libremold::Result<()> {
//! let bytes = std::fs::read("manifest.json").expect("manifest file");
//! let manifest = GenericManifest::from_blob(&bytes, None)?;
//!
//! for layer in manifest.layer_infos() {
//!     println!("{} ({} bytes)", layer.info.digest, layer.info.size);
//! }
//!
//! let options = ManifestUpdateOptions {
//!     target_media_type: Some(media_type::DOCKER_V2_SCHEMA2.to_string()),
//!     ..Default::default()
//! };
//! let converted = manifest.updated_image(&options).await?;
//! println!("{}", String::from_utf8_lossy(&converted.serialize()?));
//! # Ok(())
//! # }
//! ```
//!
//! # Main Types
//!
//! - [`GenericManifest`] - A manifest of any supported schema
//! - [`ManifestUpdateOptions`] - Layer replacements, embedded reference and target format
//! - [`BlobSource`] / [`BlobDestination`] - Caller-supplied blob access
//! - [`BlobInfo`] / [`LayerInfo`] - Schema-independent descriptors
//! - [`ImageInspectInfo`] - Schema-independent image summary
//! - [`Reference`] - Image references embedded in schema 1 manifests
//! - [`Digest`] - Content digest validation and handling
//!
//! The library never touches the network or the filesystem on its own; blobs
//! are read and written only through the capabilities passed in.

#![warn(clippy::all)]

/// Returns the libremold crate version.
///
/// This is useful for version reporting in CLI tools and debugging.
///
/// # Examples
///
/// ```
/// let version = libremold::version();
/// assert!(!version.is_empty());
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

// Re-export commonly used types for convenience
pub use blob::{BlobInfo, LayerInfo};
pub use compression::{CompressionAlgorithm, CompressionOperation};
pub use config::Config;
pub use digest::Digest;
pub use error::{RemoldError, Result};
pub use image::{
    BlobDestination, BlobReader, BlobSource, GenericManifest, ImageInspectInfo,
    ManifestUpdateOptions,
};
pub use reference::Reference;

// Lower-level modules (hidden from docs but still public)
#[doc(hidden)]
pub mod blob;
#[doc(hidden)]
pub mod compression;
#[doc(hidden)]
pub mod config;
#[doc(hidden)]
pub mod digest;
#[doc(hidden)]
pub mod error;
#[doc(hidden)]
pub mod format;
#[doc(hidden)]
pub mod image;
#[doc(hidden)]
pub mod manifest;
pub mod media_type;
#[doc(hidden)]
pub mod reference;
