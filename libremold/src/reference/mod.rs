//! Image references embedded in schema 1 manifests.
//!
//! Parsing and Docker Hub normalization come from `oci_spec::distribution`.
//! Schema 1 only records the repository path and the tag, so that is all a
//! [`Reference`] hands out.

use crate::error::{Result, RemoldError};
use oci_spec::distribution::Reference as OciReference;
use std::fmt;
use std::str::FromStr;


/// A parsed image reference such as `quay.io/team/httpd:2.4`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference(OciReference);

impl FromStr for Reference {
    type Err = RemoldError;

    fn from_str(s: &str) -> Result<Self> {
        OciReference::from_str(s).map(Reference).map_err(|e| {
            RemoldError::validation_with_source(format!("invalid image reference {:?}", s), e)
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Reference {
    /// Returns the `name` and `tag` a schema 1 manifest stores for this
    /// reference.
    ///
    /// The registry is dropped and a missing tag becomes `""`; digests have no
    /// place in schema 1.
    pub fn schema1_name_and_tag(&self) -> (&str, &str) {
        (self.0.repository(), self.0.tag().unwrap_or_default())
    }
}
