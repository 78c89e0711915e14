//! OCI Content Digest validation and manipulation.
//!
//! This module provides a wrapper around the `oci_spec::image::Digest` type
//! to integrate with remold's error handling, plus the content verification
//! used whenever a blob is read back from a caller-supplied source.

use crate::error::{Result, RemoldError};
use oci_spec::image::Digest as OciDigest;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest as Sha2Digest, Sha256, Sha384, Sha512};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;


/// Represents a content digest, wrapping the `oci_spec::image::Digest` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest(OciDigest);

impl FromStr for Digest {
    type Err = RemoldError;

    fn from_str(s: &str) -> Result<Self> {
        let oci_digest = OciDigest::from_str(s).map_err(|e| RemoldError::Validation {
            message: format!("Invalid digest format: {}", e),
            source: Some(Box::new(e)),
        })?;
        Ok(Digest(oci_digest))
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Hash for Digest {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Serialize for Digest {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Digest::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl Digest {
    /// Computes the sha256 digest of `bytes`.
    ///
    /// # Examples
    ///
    /// ```
    /// use libremold::Digest;
    ///
    /// let digest = Digest::sha256(b"").unwrap();
    /// assert_eq!(
    ///     digest.to_string(),
    ///     "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    /// );
    /// ```
    pub fn sha256(bytes: &[u8]) -> Result<Self> {
        let hex = format!("{:x}", Sha256::digest(bytes));
        Digest::from_str(&format!("sha256:{}", hex))
    }

    /// Returns the algorithm part of the digest (e.g. `sha256`).
    pub fn algorithm(&self) -> &str {
        self.0.algorithm().as_ref()
    }

    /// Returns the encoded (hex) part of the digest.
    pub fn hex(&self) -> &str {
        self.0.digest()
    }

    /// Checks that `bytes` hash to this digest.
    ///
    /// Returns a verification error on mismatch and a validation error when the
    /// digest uses an algorithm this library cannot compute.
    pub fn verify(&self, bytes: &[u8]) -> Result<()> {
        let computed = match self.algorithm() {
            "sha256" => format!("{:x}", Sha256::digest(bytes)),
            "sha384" => format!("{:x}", Sha384::digest(bytes)),
            "sha512" => format!("{:x}", Sha512::digest(bytes)),
            other => {
                return Err(RemoldError::validation(format!(
                    "Unsupported digest algorithm: {}",
                    other
                )));
            }
        };

        tracing::trace!(expected = %self, %computed, "verifying blob digest");
        if computed != self.hex() {
            return Err(RemoldError::verification(format!(
                "Blob digest mismatch: expected {}, computed {}:{}",
                self,
                self.algorithm(),
                computed
            )));
        }
        Ok(())
    }
}
