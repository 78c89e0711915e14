//! Error types for remold
//!
//! Every fallible operation in the library returns [`RemoldError`]. The variants
//! follow the failure classes of manifest handling: parsing, conversions that a
//! target schema cannot express, structural mismatches, content verification and
//! failures reported by the blob source or destination supplied by the caller.

use thiserror::Error;


type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for remold operations
#[derive(Error, Debug)]
pub enum RemoldError {
    /// Malformed manifest or config JSON, missing or ambiguous fields
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The requested target schema or direction is not supported
    #[error("Unsupported conversion: {message}")]
    UnsupportedConversion { message: String },

    /// A layer compression the target schema cannot express (e.g. zstd in Docker formats)
    #[error("Layer compression incompatible: {message}")]
    LayerCompressionIncompatible { message: String },

    /// Layer counts or history entries do not line up
    #[error("Structural mismatch: {message}")]
    Structural { message: String },

    /// Content does not match its digest
    #[error("Verification failed: {message}")]
    Verification { message: String },

    /// The blob source is missing or failed
    #[error("Blob retrieval error: {message}")]
    Retrieval {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// The blob destination failed
    #[error("Blob commit error: {message}")]
    Commit {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Validation errors (invalid digest, reference, media type)
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    /// Configuration errors (invalid config file, missing settings)
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        path: Option<String>,
        #[source]
        source: Option<BoxedSource>,
    },
}

/// Result type alias for remold operations
pub type Result<T> = std::result::Result<T, RemoldError>;

impl RemoldError {
    /// Creates a new parse error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libremold::error::RemoldError;
    ///
    /// let err = RemoldError::parse("missing config descriptor");
    /// assert!(matches!(err, RemoldError::Parse { .. }));
    /// ```
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new parse error with a source error.
    pub fn parse_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Parse {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new unsupported conversion error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libremold::error::RemoldError;
    ///
    /// let err = RemoldError::unsupported("cannot convert schema1 to OCI");
    /// assert!(err.is_unsupported_conversion());
    /// ```
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        Self::UnsupportedConversion {
            message: message.into(),
        }
    }

    /// Creates a new layer compression incompatibility error.
    pub fn compression_incompatible<S: Into<String>>(message: S) -> Self {
        Self::LayerCompressionIncompatible {
            message: message.into(),
        }
    }

    /// Creates a new structural mismatch error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libremold::error::RemoldError;
    ///
    /// let err = RemoldError::structural("layer count changed from 5 to 6");
    /// assert!(matches!(err, RemoldError::Structural { .. }));
    /// ```
    pub fn structural<S: Into<String>>(message: S) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }

    /// Creates a new verification error.
    pub fn verification<S: Into<String>>(message: S) -> Self {
        Self::Verification {
            message: message.into(),
        }
    }

    /// Creates a new retrieval error.
    pub fn retrieval<S: Into<String>>(message: S) -> Self {
        Self::Retrieval {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new retrieval error with a source error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libremold::error::RemoldError;
    /// use std::io;
    ///
    /// let io_err = io::Error::new(io::ErrorKind::UnexpectedEof, "stream closed");
    /// let err = RemoldError::retrieval_with_source("reading config blob", io_err);
    /// assert!(matches!(err, RemoldError::Retrieval { .. }));
    /// ```
    pub fn retrieval_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Retrieval {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new commit error.
    pub fn commit<S: Into<String>>(message: S) -> Self {
        Self::Commit {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new commit error with a source error.
    pub fn commit_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Commit {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new validation error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libremold::error::RemoldError;
    ///
    /// let err = RemoldError::validation("invalid digest format");
    /// assert!(matches!(err, RemoldError::Validation { .. }));
    /// ```
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new validation error with a source error.
    pub fn validation_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Validation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new configuration error.
    ///
    /// # Examples
    ///
    /// ```
    /// use libremold::error::RemoldError;
    ///
    /// let err = RemoldError::config("invalid config file", Some("/path/to/config.yaml"));
    /// assert!(matches!(err, RemoldError::Config { .. }));
    /// ```
    pub fn config<S: Into<String>>(message: S, path: Option<S>) -> Self {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: None,
        }
    }

    /// Creates a new configuration error with a source error.
    pub fn config_with_source<S, E>(message: S, path: Option<S>, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Config {
            message: message.into(),
            path: path.map(|p| p.into()),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true for errors meaning "the target format cannot express this image".
    ///
    /// Callers that can choose between several target formats use this to move on
    /// to the next candidate instead of failing the whole operation.
    pub fn is_unsupported_conversion(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedConversion { .. } | Self::LayerCompressionIncompatible { .. }
        )
    }
}

impl From<config::ConfigError> for RemoldError {
    fn from(err: config::ConfigError) -> Self {
        RemoldError::config_with_source("Failed to build configuration", None, err)
    }
}
