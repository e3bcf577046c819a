//! Error types for model-pack assembly.
//!
//! Library crates use [`ModelPackError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Every variant is fatal to the invocation that produced it: nothing in the
//! pipeline retries or recovers.

use std::path::PathBuf;

use crate::types::ArtifactKind;

/// Top-level error type for all model-pack operations.
#[derive(Debug, thiserror::Error)]
pub enum ModelPackError {
    /// The artifact path does not resolve to a file.
    #[error("{kind} not found at {path:?}")]
    ArtifactNotFound { kind: ArtifactKind, path: PathBuf },

    /// The stored bytes could not be decoded into a valid artifact.
    #[error("{kind} at {path:?} is corrupt: {message}")]
    ArtifactCorrupt {
        kind: ArtifactKind,
        path: PathBuf,
        message: String,
    },

    /// A section referenced by the overlay is absent from the configuration.
    #[error("configuration section '{section}' is missing")]
    ConfigSectionMissing { section: String },

    /// A key referenced by the overlay is absent from an existing section.
    #[error("configuration key '{section}.{key}' is missing")]
    ConfigKeyMissing { section: String, key: String },

    /// The output directory could not be created or the bundle could not be written.
    #[error("output path {path:?} is not writable: {source}")]
    OutputPathUnwritable {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The composed pack was rejected or could not be encoded.
    #[error("serialization error: {message}")]
    Serialization { message: String },

    /// Application configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad pack name, checksum mismatch, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ModelPackError>;

impl ModelPackError {
    /// Artifact missing at `path`.
    pub fn artifact_not_found(kind: ArtifactKind, path: impl Into<PathBuf>) -> Self {
        Self::ArtifactNotFound {
            kind,
            path: path.into(),
        }
    }

    /// Artifact at `path` failed to decode.
    pub fn artifact_corrupt(
        kind: ArtifactKind,
        path: impl Into<PathBuf>,
        msg: impl Into<String>,
    ) -> Self {
        Self::ArtifactCorrupt {
            kind,
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn section_missing(section: impl Into<String>) -> Self {
        Self::ConfigSectionMissing {
            section: section.into(),
        }
    }

    pub fn key_missing(section: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ConfigKeyMissing {
            section: section.into(),
            key: key.into(),
        }
    }

    /// Wrap an I/O failure on the output side.
    pub fn unwritable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputPathUnwritable {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error from any displayable message.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
        }
    }

    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = ModelPackError::section_missing("linking");
        assert_eq!(err.to_string(), "configuration section 'linking' is missing");

        let err = ModelPackError::key_missing("general", "spell-check-enabled");
        assert!(err.to_string().contains("general.spell-check-enabled"));

        let err = ModelPackError::artifact_not_found(ArtifactKind::ConceptDatabase, "/x/cdb.dat");
        assert!(err.to_string().starts_with("concept database not found"));
    }

    #[test]
    fn unwritable_keeps_source() {
        let source = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ModelPackError::unwritable("/readonly/modelpack", source);
        assert!(err.to_string().contains("denied"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
