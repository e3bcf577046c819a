//! Shared read/decode path for on-disk artifacts.

use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::debug;

use modelpack_shared::{ArtifactKind, ModelPackError, Result};

/// Read the raw bytes of an artifact, mapping a missing path to `ArtifactNotFound`.
pub fn read_artifact(kind: ArtifactKind, path: &Path) -> Result<Vec<u8>> {
    match std::fs::read(path) {
        Ok(bytes) => {
            debug!(%kind, path = %path.display(), size = bytes.len(), "read artifact");
            Ok(bytes)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            Err(ModelPackError::artifact_not_found(kind, path))
        }
        Err(e) if e.kind() == ErrorKind::IsADirectory => Err(ModelPackError::artifact_corrupt(
            kind,
            path,
            "path is a directory",
        )),
        Err(e) => Err(ModelPackError::io(path, e)),
    }
}

/// Decode JSON artifact bytes, mapping any failure to `ArtifactCorrupt`.
pub fn decode_artifact<T: DeserializeOwned>(
    kind: ArtifactKind,
    path: &Path,
    bytes: &[u8],
) -> Result<T> {
    serde_json::from_slice(bytes)
        .map_err(|e| ModelPackError::artifact_corrupt(kind, path, e.to_string()))
}

/// Reject artifacts written by an unknown format revision.
pub fn check_format_version(
    kind: ArtifactKind,
    path: &Path,
    found: u32,
    supported: u32,
) -> Result<()> {
    if found != supported {
        return Err(ModelPackError::artifact_corrupt(
            kind,
            path,
            format!("unsupported format_version {found} (expected {supported})"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "modelpack-loader-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = temp_dir();
        let err = read_artifact(ArtifactKind::Vocabulary, &tmp.join("nope.dat")).unwrap_err();
        assert!(matches!(
            err,
            ModelPackError::ArtifactNotFound {
                kind: ArtifactKind::Vocabulary,
                ..
            }
        ));
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn directory_is_not_an_artifact() {
        let tmp = temp_dir();
        let err = read_artifact(ArtifactKind::ConceptDatabase, &tmp).unwrap_err();
        assert!(matches!(
            err,
            ModelPackError::ArtifactCorrupt { .. } | ModelPackError::Io { .. }
        ));
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn garbage_is_corrupt() {
        let err = decode_artifact::<serde_json::Value>(
            ArtifactKind::ConceptDatabase,
            Path::new("cdb.dat"),
            b"\x00\x01not json",
        )
        .unwrap_err();
        assert!(matches!(err, ModelPackError::ArtifactCorrupt { .. }));
    }

    #[test]
    fn version_mismatch_is_corrupt() {
        let err =
            check_format_version(ArtifactKind::Vocabulary, Path::new("v.dat"), 7, 1).unwrap_err();
        assert!(err.to_string().contains("unsupported format_version 7"));
    }
}
