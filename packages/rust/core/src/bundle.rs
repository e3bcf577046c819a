//! Model pack bundle codec.
//!
//! A bundle is a gzip-compressed tar archive written deterministically
//! (zero mtimes, fixed owner and mode) so that identical inputs give
//! identical component entries. Entry order is fixed:
//!
//! ```text
//! manifest.json
//! config.json
//! cdb.json
//! vocab.json
//! ```

use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::{Compression, GzBuilder};
use tar::{Archive, Builder, Header, HeaderMode};
use tracing::{debug, instrument};

use modelpack_artifacts::{ConceptDatabase, Configuration, Vocabulary};
use modelpack_shared::{ArtifactKind, ModelPackError, PACK_SCHEMA_VERSION, PackManifest, Result};

pub const MANIFEST_ENTRY: &str = "manifest.json";
pub const CONFIG_ENTRY: &str = "config.json";
pub const CDB_ENTRY: &str = "cdb.json";
pub const VOCAB_ENTRY: &str = "vocab.json";

/// Component entries, in archive order.
pub const COMPONENT_ENTRIES: [&str; 3] = [CONFIG_ENTRY, CDB_ENTRY, VOCAB_ENTRY];

const ENTRY_OWNER: &str = "modelpack";

/// Largest entry size accepted when reading a bundle (4 GiB).
pub const MAX_ENTRY_BYTES: u64 = 1 << 32;

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Start a deterministic tar.gz stream over `writer`.
pub(crate) fn create_deterministic_tar<W: Write>(writer: W) -> Builder<GzEncoder<W>> {
    let encoder = GzBuilder::new()
        .mtime(0)
        .operating_system(255)
        .write(writer, Compression::best());

    let mut tar = Builder::new(encoder);
    tar.mode(HeaderMode::Deterministic);
    tar
}

/// Append one regular-file entry.
pub(crate) fn write_entry<T: Write>(
    tar: &mut Builder<T>,
    path: &str,
    data: &[u8],
) -> std::io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_path(path)?;
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_uid(0);
    header.set_gid(0);
    header.set_mtime(0);
    header.set_username(ENTRY_OWNER)?;
    header.set_groupname(ENTRY_OWNER)?;
    header.set_cksum();

    tar.append(&header, data)
}

/// Encode a component as pretty JSON.
pub(crate) fn encode_component<T: serde::Serialize>(entry: &str, value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(value)
        .map_err(|e| ModelPackError::serialization(format!("failed to encode {entry}: {e}")))
}

/// Write `entries` (name, bytes) as a complete bundle to `writer`.
///
/// Callers must put the manifest first.
pub(crate) fn write_bundle<W: Write>(writer: W, entries: &[(&str, &[u8])]) -> std::io::Result<W> {
    let mut tar = create_deterministic_tar(writer);
    for (name, data) in entries {
        write_entry(&mut tar, name, data)?;
        debug!(entry = *name, size = data.len(), "wrote bundle entry");
    }
    let encoder = tar.into_inner()?;
    encoder.finish()
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// A model pack read back from disk, with every checksum verified.
#[derive(Debug, Clone)]
pub struct LoadedPack {
    pub manifest: PackManifest,
    pub config: Configuration,
    pub cdb: ConceptDatabase,
    pub vocab: Vocabulary,
}

/// Open a bundle and decode all of its components.
///
/// Fails with `ArtifactNotFound` if `path` does not exist, `ArtifactCorrupt`
/// if the archive or an entry cannot be decoded, and `Validation` if an entry
/// is missing or does not match the manifest.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_pack(path: &Path) -> Result<LoadedPack> {
    let kind = ArtifactKind::ModelPack;
    let file = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ModelPackError::artifact_not_found(kind, path));
        }
        Err(e) => return Err(ModelPackError::io(path, e)),
    };

    let entries = read_entries(file)
        .map_err(|e| ModelPackError::artifact_corrupt(kind, path, e.to_string()))?;

    let manifest_bytes = entries
        .get(MANIFEST_ENTRY)
        .ok_or_else(|| ModelPackError::validation(format!("missing {MANIFEST_ENTRY}")))?;
    let manifest: PackManifest = serde_json::from_slice(manifest_bytes)
        .map_err(|e| ModelPackError::validation(format!("invalid {MANIFEST_ENTRY}: {e}")))?;

    if manifest.schema_version != PACK_SCHEMA_VERSION {
        return Err(ModelPackError::validation(format!(
            "unsupported schema_version: {} (expected {})",
            manifest.schema_version, PACK_SCHEMA_VERSION
        )));
    }

    for entry in COMPONENT_ENTRIES {
        let bytes = entries
            .get(entry)
            .ok_or_else(|| ModelPackError::validation(format!("missing {entry}")))?;
        let meta = manifest
            .component(entry)
            .ok_or_else(|| ModelPackError::validation(format!("{entry} not listed in manifest")))?;
        if !meta.matches(bytes) {
            return Err(ModelPackError::validation(format!(
                "{entry} does not match its manifest checksum"
            )));
        }
    }

    let decode_err = |entry: &str, e: serde_json::Error| {
        ModelPackError::artifact_corrupt(kind, path, format!("{entry}: {e}"))
    };

    let config: Configuration =
        serde_json::from_slice(&entries[CONFIG_ENTRY]).map_err(|e| decode_err(CONFIG_ENTRY, e))?;
    let cdb: ConceptDatabase =
        serde_json::from_slice(&entries[CDB_ENTRY]).map_err(|e| decode_err(CDB_ENTRY, e))?;
    let vocab: Vocabulary =
        serde_json::from_slice(&entries[VOCAB_ENTRY]).map_err(|e| decode_err(VOCAB_ENTRY, e))?;

    debug!(
        name = %manifest.name,
        concepts = cdb.concept_count(),
        words = vocab.len(),
        "model pack read"
    );

    Ok(LoadedPack {
        manifest,
        config,
        cdb,
        vocab,
    })
}

/// Verify a bundle and return its manifest.
pub fn validate_pack(path: &Path) -> Result<PackManifest> {
    read_pack(path).map(|pack| pack.manifest)
}

/// Collect all regular-file entries of a tar.gz stream into memory.
///
/// Rejects entries whose header claims more than [`MAX_ENTRY_BYTES`] and
/// archives that carry the same entry name twice.
fn read_entries<R: Read>(reader: R) -> std::io::Result<HashMap<String, Vec<u8>>> {
    let mut archive = Archive::new(GzDecoder::new(reader));
    let mut entries = HashMap::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        if !entry.header().entry_type().is_file() {
            continue;
        }
        let name = entry.path()?.to_string_lossy().into_owned();
        if entry.size() > MAX_ENTRY_BYTES {
            return Err(invalid_data(format!(
                "entry {name} claims {} bytes (limit {MAX_ENTRY_BYTES})",
                entry.size()
            )));
        }
        if entries.contains_key(&name) {
            return Err(invalid_data(format!("duplicate entry {name}")));
        }

        // Grows with the bytes actually present, not the header's claim
        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;
        entries.insert(name, data);
    }
    Ok(entries)
}

fn invalid_data(message: String) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::InvalidData, message)
}
