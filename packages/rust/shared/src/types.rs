//! Core domain types for model packs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Current schema version for the pack manifest format.
pub const PACK_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// ArtifactKind
// ---------------------------------------------------------------------------

/// Which kind of on-disk artifact an operation was dealing with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    ConceptDatabase,
    Vocabulary,
    ModelPack,
}

impl std::fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::ConceptDatabase => "concept database",
            Self::Vocabulary => "vocabulary",
            Self::ModelPack => "model pack",
        };
        f.write_str(label)
    }
}

// ---------------------------------------------------------------------------
// PackId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for model pack identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackId(pub Uuid);

impl PackId {
    /// Generate a new time-sortable pack identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PackId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PackId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// PackManifest
// ---------------------------------------------------------------------------

/// Checksum entry for one component stored inside a bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMeta {
    /// Entry name inside the archive (e.g. `cdb.json`).
    pub filename: String,
    /// Lowercase hex SHA-256 of the entry bytes.
    pub sha256: String,
    pub size_bytes: usize,
}

impl ComponentMeta {
    /// Describe `bytes` stored under `filename`.
    pub fn describe(filename: impl Into<String>, bytes: &[u8]) -> Self {
        Self {
            filename: filename.into(),
            sha256: sha256_hex(bytes),
            size_bytes: bytes.len(),
        }
    }

    /// Whether `bytes` match the recorded checksum and size.
    pub fn matches(&self, bytes: &[u8]) -> bool {
        self.size_bytes == bytes.len() && self.sha256 == sha256_hex(bytes)
    }
}

/// The `manifest.json` entry stored first in every model pack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackManifest {
    /// Schema version for forward compatibility.
    pub schema_version: u32,
    /// Unique identifier for this pack.
    pub id: PackId,
    /// Pack name as chosen by the caller (also the bundle's file name).
    pub name: String,
    /// Tool version that created this pack.
    pub tool_version: String,
    pub created_at: DateTime<Utc>,
    /// Number of concepts in the bundled concept database.
    pub concept_count: usize,
    /// Number of words in the bundled vocabulary.
    pub vocab_size: usize,
    /// Checksums of every component entry, in archive order.
    pub components: Vec<ComponentMeta>,
}

impl PackManifest {
    /// Look up the checksum entry for `filename`.
    pub fn component(&self, filename: &str) -> Option<&ComponentMeta> {
        self.components.iter().find(|c| c.filename == filename)
    }
}

/// Lowercase hex SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
