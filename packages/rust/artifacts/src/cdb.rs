//! Concept database (CDB): concept entries plus their embedded configuration.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use modelpack_shared::{ArtifactKind, ModelPackError, Result};

use crate::loader;
use crate::settings::Configuration;

/// On-disk revision of the concept database format this crate reads.
pub const CDB_FORMAT_VERSION: u32 = 1;

/// A single clinical concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concept {
    /// Concept unique identifier (e.g. `HP:0001639`).
    pub cui: String,
    pub preferred_name: String,
    /// All surface forms the concept is recognised by.
    #[serde(default)]
    pub names: Vec<String>,
    /// Semantic type identifiers.
    #[serde(default)]
    pub type_ids: Vec<String>,
    /// Learned context embedding, in the vocabulary's vector space.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_vector: Option<Vec<f32>>,
}

#[derive(Deserialize)]
struct ConceptDatabaseFile {
    format_version: u32,
    config: Configuration,
    #[serde(default)]
    concepts: Vec<Concept>,
}

/// A loaded concept database.
///
/// The embedded [`Configuration`] is exclusively owned by the database and is
/// handed out by reference; mutating it through [`Self::config_mut`] changes
/// the database in place.
///
/// Deserializing enforces the same format revision and integrity rules as
/// [`Self::load`], so a database decoded from any source is well formed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConceptDatabase {
    format_version: u32,
    config: Configuration,
    #[serde(default)]
    concepts: Vec<Concept>,
}

impl ConceptDatabase {
    /// Build an in-memory database at the current format version.
    pub fn new(config: Configuration, concepts: Vec<Concept>) -> Self {
        Self {
            format_version: CDB_FORMAT_VERSION,
            config,
            concepts,
        }
    }

    /// Load a concept database from `path`.
    ///
    /// Fails with `ArtifactNotFound` if nothing exists at `path` and with
    /// `ArtifactCorrupt` if the contents are not a valid database.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let kind = ArtifactKind::ConceptDatabase;
        let bytes = loader::read_artifact(kind, path)?;
        let file: ConceptDatabaseFile = loader::decode_artifact(kind, path, &bytes)?;

        loader::check_format_version(kind, path, file.format_version, CDB_FORMAT_VERSION)?;
        let cdb = Self::from_file(file)
            .map_err(|msg| ModelPackError::artifact_corrupt(kind, path, msg))?;

        info!(
            concepts = cdb.concepts.len(),
            sections = cdb.config.sections().count(),
            "concept database loaded"
        );
        Ok(cdb)
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.concepts
    }

    pub fn concept(&self, cui: &str) -> Option<&Concept> {
        self.concepts.iter().find(|c| c.cui == cui)
    }

    pub fn concept_count(&self) -> usize {
        self.concepts.len()
    }

    /// Dimension shared by all concept context vectors, if any concept has one.
    pub fn context_vector_dim(&self) -> Option<usize> {
        self.concepts
            .iter()
            .find_map(|c| c.context_vector.as_ref().map(Vec::len))
    }

    fn from_file(file: ConceptDatabaseFile) -> std::result::Result<Self, String> {
        let cdb = Self {
            format_version: file.format_version,
            config: file.config,
            concepts: file.concepts,
        };
        cdb.check_integrity()?;
        Ok(cdb)
    }

    /// Structural checks not expressible through serde alone.
    fn check_integrity(&self) -> std::result::Result<(), String> {
        let mut seen = HashSet::with_capacity(self.concepts.len());
        for concept in &self.concepts {
            if concept.cui.is_empty() {
                return Err("concept with empty cui".into());
            }
            if !seen.insert(concept.cui.as_str()) {
                return Err(format!("duplicate cui {}", concept.cui));
            }
        }

        if let Some(dim) = self.context_vector_dim() {
            if let Some(bad) = self
                .concepts
                .iter()
                .find(|c| c.context_vector.as_ref().is_some_and(|v| v.len() != dim))
            {
                return Err(format!(
                    "context vector of {} does not have dimension {dim}",
                    bad.cui
                ));
            }
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for ConceptDatabase {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        use serde::de::Error;

        let file = ConceptDatabaseFile::deserialize(deserializer)?;
        if file.format_version != CDB_FORMAT_VERSION {
            return Err(D::Error::custom(format!(
                "unsupported format_version {} (expected {CDB_FORMAT_VERSION})",
                file.format_version
            )));
        }
        Self::from_file(file).map_err(D::Error::custom)
    }
}
