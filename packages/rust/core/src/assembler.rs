//! Model pack assembler.
//!
//! Combines a concept database (with its overlaid configuration) and a
//! vocabulary into a [`ModelPack`], then writes that pack as a single
//! bundle file to disk.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, instrument};

use modelpack_artifacts::{ConceptDatabase, Configuration, Vocabulary};
use modelpack_shared::{
    ComponentMeta, ModelPackError, PACK_SCHEMA_VERSION, PackId, PackManifest, Result,
};

use crate::bundle::{self, CDB_ENTRY, CONFIG_ENTRY, MANIFEST_ENTRY, VOCAB_ENTRY};

/// Tool version string recorded in every manifest.
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The logical pack: a concept database, its configuration and a vocabulary.
///
/// The configuration is the one embedded in the concept database, so the
/// pack always carries whatever state the database is in when composed.
#[derive(Debug, Clone)]
pub struct ModelPack {
    cdb: ConceptDatabase,
    vocab: Vocabulary,
}

impl ModelPack {
    /// Compose a pack, checking that the two components can work together.
    ///
    /// Fails with `Serialization` when the concept context vectors and the
    /// vocabulary embeddings live in different spaces.
    pub fn compose(cdb: ConceptDatabase, vocab: Vocabulary) -> Result<Self> {
        match (cdb.context_vector_dim(), vocab.vector_dim()) {
            (Some(cdb_dim), Some(vocab_dim)) if cdb_dim != vocab_dim => {
                return Err(ModelPackError::serialization(format!(
                    "incompatible components: concept context vectors have dimension \
                     {cdb_dim} but vocabulary vectors have dimension {vocab_dim}"
                )));
            }
            (Some(cdb_dim), None) => {
                return Err(ModelPackError::serialization(format!(
                    "incompatible components: concept context vectors have dimension \
                     {cdb_dim} but the vocabulary has no vectors"
                )));
            }
            _ => {}
        }

        Ok(Self { cdb, vocab })
    }

    pub fn cdb(&self) -> &ConceptDatabase {
        &self.cdb
    }

    pub fn config(&self) -> &Configuration {
        self.cdb.config()
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    /// Give the components back.
    pub fn into_parts(self) -> (ConceptDatabase, Vocabulary) {
        (self.cdb, self.vocab)
    }
}

/// Write `pack` to `output_dir/pack_name` and return the bundle's absolute path.
///
/// `output_dir` is created if absent. Nothing is cleaned up on failure: a
/// failed write may leave the directory or a truncated bundle behind.
#[instrument(skip_all, fields(dir = %output_dir.display(), name = pack_name))]
pub fn assemble(pack: &ModelPack, output_dir: &Path, pack_name: &str) -> Result<PathBuf> {
    validate_pack_name(pack_name)?;

    // Encode everything before touching the filesystem
    let config_bytes = bundle::encode_component(CONFIG_ENTRY, pack.config())?;
    let cdb_bytes = bundle::encode_component(CDB_ENTRY, pack.cdb())?;
    let vocab_bytes = bundle::encode_component(VOCAB_ENTRY, pack.vocab())?;

    let manifest = build_manifest(
        pack,
        pack_name,
        &[
            (CONFIG_ENTRY, config_bytes.as_slice()),
            (CDB_ENTRY, cdb_bytes.as_slice()),
            (VOCAB_ENTRY, vocab_bytes.as_slice()),
        ],
    );
    let manifest_bytes = bundle::encode_component(MANIFEST_ENTRY, &manifest)?;

    std::fs::create_dir_all(output_dir)
        .map_err(|e| ModelPackError::unwritable(output_dir, e))?;
    let output_dir =
        std::path::absolute(output_dir).map_err(|e| ModelPackError::unwritable(output_dir, e))?;
    let target = output_dir.join(pack_name);

    info!(path = %target.display(), "writing model pack");

    let file =
        std::fs::File::create(&target).map_err(|e| ModelPackError::unwritable(&target, e))?;
    let entries: [(&str, &[u8]); 4] = [
        (MANIFEST_ENTRY, manifest_bytes.as_slice()),
        (CONFIG_ENTRY, config_bytes.as_slice()),
        (CDB_ENTRY, cdb_bytes.as_slice()),
        (VOCAB_ENTRY, vocab_bytes.as_slice()),
    ];
    let mut writer = bundle::write_bundle(BufWriter::new(file), &entries)
        .map_err(|e| ModelPackError::unwritable(&target, e))?;
    writer
        .flush()
        .map_err(|e| ModelPackError::unwritable(&target, e))?;

    info!(
        id = %manifest.id,
        concepts = manifest.concept_count,
        words = manifest.vocab_size,
        path = %target.display(),
        "model pack assembly complete"
    );

    Ok(target)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A pack name is a single, non-empty file name.
fn validate_pack_name(name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(ModelPackError::validation(format!(
            "invalid pack name {name:?}"
        )));
    }
    if name.contains(|c: char| c == '/' || c == '\\') {
        return Err(ModelPackError::validation(format!(
            "pack name {name:?} must not contain a path separator"
        )));
    }
    Ok(())
}

/// Build the pack manifest.
fn build_manifest(pack: &ModelPack, name: &str, components: &[(&str, &[u8])]) -> PackManifest {
    let components = components
        .iter()
        .map(|(filename, bytes)| ComponentMeta::describe(*filename, bytes))
        .collect::<Vec<_>>();
    debug!(count = components.len(), "component checksums computed");

    PackManifest {
        schema_version: PACK_SCHEMA_VERSION,
        id: PackId::new(),
        name: name.to_string(),
        tool_version: TOOL_VERSION.to_string(),
        created_at: Utc::now(),
        concept_count: pack.cdb().concept_count(),
        vocab_size: pack.vocab().len(),
        components,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::read_pack;
    use crate::overlay::apply_overlay;
    use modelpack_artifacts::{Concept, SettingValue, WordEntry};

    const CDB_FIXTURE: &str = "../../../fixtures/models/cdb/test_cdb.dat";
    const VOCAB_FIXTURE: &str = "../../../fixtures/models/vocab/vocab.dat";

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "modelpack-assembler-test-{}",
            uuid::Uuid::now_v7()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fixture_pack() -> ModelPack {
        let mut cdb = ConceptDatabase::load(Path::new(CDB_FIXTURE)).unwrap();
        apply_overlay(cdb.config_mut()).unwrap();
        let vocab = Vocabulary::load(Path::new(VOCAB_FIXTURE)).unwrap();
        ModelPack::compose(cdb, vocab).unwrap()
    }

    fn concept(cui: &str, context_vector: Option<Vec<f32>>) -> Concept {
        Concept {
            cui: cui.into(),
            preferred_name: cui.to_lowercase(),
            names: vec![],
            type_ids: vec![],
            context_vector,
        }
    }

    fn vocab_with_dim(dim: usize) -> Vocabulary {
        Vocabulary::new(vec![WordEntry {
            word: "heart".into(),
            count: 1,
            vector: Some(vec![0.5; dim]),
        }])
        .unwrap()
    }

    #[test]
    fn assemble_writes_bundle_at_returned_path() {
        let tmp = temp_dir();
        let out = tmp.join("modelpack");

        let path = assemble(&fixture_pack(), &out, "test_pack.zip").unwrap();

        assert_eq!(path, out.join("test_pack.zip"));
        assert!(path.is_absolute());
        assert!(path.is_file());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn bundle_carries_overlaid_configuration() {
        let tmp = temp_dir();
        let path = assemble(&fixture_pack(), &tmp, "pack.dat").unwrap();

        let loaded = read_pack(&path).unwrap();
        assert_eq!(
            loaded.config.get("linking", "similarity-threshold"),
            Some(&SettingValue::Float(0.3))
        );
        assert_eq!(
            loaded.cdb.config().get("general", "spell-check-enabled"),
            Some(&SettingValue::Bool(true))
        );
        assert_eq!(&loaded.config, loaded.cdb.config());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn manifest_describes_components() {
        let tmp = temp_dir();
        let path = assemble(&fixture_pack(), &tmp, "pack.dat").unwrap();

        let manifest = read_pack(&path).unwrap().manifest;
        assert_eq!(manifest.schema_version, PACK_SCHEMA_VERSION);
        assert_eq!(manifest.name, "pack.dat");
        assert_eq!(manifest.concept_count, 3);
        assert_eq!(manifest.vocab_size, 6);
        let names: Vec<_> = manifest.components.iter().map(|c| c.filename.as_str()).collect();
        assert_eq!(names, ["config.json", "cdb.json", "vocab.json"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn reassembling_overwrites() {
        let tmp = temp_dir();
        let pack = fixture_pack();

        let first = assemble(&pack, &tmp, "pack.dat").unwrap();
        let second = assemble(&pack, &tmp, "pack.dat").unwrap();

        assert_eq!(first, second);
        assert!(read_pack(&second).is_ok());
        let files = std::fs::read_dir(&tmp).unwrap().count();
        assert_eq!(files, 1);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn creates_nested_output_directory() {
        let tmp = temp_dir();
        let out = tmp.join("a").join("b").join("modelpack");

        let path = assemble(&fixture_pack(), &out, "pack.dat").unwrap();
        assert!(out.is_dir());
        assert!(path.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn output_dir_blocked_by_file_is_unwritable() {
        let tmp = temp_dir();
        let blocker = tmp.join("modelpack");
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = assemble(&fixture_pack(), &blocker, "test_pack.zip").unwrap_err();
        assert!(matches!(err, ModelPackError::OutputPathUnwritable { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn target_occupied_by_directory_is_unwritable() {
        let tmp = temp_dir();
        std::fs::create_dir_all(tmp.join("pack.dat")).unwrap();

        let err = assemble(&fixture_pack(), &tmp, "pack.dat").unwrap_err();
        assert!(matches!(err, ModelPackError::OutputPathUnwritable { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn rejects_bad_pack_names() {
        let tmp = temp_dir();
        let pack = fixture_pack();
        for name in ["", ".", "..", "nested/pack.zip", "..\\pack.zip"] {
            let err = assemble(&pack, &tmp, name).unwrap_err();
            assert!(
                matches!(err, ModelPackError::Validation { .. }),
                "name {name:?} should be rejected"
            );
        }
        assert_eq!(std::fs::read_dir(&tmp).unwrap().count(), 0);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn compose_rejects_mismatched_vector_spaces() {
        let cdb = ConceptDatabase::new(
            Configuration::new(),
            vec![concept("C1", Some(vec![0.1; 4]))],
        );
        let err = ModelPack::compose(cdb, vocab_with_dim(3)).unwrap_err();
        assert!(matches!(err, ModelPackError::Serialization { .. }));
        assert!(err.to_string().contains("dimension 4"));
    }

    #[test]
    fn compose_rejects_vectorless_vocabulary() {
        let cdb = ConceptDatabase::new(
            Configuration::new(),
            vec![concept("C1", Some(vec![0.1; 2]))],
        );
        let vocab = Vocabulary::new(vec![]).unwrap();
        let err = ModelPack::compose(cdb, vocab).unwrap_err();
        assert!(err.to_string().contains("no vectors"));
    }

    #[test]
    fn compose_accepts_cdb_without_context_vectors() {
        let cdb = ConceptDatabase::new(Configuration::new(), vec![concept("C1", None)]);
        let pack = ModelPack::compose(cdb, vocab_with_dim(8)).unwrap();
        let (cdb, vocab) = pack.into_parts();
        assert_eq!(cdb.concept_count(), 1);
        assert_eq!(vocab.vector_dim(), Some(8));
    }
}
