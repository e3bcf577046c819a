//! End-to-end pipeline: CDB → overlay → vocabulary → compose → bundle on disk.
//!
//! The pipeline is strictly linear. Any failure ends the invocation; there is
//! no retry and no resume. Nothing is written to disk before the final
//! assembly step.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument};

use modelpack_artifacts::{ConceptDatabase, Vocabulary};
use modelpack_shared::{ModelPaths, Result};

use crate::assembler::{self, ModelPack};
use crate::overlay::Overlay;

/// Inputs for [`load_cdb_and_save_modelpack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavePackRequest {
    /// Concept database to pack.
    pub cdb_path: PathBuf,
    /// File name of the bundle inside `pack_dir`.
    pub pack_name: String,
    /// Output directory, created if absent.
    pub pack_dir: PathBuf,
    /// Vocabulary to pack alongside the CDB.
    pub vocab_path: PathBuf,
}

impl SavePackRequest {
    /// Request with the default output directory and vocabulary from `paths`.
    pub fn new(
        cdb_path: impl Into<PathBuf>,
        pack_name: impl Into<String>,
        paths: &ModelPaths,
    ) -> Self {
        Self {
            cdb_path: cdb_path.into(),
            pack_name: pack_name.into(),
            pack_dir: paths.modelpack_dir.clone(),
            vocab_path: paths.vocab_path.clone(),
        }
    }

    pub fn with_pack_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pack_dir = dir.into();
        self
    }

    pub fn with_vocab_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.vocab_path = path.into();
        self
    }
}

/// Where an invocation has got to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Nothing loaded yet.
    Unloaded,
    /// The concept database is in memory.
    Loaded,
    /// The overlay has been applied to the CDB's configuration.
    Overlaid,
    /// The bundle is on disk.
    Assembled,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unloaded => "unloaded",
            Self::Loaded => "loaded",
            Self::Overlaid => "overlaid",
            Self::Assembled => "assembled",
        };
        f.write_str(label)
    }
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called on entering each stage.
    fn stage(&self, stage: PipelineStage);
    /// Called once the bundle has been written.
    fn done(&self, pack_path: &Path);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _stage: PipelineStage) {}
    fn done(&self, _pack_path: &Path) {}
}

/// Load a CDB, apply the default overlay, and save it as a model pack along
/// with a vocabulary. Returns the absolute path of the written bundle.
///
/// 1. Load the concept database
/// 2. Apply the overlay to its configuration, in place
/// 3. Load the vocabulary
/// 4. Compose and write the bundle
///
/// The vocabulary is only read once the overlay has succeeded, so a
/// structurally incompatible CDB aborts before any further I/O.
#[instrument(skip_all, fields(cdb = %request.cdb_path.display(), name = %request.pack_name))]
pub fn load_cdb_and_save_modelpack(
    request: &SavePackRequest,
    progress: &dyn ProgressReporter,
) -> Result<PathBuf> {
    let start = Instant::now();
    progress.stage(PipelineStage::Unloaded);

    let mut cdb = ConceptDatabase::load(&request.cdb_path)?;
    progress.stage(PipelineStage::Loaded);

    Overlay::default_policy().apply(cdb.config_mut())?;
    progress.stage(PipelineStage::Overlaid);

    let vocab = Vocabulary::load(&request.vocab_path)?;

    let pack = ModelPack::compose(cdb, vocab)?;
    let pack_path = assembler::assemble(&pack, &request.pack_dir, &request.pack_name)?;
    progress.stage(PipelineStage::Assembled);

    info!(
        path = %pack_path.display(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "model pack saved"
    );
    progress.done(&pack_path);

    Ok(pack_path)
}

/// Resolve `cdb_name` under the default CDB directory and save a pack called
/// `pack_name` to the default output directory with the default vocabulary.
pub fn load_cdb_and_save_modelpack_in_def_location(
    paths: &ModelPaths,
    cdb_name: &str,
    pack_name: &str,
    progress: &dyn ProgressReporter,
) -> Result<PathBuf> {
    let request = SavePackRequest::new(paths.cdb_path(cdb_name), pack_name, paths);
    load_cdb_and_save_modelpack(&request, progress)
}
