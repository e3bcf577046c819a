//! Application configuration for the model-pack tool.
//!
//! User config lives at `~/.modelpack/modelpack.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ModelPackError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "modelpack.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".modelpack";

/// Subdirectory of the models root holding named concept databases.
pub const CDB_DIR_NAME: &str = "cdb";
/// Subdirectory of the models root holding the vocabulary.
pub const VOCAB_DIR_NAME: &str = "vocab";
/// File name of the default vocabulary.
pub const VOCAB_FILE_NAME: &str = "vocab.dat";
/// Subdirectory of the models root receiving assembled packs.
pub const MODELPACK_DIR_NAME: &str = "modelpack";

// ---------------------------------------------------------------------------
// Config structs (matching modelpack.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Filesystem layout.
    #[serde(default)]
    pub paths: PathsConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Root models directory containing `cdb/`, `vocab/` and `modelpack/`.
    #[serde(default = "default_models_root")]
    pub models_root: String,

    /// Override for the concept database directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdb_dir: Option<String>,

    /// Override for the default vocabulary file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vocab_path: Option<String>,

    /// Override for the pack output directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modelpack_dir: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            models_root: default_models_root(),
            cdb_dir: None,
            vocab_path: None,
            modelpack_dir: None,
        }
    }
}

fn default_models_root() -> String {
    "models".into()
}

// ---------------------------------------------------------------------------
// Resolved paths (runtime, computed once at start-up)
// ---------------------------------------------------------------------------

/// Resolved default locations for pipeline inputs and outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub models_root: PathBuf,
    /// Directory of named concept databases.
    pub cdb_dir: PathBuf,
    /// The default vocabulary file.
    pub vocab_path: PathBuf,
    /// Default output directory for assembled packs.
    pub modelpack_dir: PathBuf,
}

impl ModelPaths {
    /// Standard layout under `root`: `cdb/`, `vocab/vocab.dat`, `modelpack/`.
    pub fn from_root(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            cdb_dir: root.join(CDB_DIR_NAME),
            vocab_path: root.join(VOCAB_DIR_NAME).join(VOCAB_FILE_NAME),
            modelpack_dir: root.join(MODELPACK_DIR_NAME),
            models_root: root,
        }
    }

    /// Resolve the `[paths]` section, anchoring relative entries at `base`.
    pub fn resolve(config: &AppConfig, base: &Path) -> Self {
        let anchor = |p: &str| {
            let p = PathBuf::from(p);
            if p.is_absolute() { p } else { base.join(p) }
        };

        let mut paths = Self::from_root(anchor(&config.paths.models_root));
        if let Some(dir) = &config.paths.cdb_dir {
            paths.cdb_dir = anchor(dir);
        }
        if let Some(vocab) = &config.paths.vocab_path {
            paths.vocab_path = anchor(vocab);
        }
        if let Some(dir) = &config.paths.modelpack_dir {
            paths.modelpack_dir = anchor(dir);
        }
        paths
    }

    /// Path of the concept database called `name` inside [`Self::cdb_dir`].
    pub fn cdb_path(&self, name: &str) -> PathBuf {
        self.cdb_dir.join(name)
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.modelpack/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ModelPackError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.modelpack/modelpack.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ModelPackError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| ModelPackError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| ModelPackError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ModelPackError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| ModelPackError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("models_root"));
        assert!(!toml_str.contains("vocab_path"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.paths.models_root, "models");
        assert!(parsed.paths.cdb_dir.is_none());
    }

    #[test]
    fn layout_from_root() {
        let paths = ModelPaths::from_root("/srv/models");
        assert_eq!(paths.cdb_dir, PathBuf::from("/srv/models/cdb"));
        assert_eq!(paths.vocab_path, PathBuf::from("/srv/models/vocab/vocab.dat"));
        assert_eq!(paths.modelpack_dir, PathBuf::from("/srv/models/modelpack"));
        assert_eq!(
            paths.cdb_path("hpo.dat"),
            PathBuf::from("/srv/models/cdb/hpo.dat")
        );
    }

    #[test]
    fn resolve_anchors_relative_entries() {
        let toml_str = r#"
[paths]
models_root = "data/models"
vocab_path = "/opt/vocab/big.dat"
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let paths = ModelPaths::resolve(&config, Path::new("/work"));

        assert_eq!(paths.models_root, PathBuf::from("/work/data/models"));
        assert_eq!(paths.cdb_dir, PathBuf::from("/work/data/models/cdb"));
        assert_eq!(paths.vocab_path, PathBuf::from("/opt/vocab/big.dat"));
        assert_eq!(paths.modelpack_dir, PathBuf::from("/work/data/models/modelpack"));
    }

    #[test]
    fn missing_paths_section_uses_defaults() {
        let config: AppConfig = toml::from_str("").expect("parse empty");
        let paths = ModelPaths::resolve(&config, Path::new("/work"));
        assert_eq!(paths.models_root, PathBuf::from("/work/models"));
    }
}
