//! Shared types, error model, and configuration for model-pack assembly.
//!
//! This crate is the foundation depended on by all other workspace crates.
//! It provides:
//! - [`ModelPackError`]: the unified error type
//! - Domain types ([`PackManifest`], [`ComponentMeta`], [`PackId`], [`ArtifactKind`])
//! - Configuration ([`AppConfig`], [`ModelPaths`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ModelPaths, PathsConfig, config_dir, config_file_path, init_config, load_config,
    load_config_from,
};
pub use error::{ModelPackError, Result};
pub use types::{
    ArtifactKind, ComponentMeta, PACK_SCHEMA_VERSION, PackId, PackManifest, sha256_hex,
};
