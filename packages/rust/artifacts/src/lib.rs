//! Component loading for model-pack assembly.
//!
//! Resolves the two base artifacts a pack is built from and decodes them
//! into in-memory handles:
//! - [`ConceptDatabase`]: concepts plus the embedded [`Configuration`]
//! - [`Vocabulary`]: word frequencies and embeddings, read-only here

pub mod cdb;
pub mod loader;
pub mod settings;
pub mod vocab;

pub use cdb::{CDB_FORMAT_VERSION, Concept, ConceptDatabase};
pub use settings::{Configuration, Section, SettingValue};
pub use vocab::{VOCAB_FORMAT_VERSION, Vocabulary, WordEntry};
