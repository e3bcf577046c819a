//! Model-pack assembly: configuration overlay, pack composition and bundling.
//!
//! This crate ties the loaded components together into end-to-end
//! workflows (e.g., `load_cdb_and_save_modelpack`).

pub mod assembler;
pub mod bundle;
pub mod overlay;
pub mod pipeline;
