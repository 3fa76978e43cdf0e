//! Model and material loading
//!
//! - [`text`]: lexer, diagnostics and reduction rules shared by both formats
//! - [`index_resolver`]: vertex welding
//! - [`obj_loader`]: model assembly
//! - [`materials`]: material libraries and the material table

pub mod index_resolver;
pub mod materials;
pub mod obj_loader;
pub mod text;

pub use index_resolver::{IndexError, IndexResolver, VertexKey};
pub use materials::{MaterialId, MaterialLibrary, MaterialRegistry, MaterialTable, MtlParser, SharedMaterialRegistry};
pub use obj_loader::{LoadedModel, ObjLoader, ParseReport};

use thiserror::Error;

use crate::config::ConfigError;
use crate::render::buffer::AllocationError;

/// Failures that abort a load
///
/// Everything else is reported through diagnostics.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Reading the model failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The buffer allocator refused a group
    #[error("Buffer allocation failed: {0}")]
    Allocation(#[from] AllocationError),

    /// Loader configuration could not be read
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
