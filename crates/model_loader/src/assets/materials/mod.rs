//! Material libraries and the material table
//!
//! [`MtlParser`] reads `.mtl` files into a [`MaterialLibrary`]; the model loader
//! merges libraries into a [`MaterialTable`] and binds faces to the ids it hands
//! out.

pub mod material_registry;
pub mod mtl_parser;

pub use material_registry::{
    MaterialId, MaterialRegistry, MaterialTable, SharedMaterialRegistry, DEFAULT_MATERIAL_NAME,
};
pub use mtl_parser::{MaterialLibrary, MtlParser};
