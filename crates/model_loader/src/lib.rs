//! # Model Loader
//!
//! Streaming parser for text model (`.obj`) and material (`.mtl`) files that
//! produces GPU-ready, per-group vertex and index buffers.
//!
//! ## Features
//!
//! - **Located diagnostics**: every problem is reported with file, line, column
//!   and the offending source lines; parsing always continues to the end
//! - **Vertex welding**: identical `position/texture/normal` corners share one
//!   packed vertex
//! - **Pluggable consumers**: buffers go to a [`render::buffer::MeshSink`],
//!   materials to a [`assets::materials::MaterialTable`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use model_loader::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = ObjLoader::new(LoaderConfig::default()).load_meshes("teapot.obj")?;
//!     for group in &model.groups {
//!         println!("{}: {} triangles", group.name, group.triangle_count());
//!     }
//!     for diagnostic in &model.diagnostics {
//!         eprint!("{}", diagnostic.render());
//!     }
//!     Ok(())
//! }
//! ```

#![allow(
    clippy::module_name_repetitions,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::missing_errors_doc
)]

pub mod assets;
pub mod config;
pub mod core;
pub mod foundation;
pub mod render;

/// Common imports for loader users
pub mod prelude {
    pub use crate::{
        assets::{
            materials::{MaterialId, MaterialRegistry, MaterialTable, MtlParser, SharedMaterialRegistry},
            text::{CollectingSink, ColorMode, Diagnostic, DiagnosticSink, Severity, TextRenderer},
            LoadedModel, ModelError, ObjLoader, ParseReport,
        },
        core::config::{Config, DiagnosticsConfig, LoaderConfig},
        foundation::math::{Color, Vec2, Vec3},
        render::{
            buffer::{BufferAllocator, BufferUploader, BufferUsage, MeshSink},
            mesh::{MeshGroup, Vertex},
        },
    };
}
