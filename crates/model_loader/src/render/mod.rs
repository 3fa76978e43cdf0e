//! # Render Hand-off
//!
//! The loader stops at GPU-ready data. [`mesh`] holds the packed vertex layout
//! and finished groups; [`buffer`] defines the allocator and sink seams through
//! which an application's renderer takes them over.

pub mod buffer;
pub mod mesh;

pub use buffer::{AllocationError, BufferAllocator, BufferUploader, BufferUsage, MeshSink, UploadedMesh};
pub use mesh::{MeshGroup, Vertex};
