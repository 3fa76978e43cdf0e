//! Mesh representation handed to the renderer
//!
//! [`Vertex`] is the packed, GPU-ready vertex produced by vertex welding and
//! [`MeshGroup`] is one named sub-mesh of a loaded model with its own vertex and
//! index buffers.

use bytemuck::{Pod, Zeroable};

use crate::assets::materials::MaterialId;

/// 3D vertex data structure for rendering
///
/// # Memory Layout
/// `#[repr(C)]` keeps the layout stable so a slice of vertices can be uploaded
/// to a vertex buffer as raw bytes (32 bytes per vertex).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    /// Position in 3D space
    pub position: [f32; 3],

    /// Normal vector, zero when the source gave none
    pub normal: [f32; 3],

    /// Texture coordinates, zero when the source gave none
    pub tex_coord: [f32; 2],
}

impl Vertex {
    /// Create a new vertex
    pub const fn new(position: [f32; 3], normal: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            tex_coord,
        }
    }
}

/// One named sub-mesh of a model
///
/// Created when a group or object record starts (or implicitly at the top of the
/// file) and handed to a [`MeshSink`](crate::render::buffer::MeshSink) on the next
/// group boundary or at end of input.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGroup {
    /// Group or object name
    pub name: String,

    /// Material bound while the group's faces were read
    pub material_id: MaterialId,

    /// Packed, de-duplicated vertices
    pub vertices: Vec<Vertex>,

    /// Triangle list indices into `vertices`
    pub indices: Vec<u32>,
}

impl MeshGroup {
    /// Create an empty group
    pub fn new(name: impl Into<String>, material_id: MaterialId) -> Self {
        Self {
            name: name.into(),
            material_id,
            vertices: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Whether the group has no faces
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Vertex data as raw bytes
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Index data as raw bytes
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }
}
