//! Vertex welding
//!
//! Face corners reference positions, texture coordinates and normals through
//! separate 1-based index lists. The renderer wants a single index per vertex, so
//! every distinct `(position, normal, texture)` triple becomes one packed
//! [`Vertex`] and repeated triples reuse the index handed out the first time.

use std::collections::HashMap;

use thiserror::Error;

use crate::assets::text::token::CompositeIndex;
use crate::foundation::math::{Vec2, Vec3};
use crate::render::mesh::Vertex;

/// Dedup key: 0-based indices into the raw tables, `None` when the corner has no such part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexKey {
    /// Position index
    pub position: u32,
    /// Normal index
    pub normal: Option<u32>,
    /// Texture coordinate index
    pub texture: Option<u32>,
}

/// Which raw table an index points into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    /// `v` records
    Position,
    /// `vt` records
    Texture,
    /// `vn` records
    Normal,
}

impl Attribute {
    const fn name(self) -> &'static str {
        match self {
            Self::Position => "vertex",
            Self::Texture => "texture coordinate",
            Self::Normal => "normal",
        }
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a corner reference cannot be resolved
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// Negative index relative to the end of a table
    #[error("relative (negative) {0} indices are not yet supported")]
    Relative(Attribute),

    /// Index 0 in a 1-based list
    #[error("{0} index 0 is invalid, indices start at 1")]
    Zero(Attribute),

    /// Index past the end of a table
    #[error("{attribute} index {index} is out of range ({count} defined)")]
    OutOfRange {
        /// Table referenced
        attribute: Attribute,
        /// 1-based index from the source
        index: i64,
        /// Entries defined so far
        count: usize,
    },
}

/// Raw attribute tables plus the dedup map of the group being built
#[derive(Debug, Clone)]
pub struct IndexResolver {
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tex_coords: Vec<Vec2>,
    lookup: HashMap<VertexKey, u32>,
    vertices: Vec<Vertex>,
    flip_texture_v: bool,
}

impl IndexResolver {
    /// Create an empty resolver
    ///
    /// With `flip_texture_v` set, texture V becomes `1 - v` when a vertex is packed,
    /// converting from bottom-left to top-left texture origin.
    pub fn new(flip_texture_v: bool) -> Self {
        Self {
            positions: Vec::new(),
            normals: Vec::new(),
            tex_coords: Vec::new(),
            lookup: HashMap::new(),
            vertices: Vec::new(),
            flip_texture_v,
        }
    }

    /// Append a `v` record
    pub fn push_position(&mut self, position: Vec3) {
        self.positions.push(position);
    }

    /// Append a `vn` record
    pub fn push_normal(&mut self, normal: Vec3) {
        self.normals.push(normal);
    }

    /// Append a `vt` record, as written in the source
    pub fn push_tex_coord(&mut self, tex_coord: Vec2) {
        self.tex_coords.push(tex_coord);
    }

    /// Number of `v` records seen
    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of `vn` records seen
    pub fn normal_count(&self) -> usize {
        self.normals.len()
    }

    /// Number of `vt` records seen
    pub fn tex_coord_count(&self) -> usize {
        self.tex_coords.len()
    }

    /// Packed vertices of the current group
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Validate a 1-based corner reference and turn it into a dedup key
    ///
    /// Has no side effects, so a face can check all of its corners before any of
    /// them is resolved.
    pub fn key_for(&self, corner: CompositeIndex) -> Result<VertexKey, IndexError> {
        let position = Self::table_index(corner.vertex, Attribute::Position, self.positions.len())?;
        let texture = corner
            .texture
            .map(|index| Self::table_index(index, Attribute::Texture, self.tex_coords.len()))
            .transpose()?;
        let normal = corner
            .normal
            .map(|index| Self::table_index(index, Attribute::Normal, self.normals.len()))
            .transpose()?;
        Ok(VertexKey { position, normal, texture })
    }

    fn table_index(index: i64, attribute: Attribute, count: usize) -> Result<u32, IndexError> {
        if index < 0 {
            return Err(IndexError::Relative(attribute));
        }
        if index == 0 {
            return Err(IndexError::Zero(attribute));
        }
        match u32::try_from(index - 1) {
            Ok(zero_based) if (zero_based as usize) < count => Ok(zero_based),
            _ => Err(IndexError::OutOfRange { attribute, index, count }),
        }
    }

    /// Map a key to its packed vertex index, packing a new vertex on first sight
    pub fn resolve(&mut self, key: VertexKey) -> Result<u32, IndexError> {
        if let Some(&index) = self.lookup.get(&key) {
            return Ok(index);
        }

        let position = Self::lookup_table(&self.positions, Some(key.position), Attribute::Position)?;
        let position = position.unwrap_or_else(Vec3::zeros);
        let normal = Self::lookup_table(&self.normals, key.normal, Attribute::Normal)?
            .unwrap_or_else(Vec3::zeros);
        let tex_coord = Self::lookup_table(&self.tex_coords, key.texture, Attribute::Texture)?
            .map_or([0.0, 0.0], |uv| {
                if self.flip_texture_v {
                    [uv.x, 1.0 - uv.y]
                } else {
                    [uv.x, uv.y]
                }
            });

        let vertex = Vertex::new(
            [position.x, position.y, position.z],
            [normal.x, normal.y, normal.z],
            tex_coord,
        );
        let index = u32::try_from(self.vertices.len()).map_err(|_| IndexError::OutOfRange {
            attribute: Attribute::Position,
            index: i64::from(key.position) + 1,
            count: self.positions.len(),
        })?;
        self.vertices.push(vertex);
        self.lookup.insert(key, index);
        Ok(index)
    }

    fn lookup_table<T: Copy>(table: &[T], index: Option<u32>, attribute: Attribute) -> Result<Option<T>, IndexError> {
        let Some(index) = index else {
            return Ok(None);
        };
        table
            .get(index as usize)
            .copied()
            .map(Some)
            .ok_or(IndexError::OutOfRange {
                attribute,
                index: i64::from(index) + 1,
                count: table.len(),
            })
    }

    /// Take the packed vertices of the current group and forget its keys
    ///
    /// The raw tables are kept: later groups may reference earlier records.
    pub fn finish_group(&mut self) -> Vec<Vertex> {
        self.lookup.clear();
        std::mem::take(&mut self.vertices)
    }
}

impl Default for IndexResolver {
    fn default() -> Self {
        Self::new(true)
    }
}
