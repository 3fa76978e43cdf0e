//! Hand-off of finished mesh groups to buffer storage
//!
//! The loader never owns GPU resources. Finished [`MeshGroup`]s go to a
//! [`MeshSink`]; [`BufferUploader`] is the sink that talks to an external
//! [`BufferAllocator`] and keeps only the returned handles.

use bitflags::bitflags;
use thiserror::Error;

use crate::assets::materials::MaterialId;
use crate::assets::ModelError;
use crate::render::mesh::MeshGroup;

bitflags! {
    /// How a buffer will be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Vertex attribute source
        const VERTEX = 1 << 0;
        /// Index source
        const INDEX = 1 << 1;
        /// Destination of an upload
        const TRANSFER_DST = 1 << 2;
    }
}

/// Buffer allocation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    /// Not enough memory for the request
    #[error("Out of memory allocating {size} bytes")]
    OutOfMemory {
        /// Requested size
        size: usize,
    },

    /// Upload larger than the buffer
    #[error("Upload of {bytes} bytes exceeds buffer size {capacity}")]
    Overflow {
        /// Bytes offered
        bytes: usize,
        /// Buffer capacity
        capacity: usize,
    },

    /// Backend specific failure
    #[error("Buffer backend error: {0}")]
    Backend(String),
}

/// External buffer allocator
pub trait BufferAllocator {
    /// Handle type identifying an allocated buffer
    type Handle;

    /// Allocate a buffer of `byte_size` bytes
    fn allocate(&mut self, byte_size: usize, usage: BufferUsage) -> Result<Self::Handle, AllocationError>;

    /// Copy `bytes` into a previously allocated buffer
    fn upload(&mut self, handle: &Self::Handle, bytes: &[u8]) -> Result<(), AllocationError>;
}

/// Receiver of finished mesh groups
pub trait MeshSink {
    /// Take ownership of a finished group
    fn finish_group(&mut self, group: MeshGroup) -> Result<(), ModelError>;
}

impl MeshSink for Vec<MeshGroup> {
    fn finish_group(&mut self, group: MeshGroup) -> Result<(), ModelError> {
        self.push(group);
        Ok(())
    }
}

/// A group whose data lives in allocator-owned buffers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedMesh<H> {
    /// Group name
    pub name: String,
    /// Bound material
    pub material_id: MaterialId,
    /// Vertex buffer handle
    pub vertex_buffer: H,
    /// Index buffer handle
    pub index_buffer: H,
    /// Number of vertices uploaded
    pub vertex_count: u32,
    /// Number of indices uploaded
    pub index_count: u32,
}

/// Sink that uploads each finished group through a [`BufferAllocator`]
pub struct BufferUploader<A: BufferAllocator> {
    allocator: A,
    meshes: Vec<UploadedMesh<A::Handle>>,
}

impl<A: BufferAllocator> BufferUploader<A> {
    /// Wrap an allocator
    pub const fn new(allocator: A) -> Self {
        Self {
            allocator,
            meshes: Vec::new(),
        }
    }

    /// Meshes uploaded so far
    pub fn meshes(&self) -> &[UploadedMesh<A::Handle>] {
        &self.meshes
    }

    /// Give back the allocator and the uploaded meshes
    pub fn into_parts(self) -> (A, Vec<UploadedMesh<A::Handle>>) {
        (self.allocator, self.meshes)
    }

    fn upload_bytes(&mut self, bytes: &[u8], usage: BufferUsage) -> Result<A::Handle, AllocationError> {
        let handle = self.allocator.allocate(bytes.len(), usage | BufferUsage::TRANSFER_DST)?;
        self.allocator.upload(&handle, bytes)?;
        Ok(handle)
    }
}

impl<A: BufferAllocator> MeshSink for BufferUploader<A> {
    fn finish_group(&mut self, group: MeshGroup) -> Result<(), ModelError> {
        let vertex_buffer = self.upload_bytes(group.vertex_bytes(), BufferUsage::VERTEX)?;
        let index_buffer = self.upload_bytes(group.index_bytes(), BufferUsage::INDEX)?;

        log::debug!(
            "Uploaded group '{}': {} vertices, {} indices",
            group.name,
            group.vertices.len(),
            group.indices.len()
        );

        self.meshes.push(UploadedMesh {
            name: group.name,
            material_id: group.material_id,
            vertex_buffer,
            index_buffer,
            vertex_count: u32::try_from(group.vertices.len()).unwrap_or(u32::MAX),
            index_count: u32::try_from(group.indices.len()).unwrap_or(u32::MAX),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::mesh::Vertex;

    /// Allocator backed by plain byte vectors
    #[derive(Default)]
    struct HostAllocator {
        buffers: Vec<(BufferUsage, Vec<u8>)>,
        limit: Option<usize>,
    }

    impl BufferAllocator for HostAllocator {
        type Handle = usize;

        fn allocate(&mut self, byte_size: usize, usage: BufferUsage) -> Result<usize, AllocationError> {
            if self.limit.is_some_and(|limit| byte_size > limit) {
                return Err(AllocationError::OutOfMemory { size: byte_size });
            }
            self.buffers.push((usage, vec![0; byte_size]));
            Ok(self.buffers.len() - 1)
        }

        fn upload(&mut self, handle: &usize, bytes: &[u8]) -> Result<(), AllocationError> {
            let buffer = &mut self.buffers[*handle].1;
            if bytes.len() > buffer.len() {
                return Err(AllocationError::Overflow { bytes: bytes.len(), capacity: buffer.len() });
            }
            buffer[..bytes.len()].copy_from_slice(bytes);
            Ok(())
        }
    }

    fn triangle() -> MeshGroup {
        let mut group = MeshGroup::new("tri", MaterialId(3));
        group.vertices = vec![
            Vertex::new([0.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
            Vertex::new([1.0, 0.0, 0.0], [0.0; 3], [0.0; 2]),
            Vertex::new([0.0, 1.0, 0.0], [0.0; 3], [0.0; 2]),
        ];
        group.indices = vec![0, 1, 2];
        group
    }

    #[test]
    fn test_uploader_allocates_vertex_and_index_buffers() {
        let mut uploader = BufferUploader::new(HostAllocator::default());
        uploader.finish_group(triangle()).unwrap();

        let (allocator, meshes) = uploader.into_parts();
        assert_eq!(meshes.len(), 1);
        assert_eq!(meshes[0].index_count, 3);
        assert_eq!(meshes[0].material_id, MaterialId(3));

        let (usage, bytes) = &allocator.buffers[meshes[0].vertex_buffer];
        assert!(usage.contains(BufferUsage::VERTEX | BufferUsage::TRANSFER_DST));
        assert_eq!(bytes.len(), 96);

        let (usage, bytes) = &allocator.buffers[meshes[0].index_buffer];
        assert!(usage.contains(BufferUsage::INDEX));
        assert_eq!(bytes.as_slice(), bytemuck::cast_slice::<u32, u8>(&[0, 1, 2]));
    }

    #[test]
    fn test_allocation_failure_is_fatal() {
        let allocator = HostAllocator { limit: Some(16), ..Default::default() };
        let mut uploader = BufferUploader::new(allocator);
        let err = uploader.finish_group(triangle()).unwrap_err();
        assert!(matches!(err, ModelError::Allocation(AllocationError::OutOfMemory { size: 96 })));
    }
}
