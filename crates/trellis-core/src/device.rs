//! Renderer backend contract.
//!
//! The actual renderer is an external collaborator. This module defines the
//! narrow interface the geometry core consumes: allocate a buffer of N bytes,
//! map it for writing, unmap, release. Implementations live elsewhere
//! (`trellis-render` ships a headless in-memory device; a real backend wraps
//! its GPU API here).

use crate::error::Result;

/// What a buffer holds, from the device's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    /// Vertex data.
    Vertex,
    /// Index data.
    Index,
}

/// Creation parameters for a device buffer.
#[derive(Debug, Clone)]
pub struct BufferDescriptor {
    /// Vertex or index usage.
    pub kind: BufferKind,
    /// Total size in bytes.
    pub size_bytes: usize,
    /// Dynamic buffers may be refilled in place; static buffers must be
    /// recreated to change contents.
    pub dynamic: bool,
    /// Debug label.
    pub label: String,
}

/// A buffer allocated from a [`RenderDevice`].
///
/// Mapping follows the scoped-acquisition pattern (map, write, unmap). This
/// is a driver memory-mapping operation, not a mutex: the core is
/// single-threaded and only one map is ever outstanding per buffer.
pub trait DeviceBuffer {
    /// Returns the buffer size in bytes.
    fn len(&self) -> usize;

    /// Returns true if the buffer is zero-sized.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maps the buffer for writing.
    ///
    /// A failure here indicates platform resource exhaustion, not a
    /// recoverable condition; callers treat it as fatal.
    fn map(&mut self) -> Result<&mut [u8]>;

    /// Unmaps the buffer, committing written data.
    fn unmap(&mut self);
}

/// Allocates device buffers.
pub trait RenderDevice {
    /// Creates a buffer per the descriptor.
    ///
    /// # Errors
    /// Returns [`TrellisError::AllocationFailed`](crate::TrellisError::AllocationFailed)
    /// when the device cannot satisfy the request.
    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<Box<dyn DeviceBuffer>>;
}
