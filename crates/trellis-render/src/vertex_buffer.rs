//! Vertex buffer: the vertex-typed [`GeometryBuffer`] variant.

use trellis_core::device::{BufferKind, RenderDevice};

use crate::resource::{BufferPopulator, GeometryBuffer};
use crate::vertex::VertexElementType;

/// A geometry buffer holding laid-out vertex data.
pub struct VertexBuffer {
    inner: GeometryBuffer,
    element_type: VertexElementType,
}

impl VertexBuffer {
    /// Creates an unallocated vertex buffer of the given layout.
    #[must_use]
    pub fn new(element_type: VertexElementType, label: impl Into<String>) -> Self {
        Self {
            inner: GeometryBuffer::new(BufferKind::Vertex, element_type.size(), label),
            element_type,
        }
    }

    /// Returns the vertex layout.
    #[must_use]
    pub fn element_type(&self) -> VertexElementType {
        self.element_type
    }

    /// Sets the target vertex count; marks dirty.
    pub fn set_element_count(&mut self, count: usize) {
        self.inner.set_element_count(count);
    }

    /// Returns the target vertex count.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.inner.element_count()
    }

    /// Marks the buffer contents stale.
    pub fn mark_dirty(&mut self) {
        self.inner.mark_dirty();
    }

    /// Sets whether the backing buffer is dynamic.
    pub fn set_dynamic(&mut self, dynamic: bool) {
        self.inner.set_dynamic(dynamic);
    }

    /// Returns true if backing storage is allocated.
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.inner.is_created()
    }

    /// Allocates and populates. See [`GeometryBuffer::create`].
    pub fn create(&mut self, device: &dyn RenderDevice, populator: &dyn BufferPopulator) {
        self.inner.create(device, populator);
    }

    /// Refreshes. See [`GeometryBuffer::update`].
    pub fn update(&mut self, device: &dyn RenderDevice, populator: &dyn BufferPopulator) {
        self.inner.update(device, populator);
    }

    /// Releases backing storage.
    pub fn delete(&mut self) {
        self.inner.delete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::HeadlessDevice;
    use crate::resource::PopulateArgs;
    use crate::vertex::PositionVertex;
    use glam::Vec3;

    #[test]
    fn test_vertex_buffer_roundtrip() {
        let device = HeadlessDevice::new();
        let verts = vec![
            PositionVertex::new(Vec3::ZERO),
            PositionVertex::new(Vec3::X),
            PositionVertex::new(Vec3::Y),
        ];

        let mut buffer = VertexBuffer::new(VertexElementType::Position, "verts");
        buffer.set_element_count(verts.len());
        buffer.create(&device, &|args: &mut PopulateArgs<'_>| {
            args.write_slice(&verts);
        });

        assert!(buffer.is_created());
        assert_eq!(buffer.element_count(), 3);
    }
}
