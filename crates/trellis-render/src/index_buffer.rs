//! Index buffer: the index-typed [`GeometryBuffer`] variant.

use trellis_core::device::{BufferKind, RenderDevice};

use crate::resource::{BufferPopulator, GeometryBuffer};
use crate::vertex::IndexElementType;

/// A geometry buffer holding vertex indices.
pub struct IndexBuffer {
    inner: GeometryBuffer,
    element_type: IndexElementType,
}

impl IndexBuffer {
    /// Creates an unallocated index buffer of the given index width.
    #[must_use]
    pub fn new(element_type: IndexElementType, label: impl Into<String>) -> Self {
        Self {
            inner: GeometryBuffer::new(BufferKind::Index, element_type.size(), label),
            element_type,
        }
    }

    /// Returns the index width.
    #[must_use]
    pub fn element_type(&self) -> IndexElementType {
        self.element_type
    }

    /// Sets the target index count; marks dirty.
    pub fn set_element_count(&mut self, count: usize) {
        self.inner.set_element_count(count);
    }

    /// Returns the target index count.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.inner.element_count()
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

    #[test]
    fn test_index_buffer_stride() {
        let buffer = IndexBuffer::new(IndexElementType::U32, "indices");
        assert_eq!(buffer.element_type().size(), 4);
    }

    #[test]
    fn test_index_buffer_roundtrip() {
        let device = HeadlessDevice::new();
        let indices: Vec<u32> = vec![0, 1, 2, 2, 3, 0];

        let mut buffer = IndexBuffer::new(IndexElementType::U32, "indices");
        buffer.set_element_count(indices.len());
        buffer.create(&device, &|args: &mut PopulateArgs<'_>| {
            args.write_slice(&indices);
        });

        assert!(buffer.is_created());
        assert_eq!(buffer.element_count(), 6);
    }
}
