//! Headless device: an in-memory [`RenderDevice`] implementation.
//!
//! Backs buffers with plain byte vectors so the geometry core can run
//! without a GPU (tests, asset tooling, CI). A real backend implements the
//! same traits over its graphics API and is otherwise out of scope here.

use std::cell::Cell;

use trellis_core::device::{BufferDescriptor, DeviceBuffer, RenderDevice};
use trellis_core::error::{Result, TrellisError};

/// An in-memory render device.
#[derive(Default)]
pub struct HeadlessDevice {
    allocations: Cell<usize>,
    fail_next: Cell<bool>,
}

impl HeadlessDevice {
    /// Creates a device with no allocations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns how many buffers this device has allocated so far.
    ///
    /// Lifecycle tests use this to distinguish full reallocation from
    /// in-place refills.
    #[must_use]
    pub fn allocation_count(&self) -> usize {
        self.allocations.get()
    }

    /// Makes the next `create_buffer` call fail, simulating exhaustion.
    pub fn fail_next_allocation(&self) {
        self.fail_next.set(true);
    }
}

impl RenderDevice for HeadlessDevice {
    fn create_buffer(&self, desc: &BufferDescriptor) -> Result<Box<dyn DeviceBuffer>> {
        if self.fail_next.take() {
            return Err(TrellisError::AllocationFailed {
                label: desc.label.clone(),
                bytes: desc.size_bytes,
            });
        }

        self.allocations.set(self.allocations.get() + 1);
        Ok(Box::new(HeadlessBuffer {
            data: vec![0; desc.size_bytes],
            mapped: false,
        }))
    }
}

/// A buffer allocated by [`HeadlessDevice`].
pub struct HeadlessBuffer {
    data: Vec<u8>,
    mapped: bool,
}

impl DeviceBuffer for HeadlessBuffer {
    fn len(&self) -> usize {
        self.data.len()
    }

    fn map(&mut self) -> Result<&mut [u8]> {
        debug_assert!(!self.mapped, "buffer mapped twice without unmap");
        self.mapped = true;
        Ok(&mut self.data)
    }

    fn unmap(&mut self) {
        debug_assert!(self.mapped, "unmap without map");
        self.mapped = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::device::BufferKind;

    fn desc(bytes: usize) -> BufferDescriptor {
        BufferDescriptor {
            kind: BufferKind::Vertex,
            size_bytes: bytes,
            dynamic: false,
            label: "test".to_string(),
        }
    }

    #[test]
    fn test_allocate_map_write_unmap() {
        let device = HeadlessDevice::new();
        let mut buffer = device.create_buffer(&desc(16)).unwrap();
        assert_eq!(buffer.len(), 16);

        let data = buffer.map().unwrap();
        data[0] = 0xAB;
        buffer.unmap();
        assert_eq!(device.allocation_count(), 1);
    }

    #[test]
    fn test_injected_failure() {
        let device = HeadlessDevice::new();
        device.fail_next_allocation();
        assert!(device.create_buffer(&desc(16)).is_err());
        // Only the next allocation fails.
        assert!(device.create_buffer(&desc(16)).is_ok());
    }
}
