//! The geometry buffer lifecycle.
//!
//! A [`GeometryBuffer`] manages the allocate/populate/release cycle for a
//! fixed-stride element array backing a GPU resource, without interpreting
//! element contents. Static buffers are recreated wholesale on any change;
//! dynamic buffers may be refilled in place when their size is unchanged.

use trellis_core::device::{BufferDescriptor, BufferKind, DeviceBuffer, RenderDevice};

/// A mapped buffer region handed to a populator, tracking a running offset.
pub struct PopulateArgs<'a> {
    kind: BufferKind,
    buffer: &'a mut [u8],
    offset: usize,
}

impl PopulateArgs<'_> {
    /// Returns whether the region belongs to a vertex or index buffer.
    #[must_use]
    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// Returns the running offset in bytes.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the number of bytes left to write.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.offset
    }

    /// Copies raw bytes at the running offset and advances it.
    ///
    /// # Panics
    /// Panics if the write would run past the end of the mapped region;
    /// that is a populator bug, not a recoverable condition.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let end = self.offset + bytes.len();
        self.buffer[self.offset..end].copy_from_slice(bytes);
        self.offset = end;
    }

    /// Writes a slice of plain-old-data elements at the running offset.
    pub fn write_slice<T: bytemuck::Pod>(&mut self, items: &[T]) {
        self.write_bytes(bytemuck::cast_slice(items));
    }
}

/// Fills a mapped buffer region.
///
/// Implemented by the node that owns the buffer; the populator is handed to
/// [`GeometryBuffer::create`]/[`GeometryBuffer::update`] at call time and
/// must consume exactly `element_count * element_size` bytes.
pub trait BufferPopulator {
    /// Writes this source's data into the mapped region.
    fn populate(&self, args: &mut PopulateArgs<'_>);
}

/// Blanket impl so closures can serve as populators in tests and tools.
impl<F: Fn(&mut PopulateArgs<'_>)> BufferPopulator for F {
    fn populate(&self, args: &mut PopulateArgs<'_>) {
        self(args);
    }
}

/// Lifecycle manager for one GPU-resident element array.
pub struct GeometryBuffer {
    kind: BufferKind,
    label: String,
    element_size: usize,
    element_count: usize,
    dynamic: bool,
    dirty: bool,
    handle: Option<Box<dyn DeviceBuffer>>,
}

impl GeometryBuffer {
    /// Creates an empty, unallocated buffer manager.
    #[must_use]
    pub fn new(kind: BufferKind, element_size: usize, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            element_size,
            element_count: 0,
            dynamic: false,
            dirty: false,
            handle: None,
        }
    }

    /// Sets the target element count. Marks dirty; no immediate reallocation.
    pub fn set_element_count(&mut self, count: usize) {
        self.element_count = count;
        self.dirty = true;
    }

    /// Returns the target element count.
    #[must_use]
    pub fn element_count(&self) -> usize {
        self.element_count
    }

    /// Returns the element stride in bytes.
    #[must_use]
    pub fn element_size(&self) -> usize {
        self.element_size
    }

    /// Returns the target size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.element_count * self.element_size
    }

    /// Marks the buffer contents stale, forcing reallocation on next update.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Sets whether the backing buffer is dynamic (refillable in place).
    pub fn set_dynamic(&mut self, dynamic: bool) {
        self.dynamic = dynamic;
    }

    /// Returns true if backing storage is currently allocated.
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.handle.is_some()
    }

    /// Allocates backing storage and populates it. No-op if already created.
    ///
    /// Allocation failure is logged and leaves the buffer uncreated; nothing
    /// downstream can render in that state, but the surface does not throw.
    pub fn create(&mut self, device: &dyn RenderDevice, populator: &dyn BufferPopulator) {
        if self.handle.is_some() {
            return;
        }

        let desc = BufferDescriptor {
            kind: self.kind,
            size_bytes: self.size_bytes(),
            dynamic: self.dynamic,
            label: self.label.clone(),
        };
        match device.create_buffer(&desc) {
            Ok(handle) => {
                self.handle = Some(handle);
                self.dirty = false;
                self.populate(populator);
            }
            Err(err) => {
                log::error!("'{}': {err}", self.label);
            }
        }
    }

    /// Refreshes the buffer.
    ///
    /// Not created: behaves as [`create`](Self::create). Created and dirty,
    /// or created but static: full delete + create (static buffers cannot be
    /// remapped safely). Created, dynamic, and clean: in-place refill only.
    pub fn update(&mut self, device: &dyn RenderDevice, populator: &dyn BufferPopulator) {
        if self.handle.is_none() {
            self.create(device, populator);
        } else if self.dirty || !self.dynamic {
            self.delete();
            self.create(device, populator);
        } else {
            self.populate(populator);
        }
    }

    /// Releases backing storage. No-op if not created.
    pub fn delete(&mut self) {
        self.handle = None;
    }

    /// Maps the backing storage, runs the populator, and unmaps.
    ///
    /// Callers must update any dependent index arithmetic (base offsets into
    /// a shared pool) before calling this: the populator synchronously reads
    /// whatever state it was built over.
    pub fn populate(&mut self, populator: &dyn BufferPopulator) {
        let Some(handle) = self.handle.as_mut() else {
            return;
        };

        let expected = self.element_count * self.element_size;
        let data = handle
            .map()
            .unwrap_or_else(|err| panic!("'{}': buffer map failed: {err}", self.label));

        let mut args = PopulateArgs {
            kind: self.kind,
            buffer: data,
            offset: 0,
        };
        populator.populate(&mut args);
        debug_assert_eq!(
            args.offset, expected,
            "'{}': populator wrote {} of {} bytes",
            self.label, args.offset, expected
        );

        handle.unmap();
    }
}
