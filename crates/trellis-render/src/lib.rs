//! GPU buffer lifecycle for trellis.
//!
//! This crate provides the buffer-management layer between geometric
//! structures and the renderer backend:
//! - [`GeometryBuffer`]: the allocate/populate/release state machine
//! - [`IndexBuffer`] / [`VertexBuffer`]: its two element-typed variants
//! - Vertex layouts ([`PositionVertex`], [`StandardVertex`])
//! - [`HeadlessDevice`]: an in-memory device for tests and tooling
//!
//! The renderer backend itself is an external collaborator reached through
//! the [`trellis_core::device`] traits.

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

pub mod device;
pub mod index_buffer;
pub mod resource;
pub mod vertex;
pub mod vertex_buffer;

pub use device::{HeadlessBuffer, HeadlessDevice};
pub use index_buffer::IndexBuffer;
pub use resource::{BufferPopulator, GeometryBuffer, PopulateArgs};
pub use vertex::{
    pack_color, IndexElementType, PositionVertex, StandardVertex, VertexElementType,
};
pub use vertex_buffer::VertexBuffer;
