//! Core abstractions for trellis.
//!
//! This crate provides the fundamental traits and types used throughout
//! trellis:
//! - [`Structure`] trait for geometric scene nodes (meshes, curves)
//! - [`PickVisitor`] contract for selection traversals
//! - [`RenderDevice`] contract for the renderer backend collaborator
//! - Error taxonomy and shader identifiers

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod device;
pub mod error;
pub mod pick;
pub mod shader;
pub mod structure;

pub use device::{BufferDescriptor, BufferKind, DeviceBuffer, RenderDevice};
pub use error::{Result, TrellisError};
pub use pick::{PickHit, PickMode, PickVisitor, RayPickVisitor};
pub use shader::{ShaderId, ShaderInfo, ShaderRegistry};
pub use structure::{GraphDirection, NodeId, Structure};

// Re-export glam types for convenience
pub use glam::{Mat4, Vec2, Vec3, Vec4};
