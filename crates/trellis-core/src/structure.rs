//! Structure trait and related types.
//!
//! A [`Structure`] is a geometric scene node, such as a mesh or a curve. The
//! surrounding scene graph owns the call schedule (when nodes are created,
//! evaluated, and deleted); structures only implement the geometric and
//! buffer logic inside those calls.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::device::RenderDevice;
use crate::pick::PickVisitor;

/// A stable identifier referencing another node in the owning scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Direction of an evaluation pass through the scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphDirection {
    /// From leaves toward roots.
    Upstream,
    /// From roots toward leaves.
    Downstream,
}

/// A geometric scene node.
///
/// Lifecycle: `create` allocates GPU-side resources, zero or more `evaluate`
/// passes recompute derived geometry and refresh buffers, `delete` releases
/// resources. A deleted structure may be created again.
pub trait Structure {
    /// Returns the name of this structure.
    fn name(&self) -> &str;

    /// Returns the type name of this structure (e.g., "`Mesh`", "`Curve`").
    fn type_name(&self) -> &'static str;

    /// Returns the local-space axis-aligned bounding box.
    ///
    /// Returns `None` if the structure has no spatial extent.
    fn bounding_box(&self) -> Option<(Vec3, Vec3)>;

    /// Allocates and populates GPU-side buffers.
    fn create(&mut self, device: &dyn RenderDevice);

    /// Releases GPU-side buffers.
    fn delete(&mut self);

    /// Recomputes derived geometry, then refreshes buffers.
    ///
    /// Derived data must be fully recomputed before buffers are updated:
    /// populating a buffer synchronously reads the just-computed arrays.
    fn evaluate(&mut self, device: &dyn RenderDevice, direction: GraphDirection);

    /// Submits this structure's primitives to a pick visitor.
    ///
    /// Returns true if the traversal produced at least one new hit.
    fn pick(&self, pick: &mut dyn PickVisitor) -> bool;
}
