//! trellis: a scene-geometry core.
//!
//! Trellis implements the geometric heart of a scene-graph editor: editable
//! triangle meshes, tessellated control-point curves, skinning tables, and
//! the GPU buffer lifecycle that keeps them renderable. The surrounding
//! editor concerns (viewport, UI, undo, serialization format, the real GPU
//! backend) are external collaborators reached through narrow traits.
//!
//! # Quick Start
//!
//! ```
//! use trellis::*;
//!
//! // A ground quad with a triangle hole-punched out of it.
//! let mut mesh = Mesh::from_triangles(
//!     "ground",
//!     vec![
//!         Vec3::new(0.0, 0.0, 0.0),
//!         Vec3::new(1.0, 0.0, 0.0),
//!         Vec3::new(1.0, 0.0, 1.0),
//!         Vec3::new(0.0, 0.0, 1.0),
//!     ],
//!     vec![[0, 1, 2], [0, 2, 3]],
//! );
//! mesh.delete_triangles(&[1]);
//! assert_eq!(mesh.vertex_count(), 3);
//!
//! // Buffers live on a device; the headless one needs no GPU.
//! let device = HeadlessDevice::new();
//! mesh.create(&device);
//! mesh.evaluate(&device, GraphDirection::Downstream);
//! ```
//!
//! # Structures
//!
//! - [`Mesh`] - editable triangle mesh: welding, pruning, cube hole
//!   punching, closest-point queries, tangent bases
//! - [`Curve`] - ordered control points tessellated by B-spline or
//!   Catmull-Rom bases
//! - [`Skin`] - per-vertex bone influences blended into deform matrices

// Re-export core types
pub use trellis_core::{
    device::{BufferDescriptor, BufferKind, DeviceBuffer, RenderDevice},
    error::{Result, TrellisError},
    pick::{PickHit, PickMode, PickVisitor, RayPickVisitor},
    shader::{ShaderId, ShaderInfo, ShaderRegistry},
    structure::{GraphDirection, NodeId, Structure},
    Mat4, Vec2, Vec3, Vec4,
};

// Re-export buffer management
pub use trellis_render::{
    pack_color, BufferPopulator, GeometryBuffer, HeadlessDevice, IndexBuffer, IndexElementType,
    PopulateArgs, PositionVertex, StandardVertex, VertexBuffer, VertexElementType,
};

// Re-export structures
pub use trellis_structures::{
    evaluate_curve, tri_minus_poly, BoneTransform, ControlPointLabel, Curve, CurveKind, Influence,
    Mesh, MeshEdge, Skin, TransformResolver,
};
