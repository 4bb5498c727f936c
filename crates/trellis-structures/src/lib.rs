//! Structure implementations for trellis.
//!
//! The geometric scene nodes:
//! - [`Mesh`]: editable triangle mesh with welding, pruning, clipping,
//!   tangent-basis computation, and brute-force spatial queries
//! - [`Curve`]: control-point curve tessellated by B-spline or Catmull-Rom
//!   evaluation
//! - [`Skin`]: vertex-to-bone influence table with deform matrix blending

#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Index math between u32 vertex indices and usize arrays is pervasive here
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod curve;
pub mod mesh;
pub mod skin;

pub use curve::{evaluate_curve, ControlPointLabel, Curve, CurveKind};
pub use mesh::{tri_minus_poly, Mesh, MeshEdge};
pub use skin::{BoneTransform, Influence, Skin, TransformResolver};
