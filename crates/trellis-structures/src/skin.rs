//! Skinning: per-vertex deformation matrix blending.
//!
//! A [`Skin`] maps each mesh vertex to an [`Influence`] (a weighted list of
//! bones). Evaluation resolves each bone through the scene collaborator into
//! a deform matrix (current global transform composed with the inverse bind
//! transform); blending a vertex is the weighted sum of its bones' deform
//! matrices. When the skinned mesh itself carries a global transform, the
//! deform matrices are re-expressed in mesh-local space once at evaluation
//! rather than per vertex.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use trellis_core::structure::NodeId;

/// A weighted set of bones deforming one vertex.
///
/// `objects` indexes the owning skin's bone table; `weights` is parallel.
/// Weights are assumed to sum to 1; no renormalization is performed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Influence {
    /// Indices into the skin's bone table.
    pub objects: Vec<u32>,
    /// Blend weight per bone.
    pub weights: Vec<f32>,
}

/// Bind-time and current transforms for one bone, supplied by the scene.
#[derive(Debug, Clone, Copy)]
pub struct BoneTransform {
    /// Inverse of the bone's global transform at bind time.
    pub inverse_bind: Mat4,
    /// The bone's current global transform.
    pub global: Mat4,
}

/// Scene-side transform lookup, an external collaborator.
pub trait TransformResolver {
    /// Resolves a bone's bind and current transforms.
    fn bone_transform(&self, id: NodeId) -> Option<BoneTransform>;

    /// Resolves a node's current global transform.
    fn node_global_transform(&self, id: NodeId) -> Option<Mat4>;
}

/// A vertex-to-bone weighting table tied to one mesh.
#[derive(Serialize, Deserialize)]
pub struct Skin {
    mesh: NodeId,
    bones: Vec<NodeId>,
    influences: Vec<Influence>,
    /// One entry per mesh vertex, indexing into `influences`.
    influence_indices: Vec<u32>,

    #[serde(skip)]
    deform_matrices: Vec<Mat4>,
}

impl Skin {
    /// Creates a skin for `mesh` over the given bone table.
    #[must_use]
    pub fn new(
        mesh: NodeId,
        bones: Vec<NodeId>,
        influences: Vec<Influence>,
        influence_indices: Vec<u32>,
    ) -> Self {
        Self {
            mesh,
            bones,
            influences,
            influence_indices,
            deform_matrices: Vec::new(),
        }
    }

    /// Returns the skinned mesh's node id.
    #[must_use]
    pub fn mesh(&self) -> NodeId {
        self.mesh
    }

    /// Returns the bone table.
    #[must_use]
    pub fn bones(&self) -> &[NodeId] {
        &self.bones
    }

    /// Returns the influence table.
    #[must_use]
    pub fn influences(&self) -> &[Influence] {
        &self.influences
    }

    /// Returns the per-vertex influence indices.
    #[must_use]
    pub fn influence_indices(&self) -> &[u32] {
        &self.influence_indices
    }

    /// Returns the deform matrices from the last evaluation.
    #[must_use]
    pub fn deform_matrices(&self) -> &[Mat4] {
        &self.deform_matrices
    }

    /// Recomputes the per-bone deform matrices from current transforms.
    ///
    /// Bones the resolver cannot find deform as identity. The mesh's own
    /// global transform is checked once here and folded into every deform
    /// matrix, so blending needs no per-vertex correction afterward.
    pub fn evaluate(&mut self, resolver: &dyn TransformResolver) {
        let mesh_global = resolver
            .node_global_transform(self.mesh)
            .unwrap_or(Mat4::IDENTITY);
        let mesh_local = if mesh_global == Mat4::IDENTITY {
            None
        } else {
            Some((mesh_global.inverse(), mesh_global))
        };

        self.deform_matrices = self
            .bones
            .iter()
            .map(|&bone| {
                let Some(t) = resolver.bone_transform(bone) else {
                    log::warn!("skin for mesh {}: unresolved bone {bone}", self.mesh);
                    return Mat4::IDENTITY;
                };
                let deform = t.global * t.inverse_bind;
                match mesh_local {
                    Some((inverse, global)) => inverse * deform * global,
                    None => deform,
                }
            })
            .collect();
    }

    /// Blends one influence into a deformation matrix.
    ///
    /// The weighted sum of the influence's bone deform matrices; weights are
    /// trusted to sum to 1.
    #[must_use]
    pub fn blend_matrix(&self, influence: &Influence) -> Mat4 {
        let mut blended = Mat4::ZERO;
        for (&object, &weight) in influence.objects.iter().zip(&influence.weights) {
            blended += self.deform_matrices[object as usize] * weight;
        }
        blended
    }

    /// Returns the blended deformation matrix for one vertex.
    #[must_use]
    pub fn vertex_matrix(&self, vertex: usize) -> Mat4 {
        let influence = &self.influences[self.influence_indices[vertex] as usize];
        self.blend_matrix(influence)
    }

    /// Deforms a position array (one entry per skinned vertex).
    ///
    /// # Panics
    /// Panics if `positions` is longer than the influence index table.
    #[must_use]
    pub fn deform_positions(&self, positions: &[Vec3]) -> Vec<Vec3> {
        positions
            .iter()
            .enumerate()
            .map(|(i, &p)| self.vertex_matrix(i).transform_point3(p))
            .collect()
    }
}
