//! Mesh structure.
//!
//! A [`Mesh`] owns parallel per-vertex arrays (positions, normals, colors,
//! UVs), a wireframe edge list, and a triangle list with tagged soft-delete:
//! a deleted triangle is `None` until the next compaction pass rebuilds the
//! vertex arrays. Editing operations live in `edit`, spatial queries in
//! `query`, hole punching in `clip`, and tangent-basis computation in `tnb`.

mod clip;
mod edit;
mod query;
mod tnb;

pub use clip::tri_minus_poly;
pub use query::MeshEdge;

use glam::{Mat4, Vec2, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use trellis_core::device::{BufferKind, RenderDevice};
use trellis_core::pick::{PickMode, PickVisitor};
use trellis_core::shader::{ShaderId, ShaderRegistry};
use trellis_core::structure::{GraphDirection, Structure};
use trellis_render::{
    pack_color, IndexBuffer, IndexElementType, PopulateArgs, StandardVertex, VertexBuffer,
    VertexElementType,
};

/// The GPU buffer pair owned by a mesh.
struct MeshBuffers {
    indices: IndexBuffer,
    vertices: VertexBuffer,
}

/// An editable triangle mesh scene node.
#[derive(Serialize, Deserialize)]
pub struct Mesh {
    name: String,

    // Persisted, parallel by vertex index
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    colors: Vec<Vec4>,
    base_uvs: Vec<Vec2>,

    // Persisted index data. Wireframe edges are unordered vertex pairs kept
    // deduplicated by the editing operations; a `None` triangle is deleted
    // and pending compaction.
    wireframe_edges: Vec<[u32; 2]>,
    triangles: Vec<Option<[u32; 3]>>,

    // Persisted, parallel by triangle index
    polygon_indices: Vec<u32>,
    shader_indices: Vec<u32>,

    // Persisted, per mesh. Triangles are sorted by shader, so each shader's
    // range is recoverable from the counts by prefix sum.
    shader_ids: Vec<ShaderId>,
    shader_triangle_counts: Vec<u32>,

    // Derived
    #[serde(skip)]
    pub(crate) tangents: Vec<Vec3>,
    #[serde(skip)]
    pub(crate) binormals: Vec<Vec3>,
    #[serde(skip)]
    shader_start_indices: Vec<u32>,
    #[serde(skip)]
    has_alpha: bool,
    #[serde(skip)]
    has_color: bool,
    #[serde(skip)]
    has_texture: bool,
    #[serde(skip)]
    bounds: Option<(Vec3, Vec3)>,

    #[serde(skip)]
    transform: Mat4,

    #[serde(skip)]
    buffers: Option<MeshBuffers>,
}

impl Mesh {
    /// Creates an empty mesh.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            positions: Vec::new(),
            normals: Vec::new(),
            colors: Vec::new(),
            base_uvs: Vec::new(),
            wireframe_edges: Vec::new(),
            triangles: Vec::new(),
            polygon_indices: Vec::new(),
            shader_indices: Vec::new(),
            shader_ids: Vec::new(),
            shader_triangle_counts: Vec::new(),
            tangents: Vec::new(),
            binormals: Vec::new(),
            shader_start_indices: Vec::new(),
            has_alpha: false,
            has_color: false,
            has_texture: false,
            bounds: None,
            transform: Mat4::IDENTITY,
            buffers: None,
        }
    }

    /// Creates a mesh from positions and triangles.
    ///
    /// The wireframe edge list is built deduplicated, first-seen orientation
    /// winning, matching what repeated [`add_triangle`](Self::add_triangle)
    /// calls would produce.
    #[must_use]
    pub fn from_triangles(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        triangles: Vec<[u32; 3]>,
    ) -> Self {
        let mut mesh = Self::new(name);
        mesh.positions = positions;

        let mut seen = std::collections::HashSet::new();
        for tri in &triangles {
            for edge in [[tri[0], tri[1]], [tri[1], tri[2]], [tri[2], tri[0]]] {
                let key = (edge[0].min(edge[1]), edge[0].max(edge[1]));
                if seen.insert(key) {
                    mesh.wireframe_edges.push(edge);
                }
            }
        }
        mesh.triangles = triangles.into_iter().map(Some).collect();
        mesh
    }

    /// Sets per-vertex normals.
    pub fn set_normals(&mut self, normals: Vec<Vec3>) {
        self.normals = normals;
    }

    /// Sets per-vertex colors (or a single uniform color).
    pub fn set_colors(&mut self, colors: Vec<Vec4>) {
        self.colors = colors;
    }

    /// Sets per-vertex base UVs.
    pub fn set_base_uvs(&mut self, base_uvs: Vec<Vec2>) {
        self.base_uvs = base_uvs;
    }

    // === Accessors ===

    /// Returns the vertex positions.
    #[must_use]
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Returns the per-vertex normals (may be empty).
    #[must_use]
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    /// Returns the per-vertex colors (may be empty, or a single uniform color).
    #[must_use]
    pub fn colors(&self) -> &[Vec4] {
        &self.colors
    }

    /// Returns the per-vertex base UVs (may be empty).
    #[must_use]
    pub fn base_uvs(&self) -> &[Vec2] {
        &self.base_uvs
    }

    /// Returns the computed per-vertex tangents (empty until computed).
    #[must_use]
    pub fn tangents(&self) -> &[Vec3] {
        &self.tangents
    }

    /// Returns the computed per-vertex binormals (empty until computed).
    #[must_use]
    pub fn binormals(&self) -> &[Vec3] {
        &self.binormals
    }

    /// Returns the wireframe edge list.
    #[must_use]
    pub fn wireframe_edges(&self) -> &[[u32; 2]] {
        &self.wireframe_edges
    }

    /// Returns the triangle slots (`None` = deleted, pending compaction).
    #[must_use]
    pub fn triangles(&self) -> &[Option<[u32; 3]>] {
        &self.triangles
    }

    /// Returns the per-triangle source polygon indices.
    #[must_use]
    pub fn polygon_indices(&self) -> &[u32] {
        &self.polygon_indices
    }

    /// Returns the per-triangle shader indices.
    #[must_use]
    pub fn shader_indices(&self) -> &[u32] {
        &self.shader_indices
    }

    /// Returns the referenced shader identifiers.
    #[must_use]
    pub fn shader_ids(&self) -> &[ShaderId] {
        &self.shader_ids
    }

    /// Returns how many triangles consume each shader.
    #[must_use]
    pub fn shader_triangle_counts(&self) -> &[u32] {
        &self.shader_triangle_counts
    }

    /// Returns each shader's starting triangle, from the prefix sums.
    #[must_use]
    pub fn shader_start_indices(&self) -> &[u32] {
        &self.shader_start_indices
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of triangle slots, deleted ones included.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    /// Returns the number of live (non-deleted) triangles.
    #[must_use]
    pub fn live_triangle_count(&self) -> usize {
        self.triangles.iter().flatten().count()
    }

    /// Returns the number of wireframe edges.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.wireframe_edges.len()
    }

    /// Returns the vertex indices of triangle `index`, if it is live.
    #[must_use]
    pub fn triangle(&self, index: usize) -> Option<[u32; 3]> {
        self.triangles.get(index).copied().flatten()
    }

    /// Returns the positions of triangle `index`, optionally transformed.
    #[must_use]
    pub fn triangle_positions(&self, index: usize, transform: Option<&Mat4>) -> Option<[Vec3; 3]> {
        let tri = self.triangle(index)?;
        let mut verts = [
            self.positions[tri[0] as usize],
            self.positions[tri[1] as usize],
            self.positions[tri[2] as usize],
        ];
        if let Some(m) = transform {
            for v in &mut verts {
                *v = m.transform_point3(*v);
            }
        }
        Some(verts)
    }

    /// Iterates live triangles as `(slot index, vertex indices)`.
    pub fn live_triangles(&self) -> impl Iterator<Item = (usize, [u32; 3])> + '_ {
        self.triangles
            .iter()
            .enumerate()
            .filter_map(|(i, tri)| tri.map(|t| (i, t)))
    }

    /// Returns the node's global transform.
    #[must_use]
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Sets the node's global transform.
    pub fn set_transform(&mut self, transform: Mat4) {
        self.transform = transform;
    }

    // === Shaders ===

    /// Adds a shader reference, deduplicating by identity.
    ///
    /// New shaders are registered with the scene. Returns the shader's index
    /// into [`shader_ids`](Self::shader_ids).
    pub fn add_shader(&mut self, registry: &mut dyn ShaderRegistry, id: ShaderId) -> u32 {
        if let Some(index) = self.shader_ids.iter().position(|&existing| existing == id) {
            return index as u32;
        }

        registry.register(id);
        self.shader_ids.push(id);
        (self.shader_ids.len() - 1) as u32
    }

    /// Resolves shader-derived flags and the per-shader triangle ranges.
    ///
    /// Call once after loading, before the first evaluation; shader ids the
    /// registry cannot resolve contribute nothing (the range bookkeeping is
    /// kept so draw batching stays aligned).
    pub fn initialize(&mut self, registry: &dyn ShaderRegistry) {
        self.has_alpha = false;
        self.has_texture = false;
        for &id in &self.shader_ids {
            if let Some(info) = registry.shader_info(id) {
                self.has_alpha |= info.has_alpha;
                self.has_texture |= info.has_texture;
            } else {
                log::warn!("'{}': unresolved shader {id}", self.name);
            }
        }

        self.has_color = match self.colors.len() {
            0 => false,
            1 => self.colors[0] != Vec4::new(0.0, 0.0, 0.0, 1.0),
            _ => true,
        };

        self.shader_start_indices.clear();
        let mut count = 0;
        for &triangles in &self.shader_triangle_counts {
            self.shader_start_indices.push(count);
            count += triangles;
        }
    }

    /// The mesh blends with alpha (any shader does).
    #[must_use]
    pub fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    /// The mesh carries meaningful vertex color.
    #[must_use]
    pub fn has_color(&self) -> bool {
        self.has_color
    }

    /// The mesh samples a base texture (any shader does).
    #[must_use]
    pub fn has_texture(&self) -> bool {
        self.has_texture
    }

    // === Bounds ===

    /// Recomputes and returns the local-space bounds of all vertices.
    #[must_use]
    pub fn aligned_bounds(&self) -> Option<(Vec3, Vec3)> {
        if self.positions.is_empty() {
            return None;
        }
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for &p in &self.positions {
            min = min.min(p);
            max = max.max(p);
        }
        Some((min, max))
    }

    /// Returns a bounding sphere centered on the bounds' midpoint.
    #[must_use]
    pub fn bounding_sphere(&self) -> Option<(Vec3, f32)> {
        let (min, max) = self.aligned_bounds()?;
        let center = (min + max) * 0.5;
        let radius = self
            .positions
            .iter()
            .map(|p| (*p - center).length_squared())
            .fold(0.0f32, f32::max)
            .sqrt();
        Some((center, radius))
    }

    // === Buffer plumbing ===

    /// Index count the buffer must hold: wireframe pairs then live triangles.
    fn index_element_count(&self) -> usize {
        self.wireframe_edges.len() * 2 + self.live_triangle_count() * 3
    }
}

/// Writes the mesh's index and vertex data into its buffers.
struct MeshGeometrySource<'a>(&'a Mesh);

impl trellis_render::BufferPopulator for MeshGeometrySource<'_> {
    fn populate(&self, args: &mut PopulateArgs<'_>) {
        let mesh = self.0;
        match args.kind() {
            BufferKind::Index => {
                for edge in &mesh.wireframe_edges {
                    args.write_slice(edge);
                }
                for (_, tri) in mesh.live_triangles() {
                    args.write_slice(&tri);
                }
            }
            BufferKind::Vertex => {
                for (i, &position) in mesh.positions.iter().enumerate() {
                    let mut vertex = StandardVertex::at(position);
                    if let Some(normal) = mesh.normals.get(i) {
                        vertex.normal = normal.to_array();
                    }
                    if mesh.has_color {
                        let color = mesh
                            .colors
                            .get(i)
                            .or_else(|| mesh.colors.first())
                            .copied()
                            .unwrap_or(Vec4::ONE);
                        vertex.diffuse = pack_color(color);
                    }
                    if mesh.has_texture {
                        if let Some(&uv) = mesh.base_uvs.get(i) {
                            vertex.set_base_uv(uv);
                        }
                    }
                    args.write_slice(&[vertex]);
                }
            }
        }
    }
}

impl Structure for Mesh {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        "Mesh"
    }

    fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        self.bounds.or_else(|| self.aligned_bounds())
    }

    fn create(&mut self, device: &dyn RenderDevice) {
        let mut buffers = self.buffers.take().unwrap_or_else(|| MeshBuffers {
            indices: IndexBuffer::new(IndexElementType::U32, format!("{}.indices", self.name)),
            vertices: VertexBuffer::new(VertexElementType::Standard, format!("{}.vertices", self.name)),
        });
        buffers.indices.set_element_count(self.index_element_count());
        buffers.vertices.set_element_count(self.positions.len());
        buffers.indices.create(device, &MeshGeometrySource(self));
        buffers.vertices.create(device, &MeshGeometrySource(self));
        self.buffers = Some(buffers);
    }

    fn delete(&mut self) {
        if let Some(buffers) = self.buffers.as_mut() {
            buffers.indices.delete();
            buffers.vertices.delete();
        }
    }

    fn evaluate(&mut self, device: &dyn RenderDevice, direction: GraphDirection) {
        if direction != GraphDirection::Downstream {
            return;
        }

        // Bounds first; populate reads the just-computed state.
        self.bounds = self.aligned_bounds();

        if let Some(mut buffers) = self.buffers.take() {
            buffers.indices.set_element_count(self.index_element_count());
            buffers.vertices.set_element_count(self.positions.len());
            buffers.indices.update(device, &MeshGeometrySource(self));
            buffers.vertices.update(device, &MeshGeometrySource(self));
            self.buffers = Some(buffers);
        }
    }

    fn pick(&self, pick: &mut dyn PickVisitor) -> bool {
        let before = pick.hit_count();
        pick.set_current_object(self.transform);

        if pick.mode() == PickMode::Wireframe {
            for edge in &self.wireframe_edges {
                pick.pick_segment(
                    self.positions[edge[0] as usize],
                    self.positions[edge[1] as usize],
                    -1.0,
                );
            }
        } else {
            for (_, tri) in self.live_triangles() {
                pick.pick_triangle(
                    self.positions[tri[0] as usize],
                    self.positions[tri[1] as usize],
                    self.positions[tri[2] as usize],
                );
            }
        }

        pick.hit_count() > before
    }
}
