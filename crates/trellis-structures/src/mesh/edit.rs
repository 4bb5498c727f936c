//! Mesh editing operations.
//!
//! Deletion is two-phase: triangles are first marked deleted (their slot
//! becomes `None`), then [`Mesh::prune_verts_not_in_tris`] compacts the
//! vertex arrays and rebuilds the index lists. Pruning is the single place
//! vertex-index validity is restored after any delete.

use std::collections::{BTreeMap, HashSet};

use glam::Vec3;

use super::Mesh;

/// Compacts a per-vertex array through a remap table, first occurrence wins.
///
/// Arrays whose length does not match the remap (absent or uniform
/// attributes) are left untouched.
fn compact_attribute<T: Copy>(data: &mut Vec<T>, remap: &[u32], new_len: usize) {
    if data.len() != remap.len() {
        return;
    }
    let mut out: Vec<T> = Vec::with_capacity(new_len);
    for (i, &target) in remap.iter().enumerate() {
        // The first old index mapping to each new slot appears in ascending
        // order, so a single pass fills the compacted array.
        if target != u32::MAX && target as usize == out.len() {
            out.push(data[i]);
        }
    }
    debug_assert_eq!(out.len(), new_len);
    *data = out;
}

impl Mesh {
    /// Finds the wireframe edge joining `a` and `b` in either orientation.
    #[must_use]
    pub fn get_edge_id_for_verts(&self, a: u32, b: u32) -> Option<u32> {
        self.wireframe_edges
            .iter()
            .position(|e| (e[0] == a && e[1] == b) || (e[0] == b && e[1] == a))
            .map(|i| i as u32)
    }

    /// Appends a triangle, adding any of its edges not already present.
    ///
    /// The duplicate check is a linear scan per edge; edits are infrequent
    /// relative to rendering.
    pub fn add_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.triangles.push(Some([a, b, c]));
        for (x, y) in [(a, b), (b, c), (c, a)] {
            if self.get_edge_id_for_verts(x, y).is_none() {
                self.wireframe_edges.push([x, y]);
            }
        }
    }

    /// Marks the named triangles deleted without compacting.
    pub fn mark_triangles_deleted(&mut self, triangles: &[u32]) {
        for &index in triangles {
            debug_assert!((index as usize) < self.triangles.len());
            if let Some(slot) = self.triangles.get_mut(index as usize) {
                *slot = None;
            }
        }
    }

    /// Marks every triangle referencing any of `vertices` deleted.
    pub fn mark_triangles_with_verts(&mut self, vertices: &[u32]) {
        for slot in &mut self.triangles {
            if let Some(tri) = slot {
                if tri.iter().any(|v| vertices.contains(v)) {
                    *slot = None;
                }
            }
        }
    }

    /// Marks every triangle containing both endpoints of any named edge deleted.
    pub fn mark_triangles_with_edges(&mut self, edges: &[u32]) {
        for &edge in edges {
            let Some(&[v1, v2]) = self.wireframe_edges.get(edge as usize) else {
                continue;
            };
            for slot in &mut self.triangles {
                if let Some(tri) = slot {
                    if tri.contains(&v1) && tri.contains(&v2) {
                        *slot = None;
                    }
                }
            }
        }
    }

    /// Deletes the named triangles and compacts.
    pub fn delete_triangles(&mut self, triangles: &[u32]) {
        self.mark_triangles_deleted(triangles);
        self.prune_verts_not_in_tris();
    }

    /// Deletes every triangle referencing any of `vertices`, then compacts.
    pub fn delete_vertices(&mut self, vertices: &[u32]) {
        self.mark_triangles_with_verts(vertices);
        self.prune_verts_not_in_tris();
    }

    /// Deletes every triangle using any named wireframe edge, then compacts.
    pub fn delete_edges(&mut self, edges: &[u32]) {
        self.mark_triangles_with_edges(edges);
        self.prune_verts_not_in_tris();
    }

    /// Drops vertices referenced by no live triangle and rebuilds indices.
    ///
    /// Surviving vertices keep their relative order; deleted triangle slots
    /// vanish; the wireframe edge list is rebuilt deduplicated from the
    /// surviving triangles.
    pub fn prune_verts_not_in_tris(&mut self) {
        let mut used = vec![false; self.positions.len()];
        for (_, tri) in self.live_triangles() {
            for v in tri {
                used[v as usize] = true;
            }
        }

        let mut remap = vec![u32::MAX; self.positions.len()];
        let mut next = 0u32;
        for (i, &in_use) in used.iter().enumerate() {
            if in_use {
                remap[i] = next;
                next += 1;
            }
        }
        let new_len = next as usize;

        compact_attribute(&mut self.positions, &remap, new_len);
        compact_attribute(&mut self.normals, &remap, new_len);
        compact_attribute(&mut self.colors, &remap, new_len);
        compact_attribute(&mut self.base_uvs, &remap, new_len);
        compact_attribute(&mut self.tangents, &remap, new_len);
        compact_attribute(&mut self.binormals, &remap, new_len);

        let mut new_triangles = Vec::with_capacity(self.triangles.len());
        let mut new_edges: Vec<[u32; 2]> = Vec::new();
        let mut seen = HashSet::new();
        for slot in &self.triangles {
            let Some(tri) = slot else { continue };
            let tri = [
                remap[tri[0] as usize],
                remap[tri[1] as usize],
                remap[tri[2] as usize],
            ];
            debug_assert!(tri.iter().all(|&v| v != u32::MAX));
            new_triangles.push(Some(tri));

            for edge in [[tri[0], tri[1]], [tri[1], tri[2]], [tri[2], tri[0]]] {
                let key = (edge[0].min(edge[1]), edge[0].max(edge[1]));
                if seen.insert(key) {
                    new_edges.push(edge);
                }
            }
        }
        self.triangles = new_triangles;
        self.wireframe_edges = new_edges;
    }

    /// Merges near-duplicate vertices closer than `threshold`.
    ///
    /// Candidate lookup goes through an integer key band around
    /// `(x + y + z) * 100`, so duplicates straddling a key boundary can be
    /// missed and the first candidate within threshold wins; this is a known
    /// approximation, kept because downstream content depends on its exact
    /// behavior.
    pub fn weld_mesh_verts(&mut self, threshold: f32) {
        let threshold_sqr = threshold * threshold;

        let mut new_positions: Vec<Vec3> = Vec::with_capacity(self.positions.len());
        let mut lookup: BTreeMap<i32, Vec<u32>> = BTreeMap::new();
        let mut old_to_new: Vec<u32> = Vec::with_capacity(self.positions.len());

        for &position in &self.positions {
            let fkey = (position.x + position.y + position.z) * 100.0;
            let min_key = (fkey - 0.1) as i32;
            let max_key = (fkey + 0.1) as i32;

            let mut matched = None;
            'candidates: for candidates in lookup.range(min_key..=max_key).map(|(_, c)| c) {
                for &candidate in candidates {
                    let delta = new_positions[candidate as usize] - position;
                    if delta.length_squared() < threshold_sqr {
                        matched = Some(candidate);
                        break 'candidates;
                    }
                }
            }

            match matched {
                Some(index) => old_to_new.push(index),
                None => {
                    let index = new_positions.len() as u32;
                    lookup.entry(fkey as i32).or_default().push(index);
                    old_to_new.push(index);
                    new_positions.push(position);
                }
            }
        }

        let new_len = new_positions.len();
        compact_attribute(&mut self.normals, &old_to_new, new_len);
        compact_attribute(&mut self.colors, &old_to_new, new_len);
        compact_attribute(&mut self.base_uvs, &old_to_new, new_len);
        compact_attribute(&mut self.tangents, &old_to_new, new_len);
        compact_attribute(&mut self.binormals, &old_to_new, new_len);
        self.positions = new_positions;

        for slot in &mut self.triangles {
            if let Some(tri) = slot {
                for v in tri {
                    *v = old_to_new[*v as usize];
                }
            }
        }
        for edge in &mut self.wireframe_edges {
            for v in edge {
                *v = old_to_new[*v as usize];
            }
        }
    }

    /// Collapses `vertex` onto its nearest neighbor.
    ///
    /// Triangles referencing both endpoints degenerate and are deleted;
    /// triangles referencing only `vertex` are rewritten to the neighbor.
    /// No-op when no other vertex exists within range.
    pub fn merge_vert_to_closest(&mut self, vertex: u32) {
        let mut closest = None;
        let mut min_dist_sqr = 10000.0f32;
        let input_position = self.positions[vertex as usize];
        for (i, &position) in self.positions.iter().enumerate() {
            if i as u32 == vertex {
                continue;
            }
            let dist_sqr = (position - input_position).length_squared();
            if dist_sqr < min_dist_sqr {
                min_dist_sqr = dist_sqr;
                closest = Some(i as u32);
            }
        }
        let Some(closest) = closest else {
            return;
        };

        let mut to_delete = Vec::new();
        for (index, slot) in self.triangles.iter_mut().enumerate() {
            let Some(tri) = slot else { continue };
            let input_corner = tri.iter().position(|&v| v == vertex);
            let has_closest = tri.contains(&closest);
            match (input_corner, has_closest) {
                (Some(_), true) => to_delete.push(index as u32),
                (Some(corner), false) => tri[corner] = closest,
                _ => {}
            }
        }
        self.delete_triangles(&to_delete);
    }

    /// Deletes zero-area and non-finite triangles.
    pub fn prune_invalid_tris(&mut self) {
        const ZERO_AREA: f32 = 1.0e-6;

        let mut invalid = Vec::new();
        for (index, tri) in self.live_triangles() {
            let v0 = self.positions[tri[0] as usize];
            let v1 = self.positions[tri[1] as usize];
            let v2 = self.positions[tri[2] as usize];
            let area = (v2 - v0).cross(v1 - v0).length() / 2.0;
            if area < ZERO_AREA || !v0.is_finite() || !v1.is_finite() || !v2.is_finite() {
                invalid.push(index as u32);
            }
        }
        self.delete_triangles(&invalid);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_mesh() -> Mesh {
        // Two triangles sharing edge 1-2, plus an unused vertex 4.
        let mut mesh = Mesh::from_triangles(
            "strip",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.5, 0.0, 1.0),
                Vec3::new(1.5, 0.0, 1.0),
                Vec3::new(9.0, 9.0, 9.0),
            ],
            vec![],
        );
        mesh.add_triangle(0, 1, 2);
        mesh.add_triangle(1, 2, 3);
        mesh
    }

    #[test]
    fn test_add_triangle_dedups_shared_edge() {
        let mesh = strip_mesh();

        // Edge 1-2 appears exactly once: 5 unique edges, not 6.
        assert_eq!(mesh.line_count(), 5);
        assert_eq!(
            mesh.wireframe_edges()
                .iter()
                .filter(|e| (e[0] == 1 && e[1] == 2) || (e[0] == 2 && e[1] == 1))
                .count(),
            1
        );
    }

    #[test]
    fn test_get_edge_id_ignores_orientation() {
        let mesh = strip_mesh();
        assert_eq!(mesh.get_edge_id_for_verts(1, 0), Some(0));
        assert_eq!(mesh.get_edge_id_for_verts(0, 3), None);
    }

    #[test]
    fn test_delete_triangles_prunes_orphaned_verts() {
        let mut mesh = strip_mesh();
        mesh.delete_triangles(&[1]);

        // Vertex 3 lost its only triangle; vertex 4 was never referenced.
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.live_triangle_count(), 1);
        assert_eq!(mesh.triangle(0), Some([0, 1, 2]));
        assert_eq!(mesh.line_count(), 3);
    }

    #[test]
    fn test_prune_compaction_is_stable_and_in_range() {
        let mut mesh = strip_mesh();
        mesh.mark_triangles_deleted(&[0]);

        let referenced: std::collections::HashSet<u32> =
            mesh.live_triangles().flat_map(|(_, t)| t).collect();
        mesh.prune_verts_not_in_tris();

        assert_eq!(mesh.vertex_count(), referenced.len());
        for (_, tri) in mesh.live_triangles() {
            for v in tri {
                assert!((v as usize) < mesh.vertex_count());
            }
        }
        // Stable order: old vertices 1, 2, 3 compact to 0, 1, 2.
        assert_eq!(mesh.triangle(0), Some([0, 1, 2]));
        assert_eq!(mesh.positions()[0], Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn test_delete_vertices_removes_incident_triangles() {
        let mut mesh = strip_mesh();
        mesh.delete_vertices(&[3]);

        assert_eq!(mesh.live_triangle_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_delete_edges_removes_triangles_on_edge() {
        let mut mesh = strip_mesh();
        let shared = mesh.get_edge_id_for_verts(1, 2).unwrap();
        mesh.delete_edges(&[shared]);

        // Both triangles use edge 1-2.
        assert_eq!(mesh.live_triangle_count(), 0);
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_prune_carries_vertex_attributes() {
        let mut mesh = strip_mesh();
        mesh.set_normals(vec![Vec3::X, Vec3::Y, Vec3::Z, Vec3::ONE, Vec3::NEG_ONE]);
        mesh.delete_triangles(&[0]);

        // Survivors are old vertices 1, 2, 3.
        assert_eq!(mesh.normals(), &[Vec3::Y, Vec3::Z, Vec3::ONE]);
    }

    #[test]
    fn test_weld_merges_near_duplicates() {
        let mut mesh = Mesh::from_triangles(
            "weld",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.5, 0.0, 1.0),
                Vec3::new(1.0000001, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 1.0),
            ],
            vec![[0, 1, 2], [3, 4, 2]],
        );
        mesh.weld_mesh_verts(0.001);

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle(1), Some([1, 3, 2]));
    }

    #[test]
    fn test_weld_is_idempotent() {
        let mut mesh = strip_mesh();
        mesh.weld_mesh_verts(0.01);
        let positions = mesh.positions().to_vec();
        let triangles = mesh.triangles().to_vec();

        mesh.weld_mesh_verts(0.01);
        assert_eq!(mesh.positions(), positions.as_slice());
        assert_eq!(mesh.triangles(), triangles.as_slice());
    }

    #[test]
    fn test_weld_preserves_distinct_verts() {
        let mut mesh = strip_mesh();
        let before = mesh.vertex_count();
        mesh.weld_mesh_verts(0.001);
        assert_eq!(mesh.vertex_count(), before);
    }

    #[test]
    fn test_merge_vert_to_closest() {
        let mut mesh = strip_mesh();
        // Vertex 3's nearest neighbor is vertex 2; their shared triangle
        // degenerates and is deleted.
        mesh.merge_vert_to_closest(3);

        assert_eq!(mesh.live_triangle_count(), 1);
        assert_eq!(mesh.triangle(0), Some([0, 1, 2]));
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_merge_vert_rewrites_references() {
        let mut mesh = Mesh::from_triangles(
            "rewrite",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.5, 0.0, 1.0),
                Vec3::new(0.5, 0.0, 1.1),
            ],
            vec![[0, 1, 3]],
        );
        // Vertex 3 collapses onto vertex 2, which shares no triangle with
        // it, so the triangle is rewritten rather than deleted.
        mesh.merge_vert_to_closest(3);

        assert_eq!(mesh.live_triangle_count(), 1);
        assert_eq!(mesh.triangle(0), Some([0, 1, 2]));
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_merge_vert_deletes_triangles_with_both() {
        let mut mesh = Mesh::from_triangles(
            "pair",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.001, 0.0, 0.0),
                Vec3::new(0.5, 0.0, 1.0),
            ],
            vec![[0, 1, 2]],
        );
        mesh.merge_vert_to_closest(0);

        // The only triangle contained both endpoints of the merge.
        assert_eq!(mesh.live_triangle_count(), 0);
    }

    #[test]
    fn test_merge_vert_noop_on_single_vertex() {
        let mut mesh = Mesh::from_triangles("one", vec![Vec3::ZERO], vec![]);
        mesh.merge_vert_to_closest(0);
        assert_eq!(mesh.vertex_count(), 1);
    }

    #[test]
    fn test_prune_invalid_tris_drops_degenerate() {
        let mut mesh = Mesh::from_triangles(
            "degen",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.5, 0.0, 1.0),
            ],
            vec![[0, 1, 2], [0, 1, 3]],
        );
        mesh.prune_invalid_tris();

        // The collinear triangle goes; the real one stays.
        assert_eq!(mesh.live_triangle_count(), 1);
        assert_eq!(mesh.vertex_count(), 3);
    }

    #[test]
    fn test_delete_everything_leaves_empty_mesh() {
        let mut mesh = strip_mesh();
        mesh.delete_triangles(&[0, 1]);

        assert_eq!(mesh.vertex_count(), 0);
        assert_eq!(mesh.triangle_count(), 0);
        assert_eq!(mesh.line_count(), 0);
    }
}
