//! Mesh spatial queries.
//!
//! All queries are brute-force scans over the vertex, edge, or triangle
//! arrays; a miss is `None`, never an error. Degenerate primitives are
//! skipped element by element so one bad triangle never fails a batch.

use std::collections::BTreeSet;

use glam::{Mat4, Vec2, Vec3, Vec4Swizzles};

use super::Mesh;

/// Degenerate-triangle guard: squared plane-normal length below this aborts
/// the per-triangle test.
const DEGENERATE_NORMAL_SQR: f32 = 1.0e-7;

/// An undirected triangle edge, endpoints stored sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MeshEdge {
    /// The two vertex indices, lower first.
    pub verts: [u32; 2],
}

impl MeshEdge {
    /// Creates an edge regardless of endpoint order.
    #[must_use]
    pub fn new(a: u32, b: u32) -> Self {
        Self {
            verts: [a.min(b), a.max(b)],
        }
    }
}

/// Given a point `dpp` in the plane of a triangle (everything relative to
/// vertex 0), clamps it into the triangle edge by edge.
///
/// Returns `(true, dpp)` for an interior point, `(false, snapped)` with the
/// nearest point on the boundary otherwise.
fn nearest_point_in_tri(dv1: Vec3, dv2: Vec3, normal: Vec3, dpp: Vec3) -> (bool, Vec3) {
    let snap_a;
    let snap_b;

    // Check against edge (v0 -> v1).
    if dpp.cross(dv1).dot(normal) < 0.0 {
        snap_a = Vec3::ZERO;
        snap_b = dv1;
    } else if dv2.cross(dpp).dot(normal) < 0.0 {
        // Edge (v0 -> v2).
        snap_a = dv2;
        snap_b = Vec3::ZERO;
    } else {
        // Edge (v1 -> v2).
        let ev2 = dv2 - dv1;
        let epp = dpp - dv1;
        if epp.cross(ev2).dot(normal) < 0.0 {
            snap_a = dv1;
            snap_b = dv2;
        } else {
            return (true, dpp);
        }
    }

    // Snap to the nearest point on the offending edge.
    let lvb = snap_b - snap_a;
    let t = ((dpp - snap_a).dot(lvb) / lvb.dot(lvb)).clamp(0.0, 1.0);
    (false, snap_a + lvb * t)
}

/// Closest points between two segments, with the parametric positions along
/// each.
pub(crate) fn closest_points_on_segments(
    a_start: Vec3,
    a_end: Vec3,
    b_start: Vec3,
    b_end: Vec3,
) -> (Vec3, Vec3, f32, f32) {
    let l0 = a_end - a_start;
    let l1 = b_end - b_start;
    let ds = b_start - a_start;

    let c = l0.cross(l1);
    let c0 = ds.cross(l1);
    let c1 = ds.cross(l0);

    let t0 = (c0.dot(c) / c.dot(c)).clamp(0.0, 1.0);
    let t1 = (c1.dot(c) / c.dot(c)).clamp(0.0, 1.0);

    let d0 = t1 * l0.dot(l1) + ds.dot(l0);
    let d1 = t0 * l0.dot(l1) - ds.dot(l1);

    let a_t = (d0 / l0.dot(l0)).clamp(0.0, 1.0);
    let b_t = (d1 / l1.dot(l1)).clamp(0.0, 1.0);

    (a_start + l0 * a_t, b_start + l1 * b_t, a_t, b_t)
}

impl Mesh {
    /// Finds the triangle nearest a sphere at `center` with `radius`.
    ///
    /// Brute force over all live triangles: project the center onto each
    /// triangle's plane, early-reject beyond `radius`, clamp into the
    /// triangle, keep the nearest. Returns the triangle slot index, or
    /// `None` when nothing lies within `radius`.
    #[must_use]
    pub fn get_closest_tri(&self, center: Vec3, radius: f32) -> Option<u32> {
        let mut result = None;
        let mut best_dist_sqr = radius * radius;

        for (index, tri) in self.live_triangles() {
            let v0 = self.positions[tri[0] as usize];
            let v1 = self.positions[tri[1] as usize];
            let v2 = self.positions[tri[2] as usize];

            let dv1 = v1 - v0;
            let dv2 = v2 - v0;
            let dp = center - v0;
            let normal = dv2.cross(dv1);

            let dotd = normal.length_squared();
            if dotd < DEGENERATE_NORMAL_SQR {
                continue;
            }

            let t = dp.dot(normal) / dotd;
            let on_plane = dp - normal * t;

            // Reject when even the plane projection is beyond the radius.
            let plane_dist_sqr = dotd * t * t;
            if best_dist_sqr < plane_dist_sqr {
                continue;
            }

            let (_, clamped) = nearest_point_in_tri(dv1, dv2, normal, on_plane);
            let dist_sqr = (clamped - dp).length_squared();
            if dist_sqr < best_dist_sqr {
                best_dist_sqr = dist_sqr;
                result = Some(index as u32);
            }
        }
        result
    }

    /// Finds the first triangle hit by a sphere swept along `direction`.
    ///
    /// The sweep is parametrized over `direction * max_len`; the triangle
    /// with the smallest hit parameter whose plane intersection lands inside
    /// it wins. Returns the triangle slot index.
    #[must_use]
    pub fn get_closest_tri_swept(
        &self,
        start: Vec3,
        _radius: f32,
        direction: Vec3,
        max_len: f32,
    ) -> Option<u32> {
        let mut result = None;
        let mut min_dist = max_len;

        for (index, tri) in self.live_triangles() {
            let v0 = self.positions[tri[0] as usize];
            let v1 = self.positions[tri[1] as usize];
            let v2 = self.positions[tri[2] as usize];

            let plane_normal = (v2 - v0).cross(v1 - v0).normalize_or_zero();
            let facing = direction.dot(plane_normal);
            if facing.abs() < 1.0e-4 {
                continue;
            }

            let plane_d = plane_normal.dot(v0);
            let t = (plane_d - start.dot(plane_normal)) / facing;
            let on_plane = start + direction * t;

            let verts = [v0, v1, v2];
            let outside = (0..3).any(|j| {
                let to_point = on_plane - verts[j];
                let edge = verts[(j + 1) % 3] - verts[j];
                to_point.cross(edge).dot(plane_normal) < 0.0
            });

            if !outside && t < min_dist {
                min_dist = t;
                result = Some(index as u32);
            }
        }
        result
    }

    /// Finds the first vertex inside a sphere swept along `direction`.
    ///
    /// "First" is by distance along the sweep axis, not by proximity to it.
    #[must_use]
    pub fn get_closest_vert_swept(
        &self,
        start: Vec3,
        radius: f32,
        direction: Vec3,
        max_len: f32,
    ) -> Option<u32> {
        let mut result = None;
        let mut min_dist = max_len + 2.0 * radius;
        let radius_sqr = radius * radius;

        for (i, &position) in self.positions.iter().enumerate() {
            let to_point = position - start;
            let along = to_point.dot(direction).clamp(0.0, max_len);
            let closest_on_axis = direction * along;
            let dist_sqr = (closest_on_axis - to_point).length_squared();
            if dist_sqr < radius_sqr && along < min_dist {
                min_dist = along;
                result = Some(i as u32);
            }
        }
        result
    }

    /// Finds the front-most vertex within a screen-space threshold of a
    /// projected point.
    ///
    /// Vertices are taken through `view_proj` and the perspective divide;
    /// anything behind the camera or outside clip bounds is skipped.
    #[must_use]
    pub fn get_closest_vert_projected(
        &self,
        view_proj: &Mat4,
        threshold_sqr: f32,
        point: Vec2,
    ) -> Option<u32> {
        let mut result = None;
        let mut min_z = 1.0f32;

        for (i, &position) in self.positions.iter().enumerate() {
            let clip = *view_proj * position.extend(1.0);
            let ndc = clip / clip.w;

            if ndc.z < 0.0
                || ndc.z > min_z
                || !(-1.0..=1.0).contains(&ndc.x)
                || !(-1.0..=1.0).contains(&ndc.y)
            {
                continue;
            }

            if (ndc.xy() - point).length_squared() < threshold_sqr {
                min_z = ndc.z;
                result = Some(i as u32);
            }
        }
        result
    }

    /// Finds the first wireframe edge touched by a sphere swept along
    /// `direction`.
    #[must_use]
    pub fn get_closest_edge_swept(
        &self,
        start: Vec3,
        radius: f32,
        direction: Vec3,
        max_len: f32,
    ) -> Option<u32> {
        let mut result = None;
        let mut min_dist = max_len;
        let radius_sqr = radius * radius;
        let sweep_end = start + direction * max_len;

        for (edge_id, edge) in self.wireframe_edges.iter().enumerate() {
            let a = self.positions[edge[0] as usize];
            let b = self.positions[edge[1] as usize];

            let (on_sweep, on_edge, sweep_t, _) =
                closest_points_on_segments(start, sweep_end, a, b);
            if (on_edge - on_sweep).length_squared() < radius_sqr {
                let d = sweep_t * max_len;
                if d < min_dist {
                    min_dist = d;
                    result = Some(edge_id as u32);
                }
            }
        }
        result
    }

    /// Collects the unique undirected edges of all live triangles.
    #[must_use]
    pub fn get_edges(&self) -> BTreeSet<MeshEdge> {
        let mut edges = BTreeSet::new();
        for (_, tri) in self.live_triangles() {
            edges.insert(MeshEdge::new(tri[0], tri[1]));
            edges.insert(MeshEdge::new(tri[1], tri[2]));
            edges.insert(MeshEdge::new(tri[2], tri[0]));
        }
        edges
    }

    /// Vertices per unit of edge length, a tessellation-density heuristic.
    #[must_use]
    pub fn vert_density(&self) -> f32 {
        let edges = self.get_edges();
        let mut edge_length = 0.0f32;
        for edge in &edges {
            edge_length += (self.positions[edge.verts[0] as usize]
                - self.positions[edge.verts[1] as usize])
                .length();
        }
        if edge_length <= 0.0 {
            return 0.0;
        }
        (edges.len() as f32 * 2.0) / edge_length
    }

    /// Total triangle area, optionally under a component-wise scale.
    ///
    /// Per-triangle NaN contributions (degenerate data) are dropped rather
    /// than propagated into the sum.
    #[must_use]
    pub fn surface_area(&self, scale: Option<Vec3>) -> f32 {
        let mut area = 0.0f32;
        for (_, tri) in self.live_triangles() {
            let mut v0 = self.positions[tri[0] as usize];
            let mut v1 = self.positions[tri[1] as usize];
            let mut v2 = self.positions[tri[2] as usize];
            if let Some(scale) = scale {
                v0 *= scale;
                v1 *= scale;
                v2 *= scale;
            }

            let edge1 = v1 - v0;
            let edge3 = v2 - v0;
            let dot = edge1.dot(edge3);
            let tri_area =
                (edge1.length_squared() * edge3.length_squared() - dot * dot).sqrt() * 0.5;
            if !tri_area.is_nan() {
                area += tri_area;
            }
        }
        area
    }

    /// Total triangle area plus the normalized per-axis magnitude breakdown.
    #[must_use]
    pub fn surface_area_components(&self) -> (f32, Vec3) {
        let mut area = 0.0f32;
        let mut area_vec = Vec3::ZERO;

        for (_, tri) in self.live_triangles() {
            let v0 = self.positions[tri[0] as usize];
            let v1 = self.positions[tri[1] as usize];
            let v2 = self.positions[tri[2] as usize];

            let a = (v0 - v1).length();
            let b = (v1 - v2).length();
            let c = (v2 - v0).length();
            let p1 = (a + b + c) * 0.5;
            let tri_area = (p1 * (p1 - a) * (p1 - b) * (p1 - c)).sqrt();

            if !tri_area.is_nan() {
                let x_mag = v0.x.abs() + v1.x.abs() + v2.x.abs();
                let y_mag = v0.y.abs() + v1.y.abs() + v2.y.abs();
                let z_mag = v0.z.abs() + v1.z.abs() + v2.z.abs();
                let mag_sum = x_mag + y_mag + z_mag;
                if mag_sum > 0.0 {
                    area_vec += Vec3::new(x_mag, y_mag, z_mag) / mag_sum;
                }
                area += tri_area;
            }
        }
        (area, area_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_level_mesh() -> Mesh {
        // One triangle in the XZ plane at y=0, another at y=5.
        Mesh::from_triangles(
            "levels",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 2.0),
                Vec3::new(0.0, 5.0, 0.0),
                Vec3::new(2.0, 5.0, 0.0),
                Vec3::new(1.0, 5.0, 2.0),
            ],
            vec![[0, 1, 2], [3, 4, 5]],
        )
    }

    #[test]
    fn test_closest_tri_empty_mesh_misses() {
        let mesh = Mesh::new("empty");
        assert_eq!(mesh.get_closest_tri(Vec3::ZERO, 100.0), None);
    }

    #[test]
    fn test_closest_tri_picks_nearer_plane() {
        let mesh = two_level_mesh();

        let near_bottom = Vec3::new(1.0, 1.0, 0.5);
        assert_eq!(mesh.get_closest_tri(near_bottom, 10.0), Some(0));

        let near_top = Vec3::new(1.0, 4.0, 0.5);
        assert_eq!(mesh.get_closest_tri(near_top, 10.0), Some(1));
    }

    #[test]
    fn test_closest_tri_respects_radius() {
        let mesh = two_level_mesh();
        assert_eq!(mesh.get_closest_tri(Vec3::new(1.0, 2.0, 0.5), 0.5), None);
    }

    #[test]
    fn test_closest_tri_clamps_to_edge() {
        let mesh = two_level_mesh();
        // Off to the side of the bottom triangle: projection is exterior,
        // clamped distance still within radius.
        let beside = Vec3::new(-1.0, 0.0, 0.0);
        assert_eq!(mesh.get_closest_tri(beside, 1.5), Some(0));
    }

    #[test]
    fn test_closest_tri_skips_degenerate() {
        let mut mesh = Mesh::from_triangles(
            "degen",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(2.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        assert_eq!(mesh.get_closest_tri(Vec3::new(0.5, 0.1, 0.0), 5.0), None);

        // A real triangle alongside the degenerate one is still found.
        mesh.positions.push(Vec3::new(0.5, 0.0, 1.0));
        mesh.add_triangle(0, 1, 3);
        assert_eq!(mesh.get_closest_tri(Vec3::new(0.5, 0.1, 0.5), 5.0), Some(1));
    }

    #[test]
    fn test_closest_tri_swept_takes_first_hit() {
        let mesh = two_level_mesh();

        // Sweep downward from above both triangles over the shared column.
        let hit = mesh.get_closest_tri_swept(Vec3::new(1.0, 10.0, 0.5), 0.1, -Vec3::Y, 20.0);
        assert_eq!(hit, Some(1));
    }

    #[test]
    fn test_closest_tri_swept_misses_outside() {
        let mesh = two_level_mesh();
        let hit = mesh.get_closest_tri_swept(Vec3::new(10.0, 10.0, 10.0), 0.1, -Vec3::Y, 20.0);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_closest_vert_swept() {
        let mesh = two_level_mesh();

        // Sweep down the column over vertex 4 (2, 5, 0); vertex 1 (2, 0, 0)
        // is also inside the swept cylinder, but 4 comes first along the axis.
        let hit = mesh.get_closest_vert_swept(Vec3::new(2.0, 10.0, 0.0), 0.25, -Vec3::Y, 20.0);
        assert_eq!(hit, Some(4));
    }

    #[test]
    fn test_closest_vert_swept_miss() {
        let mesh = two_level_mesh();
        let hit = mesh.get_closest_vert_swept(Vec3::new(50.0, 0.0, 0.0), 0.25, -Vec3::Y, 20.0);
        assert_eq!(hit, None);
    }

    #[test]
    fn test_closest_edge_swept() {
        let mesh = two_level_mesh();

        // Sweep down onto the midpoint of the bottom triangle's edge 0-1.
        let hit = mesh.get_closest_edge_swept(Vec3::new(1.0, 10.0, 0.0), 0.1, -Vec3::Y, 20.0);
        let edge = mesh.get_edge_id_for_verts(3, 4).unwrap();
        assert_eq!(hit, Some(edge));
    }

    #[test]
    fn test_closest_vert_projected() {
        let mesh = two_level_mesh();

        // Orthographic-style projection down -Z over a wide box; vertex 2
        // (1, 0, 2) projects nearest the origin of the XY screen plane.
        let view_proj = Mat4::orthographic_rh(-4.0, 4.0, -4.0, 8.0, -10.0, 10.0);
        let target = (view_proj * Vec3::new(1.0, 0.0, 2.0).extend(1.0)).xy();

        let hit = mesh.get_closest_vert_projected(&view_proj, 0.01, Vec2::new(target.x, target.y));
        assert_eq!(hit, Some(2));
    }

    #[test]
    fn test_surface_area_unit_right_triangle() {
        let mesh = Mesh::from_triangles(
            "unit",
            vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            vec![[0, 1, 2]],
        );
        assert!((mesh.surface_area(None) - 0.5).abs() < 1e-6);

        // Doubling X stretches the area with it.
        let scaled = mesh.surface_area(Some(Vec3::new(2.0, 1.0, 1.0)));
        assert!((scaled - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_surface_area_skips_nan() {
        let mut mesh = Mesh::from_triangles(
            "nan",
            vec![Vec3::ZERO, Vec3::X, Vec3::Z, Vec3::new(f32::NAN, 0.0, 0.0)],
            vec![[0, 1, 2]],
        );
        mesh.add_triangle(3, 1, 2);

        assert!((mesh.surface_area(None) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_surface_area_components_flat_mesh() {
        let mesh = two_level_mesh();
        let (area, _) = mesh.surface_area_components();
        assert!((area - mesh.surface_area(None)).abs() < 1e-4);
    }

    #[test]
    fn test_get_edges_unique_and_sorted() {
        let mesh = Mesh::from_triangles(
            "quad",
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        );

        let edges = mesh.get_edges();
        assert_eq!(edges.len(), 5);
        assert!(edges.contains(&MeshEdge::new(2, 0)));
    }

    #[test]
    fn test_vert_density() {
        // A single unit right triangle: 3 edges, length 2 + sqrt(2).
        let mesh = Mesh::from_triangles(
            "unit",
            vec![Vec3::ZERO, Vec3::X, Vec3::Z],
            vec![[0, 1, 2]],
        );
        let expected = 6.0 / (2.0 + 2.0f32.sqrt());
        assert!((mesh.vert_density() - expected).abs() < 1e-5);

        assert_eq!(Mesh::new("empty").vert_density(), 0.0);
    }
}
