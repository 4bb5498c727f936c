//! Triangle-vs-convex-polygon clipping and cube hole punching.
//!
//! [`tri_minus_poly`] triangulates the set difference T - P of a triangle
//! and a convex polygon in the XZ plane. [`Mesh::punch_cube_hole`] uses it
//! to cut a unit-cube-shaped hole out of a mesh: every triangle touching the
//! cube (in its local space) is clipped against the cube's XZ square, the
//! clip output replaces it, and near-duplicate seam vertices are welded.

use glam::{Mat4, Vec3};

use super::Mesh;

/// 2D cross product of the XZ components.
fn cross_xz(v1: Vec3, v2: Vec3) -> f32 {
    v2.x * v1.z - v1.x * v2.z
}

/// Winding of three points in the XZ plane: 1 anticlockwise, -1 clockwise.
fn sense_of_triangle(v0: Vec3, v1: Vec3, v2: Vec3) -> i32 {
    if cross_xz(v1 - v0, v2 - v1) >= 0.0 {
        1
    } else {
        -1
    }
}

/// Triangulates `tri` minus the convex polygon `poly`, both in the XZ plane.
///
/// Both inputs must be anticlockwise in XZ (the hole-punch path guarantees
/// this by flipping triangles whose plane normal points down). Four stages:
/// poly edges are clipped to each triangle halfspace in turn, each surviving
/// edge is completed into a triangle with the triangle vertex furthest
/// outside it, then gaps between neighboring clip triangles are filled and
/// any "loose" triangle vertex (a corner not consumed by clipping) is
/// attached to its neighbors, with sense-of-winding tests preventing
/// inverted output. Returns no triangles when `tri` lies entirely inside
/// `poly`; a triangle entirely outside must be filtered by the caller (its
/// poly edges all clip away, which reads the same as "swallowed").
///
/// Vertex provenance is tracked by exact coordinate equality, so the gap
/// logic only pairs points that came from the same clip computation.
#[allow(clippy::float_cmp)]
#[must_use]
pub fn tri_minus_poly(tri: &[Vec3; 3], poly: &[Vec3]) -> Vec<[Vec3; 3]> {
    let clip_sense = sense_of_triangle(poly[0], poly[1], poly[2]) as f32;
    let fill_sense = sense_of_triangle(tri[0], tri[1], tri[2]);

    // Stage 1: the unclipped poly edge set.
    let mut edges: Vec<(Vec3, Vec3)> = Vec::with_capacity(poly.len());
    let mut prev = poly[poly.len() - 1];
    for &point in poly {
        edges.push((prev, point));
        prev = point;
    }

    // Stage 2: clip the edge set to each triangle halfspace in turn.
    let mut t1 = tri[2];
    for i in 0..3 {
        let t0 = t1;
        t1 = tri[i];
        let dvt = t1 - t0;

        let mut clipped = Vec::with_capacity(edges.len() + 1);
        for &(p0, p1) in &edges {
            let c0 = cross_xz(dvt, p0 - t0) * clip_sense;
            let c1 = cross_xz(dvt, p1 - t0) * clip_sense;

            // Drop edges entirely on the outside.
            if c0 <= 0.0 && c1 <= 0.0 {
                continue;
            }

            if c0 >= 0.0 && c1 >= 0.0 {
                clipped.push((p0, p1));
            } else {
                let intersection = p0.lerp(p1, c0 / (c0 - c1));
                if c0 >= 0.0 {
                    clipped.push((p0, intersection));
                } else {
                    clipped.push((intersection, p1));
                }
            }
        }

        edges = clipped;
        if edges.is_empty() {
            return Vec::new();
        }
    }

    // Stage 3: complete each surviving edge into a triangle using the
    // triangle vertex furthest outside it; track which vertices were
    // consumed and which sit outside some clipped edge.
    let mut tris: Vec<[Vec3; 3]> = Vec::with_capacity(edges.len() * 2);
    let mut tri_verts_out = 0u32;
    let mut tri_verts_used = 0u32;
    for &(p0, p1) in &edges {
        let dvp = p1 - p0;
        let c = [
            cross_xz(dvp, tri[0] - p0),
            cross_xz(dvp, tri[1] - p0),
            cross_xz(dvp, tri[2] - p0),
        ];

        let tri_vert = if c[0] < c[1] {
            if c[0] < c[2] {
                0
            } else {
                2
            }
        } else if c[1] < c[2] {
            1
        } else {
            2
        };

        tris.push([p0, p1, tri[tri_vert]]);
        tri_verts_used |= 1u32 << tri_vert;
        tri_verts_out |= u32::from(c[0] < 0.0);
        tri_verts_out |= u32::from(c[1] < 0.0) << 1;
        tri_verts_out |= u32::from(c[2] < 0.0) << 2;
    }

    // Stage 4: a triangle corner flagged outside but never consumed is loose.
    let loose_flags = tri_verts_out & !tri_verts_used;
    let loose_vert = (0..3usize).find(|&i| loose_flags & (1u32 << i) != 0);

    // Stage 5: walk neighboring clip triangles and fill the gaps the clip
    // boundary opened; attach the loose vertex where the winding says a
    // plain gap triangle would come out inverted.
    let base_count = tris.len();
    let mut result = tris.clone();
    let mut prev = tris[base_count - 1];
    for &current in &tris {
        let [v0, v1, v2] = current;
        let [p0, p1, p2] = prev;

        if p1.x == v0.x && p1.z == v0.z {
            if p2.x != v2.x || p2.z != v2.z {
                if sense_of_triangle(v0, v2, p2) != fill_sense {
                    result.push([v0, v2, p2]);
                } else if let Some(loose) = loose_vert.map(|i| tri[i]) {
                    result.push([p2, v0, loose]);
                    result.push([v0, v2, loose]);
                }
            }
        } else if let Some(loose) = loose_vert.map(|i| tri[i]) {
            if sense_of_triangle(loose, p0, p1) != fill_sense
                && sense_of_triangle(loose, p2, p1) != fill_sense
            {
                result.push([p2, p1, loose]);
            }
            if sense_of_triangle(loose, v0, v1) != fill_sense
                && sense_of_triangle(loose, v0, v2) != fill_sense
            {
                result.push([v0, v2, loose]);
            }
        }

        prev = current;
    }

    result
}

/// Separating-axis test between a triangle and the unit box `[-1, 1]^3`.
fn tri_intersects_unit_box(v: &[Vec3; 3]) -> bool {
    let half = Vec3::ONE;

    // Box-axis tests: the triangle's bounds against the box.
    let min = v[0].min(v[1]).min(v[2]);
    let max = v[0].max(v[1]).max(v[2]);
    if min.x > half.x || max.x < -half.x {
        return false;
    }
    if min.y > half.y || max.y < -half.y {
        return false;
    }
    if min.z > half.z || max.z < -half.z {
        return false;
    }

    // Triangle-plane test.
    let normal = (v[1] - v[0]).cross(v[2] - v[0]);
    let d = normal.dot(v[0]);
    if d.abs() > half.dot(normal.abs()) {
        return false;
    }

    // Cross-axis tests: box axes against triangle edges.
    let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];
    let axes = [Vec3::X, Vec3::Y, Vec3::Z];
    for edge in &edges {
        for axis in &axes {
            let a = axis.cross(*edge);
            let r = half.dot(a.abs());
            let p = [a.dot(v[0]), a.dot(v[1]), a.dot(v[2])];
            let p_min = p[0].min(p[1]).min(p[2]);
            let p_max = p[0].max(p[1]).max(p[2]);
            if p_min > r || p_max < -r {
                return false;
            }
        }
    }

    true
}

/// The cube's XZ cross-section, anticlockwise.
const CUBE_SQUARE: [Vec3; 4] = [
    Vec3::new(1.0, 0.0, 1.0),
    Vec3::new(1.0, 0.0, -1.0),
    Vec3::new(-1.0, 0.0, -1.0),
    Vec3::new(-1.0, 0.0, 1.0),
];

impl Mesh {
    /// Cuts a hole shaped like the unit cube under `mat` out of the mesh.
    ///
    /// `mat` places the unit cube in the mesh's space and `inv_mat` is its
    /// inverse. Triangles intersecting the cube are clipped against its XZ
    /// square in cube-local space (heights re-derived from each triangle's
    /// plane), replaced by their clip output, and the seams welded at
    /// `weld_threshold`. Triangles not touching the cube are left
    /// byte-identical. Near-vertical triangles (plane normal in the XZ
    /// plane) cannot be clipped as XZ polygons and are skipped.
    pub fn punch_cube_hole(&mut self, mat: &Mat4, inv_mat: &Mat4, weld_threshold: f32) {
        const VERTICAL_EPSILON: f32 = 1.0e-6;

        let mut new_tri_verts: Vec<Vec3> = Vec::new();
        let mut to_delete: Vec<u32> = Vec::new();

        for (index, tri) in self.live_triangles() {
            let mut v = [
                inv_mat.transform_point3(self.positions[tri[0] as usize]),
                inv_mat.transform_point3(self.positions[tri[1] as usize]),
                inv_mat.transform_point3(self.positions[tri[2] as usize]),
            ];

            let mut normal = (v[1] - v[0]).cross(v[2] - v[0]).normalize_or_zero();
            if normal.y < 0.0 {
                v.swap(1, 2);
                normal = -normal;
            }
            let plane_w = normal.dot(v[0]);

            if !tri_intersects_unit_box(&v) {
                continue;
            }
            if normal.y.abs() < VERTICAL_EPSILON {
                continue;
            }

            for vert in &mut v {
                vert.y = 0.0;
            }
            to_delete.push(index as u32);

            for clipped in tri_minus_poly(&v, &CUBE_SQUARE) {
                for mut point in clipped {
                    // Lift the flattened point back onto the triangle plane,
                    // then out of cube-local space.
                    point.y = (plane_w - point.dot(normal)) / normal.y;
                    new_tri_verts.push(mat.transform_point3(point));
                }
            }
        }

        if !to_delete.is_empty() {
            let base = self.positions.len() as u32;
            self.positions.extend(new_tri_verts.iter().copied());
            for start in (0..new_tri_verts.len() as u32).step_by(3) {
                self.add_triangle(base + start, base + start + 1, base + start + 2);
            }
            self.delete_triangles(&to_delete);
            self.weld_mesh_verts(weld_threshold);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn area_xz(tris: &[[Vec3; 3]]) -> f32 {
        tris.iter()
            .map(|t| {
                let a = t[1] - t[0];
                let b = t[2] - t[0];
                (a.x * b.z - a.z * b.x).abs() * 0.5
            })
            .sum()
    }

    fn unit_square() -> Vec<Vec3> {
        CUBE_SQUARE.to_vec()
    }

    #[test]
    fn test_tri_minus_poly_corner_overlap() {
        // Anticlockwise triangle with one corner inside the square.
        let tri = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 4.0),
            Vec3::new(4.0, 0.0, 0.0),
        ];
        let out = tri_minus_poly(&tri, &unit_square());

        // Triangle area 8, overlap with the square is the unit cell [0,1]^2.
        assert_eq!(out.len(), 3);
        assert!((area_xz(&out) - 7.0).abs() < 1e-4);
    }

    #[test]
    fn test_tri_minus_poly_hole_strictly_inside() {
        // The square sits strictly inside: output is an annulus triangulated
        // with gap fills and the loose corner reattached.
        let tri = [
            Vec3::new(-4.0, 0.0, -4.0),
            Vec3::new(-4.0, 0.0, 8.0),
            Vec3::new(8.0, 0.0, -4.0),
        ];
        let out = tri_minus_poly(&tri, &unit_square());

        assert_eq!(out.len(), 7);
        assert!((area_xz(&out) - 68.0).abs() < 1e-3);
    }

    #[test]
    fn test_tri_minus_poly_triangle_swallowed() {
        // Triangle entirely inside the poly: nothing remains.
        let tri = [
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(-0.5, 0.0, 0.5),
            Vec3::new(0.5, 0.0, -0.5),
        ];
        assert!(tri_minus_poly(&tri, &unit_square()).is_empty());
    }

    #[test]
    fn test_tri_box_intersection() {
        let inside = [
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, -0.5),
            Vec3::new(0.0, 0.0, 0.5),
        ];
        assert!(tri_intersects_unit_box(&inside));

        let outside = [
            Vec3::new(5.0, 0.0, 5.0),
            Vec3::new(6.0, 0.0, 5.0),
            Vec3::new(5.0, 0.0, 6.0),
        ];
        assert!(!tri_intersects_unit_box(&outside));

        // Large triangle spanning the box without any vertex inside.
        let spanning = [
            Vec3::new(-10.0, 0.0, -10.0),
            Vec3::new(10.0, 0.0, -10.0),
            Vec3::new(0.0, 0.0, 10.0),
        ];
        assert!(tri_intersects_unit_box(&spanning));

        // Same triangle lifted above the box.
        let above = [
            Vec3::new(-10.0, 3.0, -10.0),
            Vec3::new(10.0, 3.0, -10.0),
            Vec3::new(0.0, 3.0, 10.0),
        ];
        assert!(!tri_intersects_unit_box(&above));
    }

    fn ground_quad(half: f32) -> Mesh {
        Mesh::from_triangles(
            "ground",
            vec![
                Vec3::new(-half, 0.0, -half),
                Vec3::new(half, 0.0, -half),
                Vec3::new(half, 0.0, half),
                Vec3::new(-half, 0.0, half),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_punch_outside_cube_is_identity() {
        let mut mesh = ground_quad(5.0);
        let mat = Mat4::from_translation(Vec3::new(100.0, 0.0, 0.0));
        let before_positions = mesh.positions().to_vec();
        let before_triangles = mesh.triangles().to_vec();

        mesh.punch_cube_hole(&mat, &mat.inverse(), 0.001);

        assert_eq!(mesh.positions(), before_positions.as_slice());
        assert_eq!(mesh.triangles(), before_triangles.as_slice());
    }

    #[test]
    fn test_punch_conserves_area_outside_hole() {
        // The cube sits strictly inside one triangle of the ground quad, so
        // the clip runs the annulus path and covers everything but the hole.
        let mut mesh = ground_quad(5.0);
        let mat = Mat4::from_translation(Vec3::new(2.5, 0.0, -2.5));
        mesh.punch_cube_hole(&mat, &mat.inverse(), 0.001);

        // 10x10 quad minus the 2x2 hole.
        assert!((mesh.surface_area(None) - 96.0).abs() < 0.1);

        // Nothing remains near the hole center.
        assert_eq!(mesh.get_closest_tri(Vec3::new(2.5, 0.0, -2.5), 0.5), None);
        // The surrounding geometry is intact.
        assert!(mesh.get_closest_tri(Vec3::new(-3.0, 0.0, 3.0), 0.5).is_some());
    }

    #[test]
    fn test_punch_swallows_mesh_inside_cube() {
        let mut mesh = ground_quad(0.5);
        mesh.punch_cube_hole(&Mat4::IDENTITY, &Mat4::IDENTITY, 0.001);

        assert_eq!(mesh.live_triangle_count(), 0);
        assert_eq!(mesh.vertex_count(), 0);
    }

    #[test]
    fn test_punch_restores_height_from_plane() {
        // A sloped strip: y = x everywhere. The clip flattens to the XZ
        // plane, so restored hole-edge verts must land back on y = x.
        let mut mesh = Mesh::from_triangles(
            "slope",
            vec![
                Vec3::new(-5.0, -5.0, -5.0),
                Vec3::new(5.0, 5.0, -5.0),
                Vec3::new(5.0, 5.0, 5.0),
            ],
            vec![[0, 1, 2]],
        );
        mesh.punch_cube_hole(&Mat4::IDENTITY, &Mat4::IDENTITY, 0.001);

        assert!(mesh.vertex_count() > 3);
        for &p in mesh.positions() {
            assert!(
                (p.y - p.x).abs() < 1e-3,
                "vertex {p:?} fell off the y = x plane"
            );
        }
    }
}
