//! Tangent/binormal computation.
//!
//! Uses the UV-gradient method: the tangent is the surface direction of
//! increasing U at constant V, found by sorting a triangle's vertices by V
//! and interpolating the opposite edge to the middle vertex's V; the
//! binormal repeats the construction with the axes swapped. Both are
//! Gram-Schmidt-orthogonalized against the face normal.

use glam::{Vec2, Vec3};

use super::Mesh;

const LENGTH_SQR_TOLERANCE: f32 = 1.0e-30;
const UV_EPSILON: f32 = 1.0e-6;

/// Sorts the vertex/UV triple so `key(uv[0]) >= key(uv[1]) >= key(uv[2])`.
fn sort_descending(v: &mut [Vec3; 3], uv: &mut [Vec2; 3], key: impl Fn(Vec2) -> f32) {
    if key(uv[0]) < key(uv[1]) {
        v.swap(0, 1);
        uv.swap(0, 1);
    }
    if key(uv[0]) < key(uv[2]) {
        v.swap(0, 2);
        uv.swap(0, 2);
    }
    if key(uv[1]) < key(uv[2]) {
        v.swap(1, 2);
        uv.swap(1, 2);
    }
}

impl Mesh {
    /// Computes tangents and binormals for every triangle.
    ///
    /// Triangles that fail (zero area, degenerate UVs) leave their vertices'
    /// entries at the previous value; fresh entries default to zero.
    pub fn compute_tnbs(&mut self) {
        let vertex_count = self.positions.len();
        self.tangents.resize(vertex_count, Vec3::ZERO);
        self.binormals.resize(vertex_count, Vec3::ZERO);

        for index in 0..self.triangles.len() {
            self.compute_tnb(index as u32);
        }
    }

    /// Computes the tangent/binormal for one triangle, writing the result to
    /// all three of its vertices.
    ///
    /// Returns false without mutating anything when the triangle is deleted,
    /// has no UVs, or is degenerate.
    pub fn compute_tnb(&mut self, tri_index: u32) -> bool {
        let Some(tri) = self.triangle(tri_index as usize) else {
            return false;
        };
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        if self.base_uvs.len() <= i0.max(i1).max(i2) {
            return false;
        }

        let mut v = [self.positions[i0], self.positions[i1], self.positions[i2]];
        let mut uv = [self.base_uvs[i0], self.base_uvs[i1], self.base_uvs[i2]];

        let mut normal = (v[1] - v[0]).cross(v[2] - v[0]);
        if normal.length_squared() <= LENGTH_SQR_TOLERANCE {
            return false;
        }
        normal = normal.normalize();

        // Tangent: sort by V, interpolate edge 0-2 to the middle vertex's V.
        sort_descending(&mut v, &mut uv, |uv| uv.y);

        let interp = if (uv[2].y - uv[0].y).abs() < UV_EPSILON {
            1.0
        } else {
            (uv[1].y - uv[0].y) / (uv[2].y - uv[0].y)
        };
        let interp_vec = v[0] * (1.0 - interp) + v[2] * interp;
        let interp_u = uv[0].x * (1.0 - interp) + uv[2].x * interp;

        let mut tangent = interp_vec - v[1];
        if interp_u < uv[1].x {
            tangent = -tangent;
        }
        if tangent.length_squared() <= LENGTH_SQR_TOLERANCE {
            return false;
        }
        tangent = tangent.normalize();

        // Orthogonalize against the normal.
        tangent -= normal * normal.dot(tangent);
        if tangent.length_squared() <= LENGTH_SQR_TOLERANCE {
            return false;
        }
        tangent = tangent.normalize();

        // Binormal: the same construction sorted by U.
        sort_descending(&mut v, &mut uv, |uv| uv.x);

        let interp = if (uv[2].x - uv[0].x).abs() < UV_EPSILON {
            1.0
        } else {
            (uv[1].x - uv[0].x) / (uv[2].x - uv[0].x)
        };
        let interp_vec = v[0] * (1.0 - interp) + v[2] * interp;
        let interp_v = uv[0].y * (1.0 - interp) + uv[2].y * interp;

        let mut binormal = interp_vec - v[1];
        if interp_v < uv[1].y {
            binormal = -binormal;
        }

        binormal -= normal * normal.dot(binormal);
        if binormal.length_squared() <= LENGTH_SQR_TOLERANCE {
            binormal = tangent.cross(normal);
        } else {
            binormal = binormal.normalize();
        }
        if binormal.length_squared() < LENGTH_SQR_TOLERANCE {
            return false;
        }

        let vertex_count = self.positions.len();
        self.tangents.resize(vertex_count, Vec3::ZERO);
        self.binormals.resize(vertex_count, Vec3::ZERO);
        for i in [i0, i1, i2] {
            self.tangents[i] = tangent;
            self.binormals[i] = binormal;
        }
        true
    }
}
