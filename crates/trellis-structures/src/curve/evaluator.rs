//! Curve tessellation.
//!
//! Converts a sparse control-point sequence into a denser polyline by
//! evaluating a cubic basis over each span. With fewer than four control
//! points no smoothing is possible and the control points pass through
//! unchanged.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// The interpolation basis of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CurveKind {
    /// Straight segments between control points; no tessellation.
    #[default]
    Linear,
    /// Uniform cubic B-spline (smooth, does not interpolate control points).
    BSpline,
    /// Catmull-Rom spline (interpolates control points).
    CatmullRom,
}

/// Uniform cubic B-spline basis, rows scaled by 1/6.
const BSPLINE_BASIS: [[f32; 4]; 4] = [
    [-1.0 / 6.0, 3.0 / 6.0, -3.0 / 6.0, 1.0 / 6.0],
    [3.0 / 6.0, -6.0 / 6.0, 3.0 / 6.0, 0.0],
    [-3.0 / 6.0, 0.0, 3.0 / 6.0, 0.0],
    [1.0 / 6.0, 4.0 / 6.0, 1.0 / 6.0, 0.0],
];

/// Catmull-Rom basis, rows scaled by 1/2.
const CATMULL_ROM_BASIS: [[f32; 4]; 4] = [
    [-0.5, 1.5, -1.5, 0.5],
    [1.0, -2.5, 2.0, -0.5],
    [-0.5, 0.0, 0.5, 0.0],
    [0.0, 1.0, 0.0, 0.0],
];

/// Evaluates one span at parameter `t` given its four neighboring points.
fn evaluate_span(basis: &[[f32; 4]; 4], p: [Vec3; 4], t: f32) -> Vec3 {
    let t2 = t * t;
    let weights = [t2 * t, t2, t, 1.0];

    let mut point = Vec3::ZERO;
    for (row, &w) in basis.iter().zip(&weights) {
        let blended = p[0] * row[0] + p[1] * row[1] + p[2] * row[2] + p[3] * row[3];
        point += blended * w;
    }
    point
}

/// Tessellates `control` into a polyline with `resolution` samples per span.
///
/// Linear curves and curves with fewer than four control points return the
/// control points unchanged. Closed curves wrap span indices modulo the
/// control count, so every control point starts a span; the loop-closing
/// segment back to the first point is the renderer's (one extra segment),
/// not an extra duplicated sample here.
#[must_use]
pub fn evaluate_curve(control: &[Vec3], resolution: u32, closed: bool, kind: CurveKind) -> Vec<Vec3> {
    if kind == CurveKind::Linear || control.len() < 4 {
        return control.to_vec();
    }

    let basis = match kind {
        CurveKind::BSpline => &BSPLINE_BASIS,
        CurveKind::CatmullRom => &CATMULL_ROM_BASIS,
        CurveKind::Linear => unreachable!(),
    };

    let n = control.len();
    let resolution = resolution.max(1) as usize;
    let span_count = if closed { n } else { n - 3 };

    let mut points = Vec::with_capacity(span_count * resolution + 1);
    for span in 0..span_count {
        let p = if closed {
            // Each span needs one point before and two after; wrap at both ends.
            [
                control[(span + n - 1) % n],
                control[span],
                control[(span + 1) % n],
                control[(span + 2) % n],
            ]
        } else {
            [
                control[span],
                control[span + 1],
                control[span + 2],
                control[span + 3],
            ]
        };

        for sample in 0..resolution {
            let t = sample as f32 / resolution as f32;
            points.push(evaluate_span(basis, p, t));
        }

        // Open curves end at the final span's endpoint; a closed curve's
        // wrap span already meets the first span's start.
        if !closed && span == span_count - 1 {
            points.push(evaluate_span(basis, p, 1.0));
        }
    }

    points
}
