//! Curve structure.
//!
//! A [`Curve`] is an ordered sequence of control points plus a tessellation
//! policy. Every evaluation pass recomputes the derived point polyline and
//! refreshes the vertex buffer, which holds the control points followed by
//! the tessellated points (each group with its first point appended again so
//! the renderer can draw the loop-closing segment of closed curves).

mod evaluator;

pub use evaluator::{evaluate_curve, CurveKind};

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use trellis_core::device::RenderDevice;
use trellis_core::pick::PickVisitor;
use trellis_core::structure::{GraphDirection, Structure};
use trellis_render::{PopulateArgs, PositionVertex, VertexBuffer, VertexElementType};

/// How control points are labeled in an editor overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlPointLabel {
    /// No labels.
    #[default]
    None,
    /// Curve name and point index.
    CurveAndIndex,
    /// Point index only.
    IndexOnly,
}

/// Pick tolerance for curve points and segments, in world units.
const PICK_TOLERANCE: f32 = 0.05;

/// An editable curve scene node.
#[derive(Serialize, Deserialize)]
pub struct Curve {
    name: String,

    // Persisted
    kind: CurveKind,
    closed: bool,
    resolution: u32,
    control_point_label: ControlPointLabel,
    control_points: Vec<Vec3>,

    // Derived: the tessellated polyline, recomputed every evaluation
    #[serde(skip)]
    points: Vec<Vec3>,

    #[serde(skip)]
    transform: Mat4,

    #[serde(skip)]
    vertices: Option<VertexBuffer>,
}

impl Curve {
    /// Creates an empty linear curve.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CurveKind::Linear,
            closed: false,
            resolution: 10,
            control_point_label: ControlPointLabel::None,
            control_points: Vec::new(),
            points: Vec::new(),
            transform: Mat4::IDENTITY,
            vertices: None,
        }
    }

    /// Creates a curve from control points.
    #[must_use]
    pub fn with_control_points(
        name: impl Into<String>,
        kind: CurveKind,
        control_points: Vec<Vec3>,
    ) -> Self {
        let mut curve = Self::new(name);
        curve.kind = kind;
        curve.control_points = control_points;
        curve
    }

    /// Returns the curve kind.
    #[must_use]
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Sets the curve kind.
    pub fn set_kind(&mut self, kind: CurveKind) {
        self.kind = kind;
    }

    /// Returns whether the curve wraps from its last control point to its first.
    #[must_use]
    pub fn closed(&self) -> bool {
        self.closed
    }

    /// Sets the closed flag.
    pub fn set_closed(&mut self, closed: bool) {
        self.closed = closed;
    }

    /// Returns the tessellation resolution (samples per span).
    #[must_use]
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Sets the tessellation resolution.
    pub fn set_resolution(&mut self, resolution: u32) {
        self.resolution = resolution;
    }

    /// Returns the control point labeling mode.
    #[must_use]
    pub fn control_point_label(&self) -> ControlPointLabel {
        self.control_point_label
    }

    /// Sets the control point labeling mode.
    pub fn set_control_point_label(&mut self, label: ControlPointLabel) {
        self.control_point_label = label;
    }

    /// Returns the control points in curve order.
    #[must_use]
    pub fn control_points(&self) -> &[Vec3] {
        &self.control_points
    }

    /// Returns the number of control points.
    #[must_use]
    pub fn control_point_count(&self) -> usize {
        self.control_points.len()
    }

    /// Inserts a control point at `index`, shifting later points.
    ///
    /// # Panics
    /// Panics if `index > control_point_count()`.
    pub fn insert_control_point(&mut self, index: usize, position: Vec3) {
        self.control_points.insert(index, position);
    }

    /// Removes and returns the control point at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn remove_control_point(&mut self, index: usize) -> Vec3 {
        self.control_points.remove(index)
    }

    /// Moves the control point at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range.
    pub fn set_control_point(&mut self, index: usize, position: Vec3) {
        self.control_points[index] = position;
    }

    /// Returns the tessellated points from the last evaluation.
    #[must_use]
    pub fn points(&self) -> &[Vec3] {
        &self.points
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

    // === Queries ===

    /// Projects `point` (world space) onto the tessellated polyline.
    ///
    /// Returns `None` when fewer than two tessellated points exist.
    #[must_use]
    pub fn project_point_on_curve(&self, point: Vec3) -> Option<Vec3> {
        if self.points.len() < 2 {
            return None;
        }

        let mut closest = Vec3::ZERO;
        let mut closest_dist_sqr = f32::MAX;
        let mut test_segment = |a: Vec3, b: Vec3| {
            let a = self.transform.transform_point3(a);
            let b = self.transform.transform_point3(b);
            let projected = project_on_segment(point, a, b);
            let dist_sqr = (point - projected).length_squared();
            if dist_sqr < closest_dist_sqr {
                closest_dist_sqr = dist_sqr;
                closest = projected;
            }
        };

        for window in self.points.windows(2) {
            test_segment(window[0], window[1]);
        }
        if self.closed {
            test_segment(self.points[self.points.len() - 1], self.points[0]);
        }

        Some(closest)
    }

    /// Squared distance from `point` to the curve, or `None` when degenerate.
    #[must_use]
    pub fn distance_sqr_to_curve(&self, point: Vec3) -> Option<f32> {
        self.project_point_on_curve(point)
            .map(|projected| (point - projected).length_squared())
    }

    /// Distance from `point` to the curve, or `None` when degenerate.
    #[must_use]
    pub fn distance_to_curve(&self, point: Vec3) -> Option<f32> {
        self.distance_sqr_to_curve(point).map(f32::sqrt)
    }

    /// Total length of the tessellated polyline in world space.
    #[must_use]
    pub fn curve_length(&self) -> f32 {
        let mut length = 0.0;
        for window in self.points.windows(2) {
            let start = self.transform.transform_point3(window[0]);
            let end = self.transform.transform_point3(window[1]);
            length += (end - start).length();
        }
        if self.closed && self.points.len() > 1 {
            let start = self.transform.transform_point3(self.points[self.points.len() - 1]);
            let end = self.transform.transform_point3(self.points[0]);
            length += (end - start).length();
        }
        length
    }

    /// Index of the control point nearest the pick ray, if any respond.
    #[must_use]
    pub fn closest_control_point(&self, pick: &mut dyn PickVisitor) -> Option<usize> {
        pick.set_current_object(self.transform);

        let mut best: Option<(usize, f32)> = None;
        for (i, &point) in self.control_points.iter().enumerate() {
            let before = pick.hit_count();
            pick.pick_point(point, f32::MAX);
            if pick.hit_count() > before {
                let distance = pick.hits()[pick.hit_count() - 1].distance;
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some((i, distance));
                }
            }
        }
        best.map(|(i, _)| i)
    }

    /// Indices of the control point pair whose connecting segment is nearest
    /// the pick ray.
    #[must_use]
    pub fn closest_control_points(&self, pick: &mut dyn PickVisitor) -> Option<(usize, usize)> {
        if self.control_points.len() < 2 {
            return None;
        }
        pick.set_current_object(self.transform);

        let mut best: Option<(usize, usize, f32)> = None;
        for i in 1..self.control_points.len() {
            let before = pick.hit_count();
            pick.pick_segment(self.control_points[i - 1], self.control_points[i], -1.0);
            if pick.hit_count() > before {
                let distance = pick.hits()[pick.hit_count() - 1].distance;
                if best.map_or(true, |(_, _, d)| distance < d) {
                    best = Some((i - 1, i, distance));
                }
            }
        }
        best.map(|(a, b, _)| (a, b))
    }

    /// Index of the tessellated point nearest the pick ray, if any respond.
    #[must_use]
    pub fn closest_point(&self, pick: &mut dyn PickVisitor) -> Option<usize> {
        pick.set_current_object(self.transform);

        let mut best: Option<(usize, f32)> = None;
        for (i, &point) in self.points.iter().enumerate() {
            let before = pick.hit_count();
            pick.pick_point(point, f32::MAX);
            if pick.hit_count() > before {
                let distance = pick.hits()[pick.hit_count() - 1].distance;
                if best.map_or(true, |(_, d)| distance < d) {
                    best = Some((i, distance));
                }
            }
        }
        best.map(|(i, _)| i)
    }

    /// Index of the tessellated point nearest `position` (world space).
    #[must_use]
    pub fn closest_point_to(&self, position: Vec3) -> Option<usize> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &point) in self.points.iter().enumerate() {
            let distance = (position - self.transform.transform_point3(point)).length();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((i, distance));
            }
        }
        best.map(|(i, _)| i)
    }

    // === Buffer plumbing ===

    /// Vertex count the buffer must hold: both point groups plus their
    /// loop-back duplicates.
    fn buffer_element_count(&self) -> usize {
        let control = self.control_points.len();
        let control = if control > 0 { control + 1 } else { 0 };
        let points = self.points.len();
        let points = if points > 0 { points + 1 } else { 0 };
        control + points
    }
}

/// Projects `point` onto the segment `a`..`b`.
fn project_on_segment(point: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let seg = b - a;
    let len_sqr = seg.length_squared();
    if len_sqr <= f32::EPSILON {
        return a;
    }
    let t = ((point - a).dot(seg) / len_sqr).clamp(0.0, 1.0);
    a + seg * t
}

/// Writes the curve's two point groups into its vertex buffer.
struct CurveVertexSource<'a>(&'a Curve);

impl trellis_render::BufferPopulator for CurveVertexSource<'_> {
    fn populate(&self, args: &mut PopulateArgs<'_>) {
        let curve = self.0;

        // A zero-sized buffer means the element count has not been set yet
        // (created before the first evaluation, or zeroed by delete); the
        // next evaluation sizes it.
        if args.remaining() == 0 {
            return;
        }

        // Control points, looping back to the first.
        if let Some(&first) = curve.control_points.first() {
            for &point in &curve.control_points {
                args.write_slice(&[PositionVertex::new(point)]);
            }
            args.write_slice(&[PositionVertex::new(first)]);
        }

        // Tessellated points, looping back to the first.
        if let Some(&first) = curve.points.first() {
            for &point in &curve.points {
                args.write_slice(&[PositionVertex::new(point)]);
            }
            args.write_slice(&[PositionVertex::new(first)]);
        }
    }
}

impl Structure for Curve {
    fn name(&self) -> &str {
        &self.name
    }

    fn type_name(&self) -> &'static str {
        "Curve"
    }

    fn bounding_box(&self) -> Option<(Vec3, Vec3)> {
        if self.control_points.is_empty() && self.points.is_empty() {
            return None;
        }

        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for &p in self.control_points.iter().chain(&self.points) {
            min = min.min(p);
            max = max.max(p);
        }
        Some((min, max))
    }

    fn create(&mut self, device: &dyn RenderDevice) {
        let mut vertices = self
            .vertices
            .take()
            .unwrap_or_else(|| VertexBuffer::new(VertexElementType::Position, self.name.clone()));
        vertices.create(device, &CurveVertexSource(self));
        self.vertices = Some(vertices);
    }

    fn delete(&mut self) {
        if let Some(vertices) = self.vertices.as_mut() {
            // If the curve comes back, its control points may be restored
            // after this call; zero the count so the next evaluation sizes
            // the buffer instead of populating against stale arithmetic.
            vertices.set_element_count(0);
            vertices.delete();
        }
    }

    fn evaluate(&mut self, device: &dyn RenderDevice, _direction: GraphDirection) {
        self.points = evaluate_curve(&self.control_points, self.resolution, self.closed, self.kind);

        if let Some(mut vertices) = self.vertices.take() {
            vertices.set_element_count(self.buffer_element_count());
            vertices.update(device, &CurveVertexSource(self));
            self.vertices = Some(vertices);
        }
    }

    fn pick(&self, pick: &mut dyn PickVisitor) -> bool {
        let before = pick.hit_count();
        pick.set_current_object(self.transform);

        for &point in &self.points {
            pick.pick_point(point, PICK_TOLERANCE);
        }
        for window in self.points.windows(2) {
            pick.pick_segment(window[0], window[1], PICK_TOLERANCE);
        }
        if self.closed && self.points.len() > 1 {
            pick.pick_segment(self.points[self.points.len() - 1], self.points[0], PICK_TOLERANCE);
        }

        pick.hit_count() > before
    }
}
