//! Picking and selection contracts.
//!
//! Structures do not implement interactive picking math themselves; they feed
//! their primitives to a [`PickVisitor`] and let it accumulate hits. The
//! visitor transforms primitives by the current object matrix before testing,
//! so structures always submit local-space data.

use glam::{Mat4, Vec3};

/// How primitives are selected for testing during a pick pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PickMode {
    /// Pick against wireframe edges.
    Wireframe,
    /// Pick against shaded triangles.
    #[default]
    Shaded,
}

/// A single intersection recorded by a pick visitor.
#[derive(Debug, Clone)]
pub struct PickHit {
    /// Index of the primitive within the currently set object, in submission
    /// order (the visitor does not interpret this beyond bookkeeping).
    pub element: usize,
    /// World-space position of the intersection.
    pub world_position: Vec3,
    /// Distance from the pick origin along the pick direction.
    pub distance: f32,
}

/// Receives primitives from structures during a pick traversal.
pub trait PickVisitor {
    /// Returns the active pick mode.
    fn mode(&self) -> PickMode;

    /// Sets the transform applied to subsequently submitted primitives and
    /// resets the per-object element counter.
    fn set_current_object(&mut self, transform: Mat4);

    /// Tests a point primitive with the given world-space tolerance.
    ///
    /// A negative tolerance selects the visitor's own default.
    fn pick_point(&mut self, position: Vec3, tolerance: f32);

    /// Tests a line segment primitive with the given world-space tolerance.
    ///
    /// A negative tolerance selects the visitor's own default.
    fn pick_segment(&mut self, a: Vec3, b: Vec3, tolerance: f32);

    /// Tests a triangle primitive.
    fn pick_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3);

    /// Returns the hits recorded so far, unordered.
    fn hits(&self) -> &[PickHit];

    /// Returns the number of hits recorded so far.
    fn hit_count(&self) -> usize {
        self.hits().len()
    }
}

/// A ray-based [`PickVisitor`].
///
/// Tests submitted primitives against a world-space ray. This is the concrete
/// visitor used by tests and headless tools; an interactive viewport supplies
/// its own visitor built from the camera.
pub struct RayPickVisitor {
    origin: Vec3,
    direction: Vec3,
    mode: PickMode,
    default_tolerance: f32,
    transform: Mat4,
    element: usize,
    hits: Vec<PickHit>,
}

impl RayPickVisitor {
    /// Creates a visitor for the ray starting at `origin` toward `direction`.
    ///
    /// `direction` need not be normalized; it is normalized internally.
    pub fn new(origin: Vec3, direction: Vec3, mode: PickMode) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            mode,
            default_tolerance: 0.05,
            transform: Mat4::IDENTITY,
            element: 0,
            hits: Vec::new(),
        }
    }

    /// Sets the tolerance used when a caller passes a negative one.
    #[must_use]
    pub fn with_default_tolerance(mut self, tolerance: f32) -> Self {
        self.default_tolerance = tolerance;
        self
    }

    fn effective_tolerance(&self, tolerance: f32) -> f32 {
        if tolerance < 0.0 {
            self.default_tolerance
        } else {
            tolerance
        }
    }

    /// Returns the hit nearest to the ray origin, if any.
    #[must_use]
    pub fn closest_hit(&self) -> Option<&PickHit> {
        self.hits
            .iter()
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn record(&mut self, world_position: Vec3, distance: f32) {
        self.hits.push(PickHit {
            element: self.element,
            world_position,
            distance,
        });
    }
}

impl PickVisitor for RayPickVisitor {
    fn mode(&self) -> PickMode {
        self.mode
    }

    fn set_current_object(&mut self, transform: Mat4) {
        self.transform = transform;
        self.element = 0;
    }

    fn pick_point(&mut self, position: Vec3, tolerance: f32) {
        let tolerance = self.effective_tolerance(tolerance);
        let p = self.transform.transform_point3(position);
        let to_p = p - self.origin;
        let t = to_p.dot(self.direction).max(0.0);
        let closest = self.origin + self.direction * t;
        if (p - closest).length_squared() <= tolerance * tolerance {
            self.record(p, t);
        }
        self.element += 1;
    }

    fn pick_segment(&mut self, a: Vec3, b: Vec3, tolerance: f32) {
        let tolerance = self.effective_tolerance(tolerance);
        let a = self.transform.transform_point3(a);
        let b = self.transform.transform_point3(b);

        // Closest points between the ray and the segment.
        let seg = b - a;
        let ds = a - self.origin;
        let c = self.direction.cross(seg);
        let c_len_sq = c.length_squared();

        let (ray_t, seg_t) = if c_len_sq < 1e-12 {
            // Parallel: project segment start onto the ray.
            (ds.dot(self.direction).max(0.0), 0.0)
        } else {
            let t0 = ds.cross(seg).dot(c) / c_len_sq;
            let t1 = ds.cross(self.direction).dot(c) / c_len_sq;
            (t0.max(0.0), t1.clamp(0.0, 1.0))
        };

        let on_ray = self.origin + self.direction * ray_t;
        let on_seg = a + seg * seg_t;
        if (on_ray - on_seg).length_squared() <= tolerance * tolerance {
            self.record(on_seg, ray_t);
        }
        self.element += 1;
    }

    fn pick_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3) {
        let a = self.transform.transform_point3(a);
        let b = self.transform.transform_point3(b);
        let c = self.transform.transform_point3(c);

        // Moller-Trumbore, both winding orders accepted.
        let e1 = b - a;
        let e2 = c - a;
        let pvec = self.direction.cross(e2);
        let det = e1.dot(pvec);
        if det.abs() > 1e-12 {
            let inv_det = 1.0 / det;
            let tvec = self.origin - a;
            let u = tvec.dot(pvec) * inv_det;
            if (0.0..=1.0).contains(&u) {
                let qvec = tvec.cross(e1);
                let v = self.direction.dot(qvec) * inv_det;
                if v >= 0.0 && u + v <= 1.0 {
                    let t = e2.dot(qvec) * inv_det;
                    if t >= 0.0 {
                        self.record(self.origin + self.direction * t, t);
                    }
                }
            }
        }
        self.element += 1;
    }

    fn hits(&self) -> &[PickHit] {
        &self.hits
    }
}
