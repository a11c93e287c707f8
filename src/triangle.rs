use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

use crate::Pose;

/// Below this the segment is treated as parallel to the triangle plane.
const PARALLEL_EPSILON: f64 = 1e-12;

/// A triangle given by three vertices.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Triangle {
    /// The vertices.
    pub vertices: [Point3<f64>; 3],
}

impl Triangle {
    /// Create a new triangle.
    pub fn new(a: Point3<f64>, b: Point3<f64>, c: Point3<f64>) -> Self {
        Self {
            vertices: [a, b, c],
        }
    }

    /// This triangle with every vertex mapped through `pose`.
    pub fn mapped(&self, pose: &Pose) -> Triangle {
        Triangle {
            vertices: self.vertices.map(|v| pose.map(&v)),
        }
    }

    /// Unnormalized normal, `(b - a) x (c - a)`.
    pub fn normal(&self) -> Vector3<f64> {
        let [a, b, c] = &self.vertices;
        (b - a).cross(&(c - a))
    }

    /// Parameter `t` in `[0, 1]` at which the segment from `pa` to `pb`
    /// crosses this triangle, if it does.
    ///
    /// Möller-Trumbore. A segment lying in the plane of the triangle never
    /// intersects.
    pub fn segment_parameter(&self, pa: &Point3<f64>, pb: &Point3<f64>) -> Option<f64> {
        let [v0, v1, v2] = &self.vertices;
        let dir = pb - pa;
        let e1 = v1 - v0;
        let e2 = v2 - v0;
        let pvec = dir.cross(&e2);
        let det = e1.dot(&pvec);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let tvec = pa - v0;
        let u = tvec.dot(&pvec) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let qvec = tvec.cross(&e1);
        let v = dir.dot(&qvec) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(&qvec) * inv_det;
        (0.0..=1.0).contains(&t).then_some(t)
    }

    /// Point at which the segment from `pa` to `pb` crosses this triangle.
    pub fn intersection(&self, pa: &Point3<f64>, pb: &Point3<f64>) -> Option<Point3<f64>> {
        self.segment_parameter(pa, pb)
            .map(|t| pa + (pb - pa) * t)
    }

    fn edges(&self) -> impl Iterator<Item = (&Point3<f64>, &Point3<f64>)> {
        let [a, b, c] = &self.vertices;
        [(a, b), (b, c), (c, a)].into_iter()
    }

    /// Whether this triangle and `other` intersect.
    ///
    /// Two non-coplanar triangles intersect exactly when an edge of one crosses
    /// the other. Coplanar triangles are reported as not overlapping.
    pub fn overlap(&self, other: &Triangle) -> bool {
        self.edges()
            .any(|(a, b)| other.segment_parameter(a, b).is_some())
            || other
                .edges()
                .any(|(a, b)| self.segment_parameter(a, b).is_some())
    }
}
