//! 3D primitives for snapping and path geometry.
//!
//! World space is right-handed with `y` up; all lengths are feet.

use nalgebra::Vector3;

use crate::numeric::{COINCIDENT_EPSILON, Real};

/// Default vertical-component tolerance for [`is_level`].
pub const LEVEL_TOLERANCE: Real = 0.05;

/// Default minimum |dot(dir, up)| for [`is_plumb`].
pub const PLUMB_TOLERANCE: Real = 0.95;

/// A point in world space (feet).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Point3 {
    pub x: Real,
    pub y: Real,
    pub z: Real,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: Real, y: Real, z: Real) -> Self {
        Self { x, y, z }
    }

    pub fn to_vector(self) -> Vector3<Real> {
        Vector3::new(self.x, self.y, self.z)
    }

    pub fn distance_to(self, other: Point3) -> Real {
        distance(self, other)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn with_x(self, x: Real) -> Self {
        Self { x, ..self }
    }

    pub fn with_y(self, y: Real) -> Self {
        Self { y, ..self }
    }

    pub fn with_z(self, z: Real) -> Self {
        Self { z, ..self }
    }

    pub fn offset(self, v: Vector3<Real>) -> Self {
        Self::from(self.to_vector() + v)
    }

    pub fn lerp(self, other: Point3, t: Real) -> Self {
        Self::from(self.to_vector().lerp(&other.to_vector(), t))
    }
}

impl From<Vector3<Real>> for Point3 {
    fn from(v: Vector3<Real>) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<Point3> for Vector3<Real> {
    fn from(p: Point3) -> Self {
        p.to_vector()
    }
}

/// Round each coordinate to the nearest multiple of `step`.
///
/// A non-positive or non-finite step leaves the point unchanged.
/// Decimal steps (0.1, 0.25, ...) divide by the whole reciprocal so that
/// `76.4` on a 0.1 grid stays exactly `76.4`.
pub fn quantize(point: Point3, step: Real) -> Point3 {
    if !(step.is_finite() && step > 0.0) {
        return point;
    }
    let per_unit = (1.0 / step).round();
    let whole_reciprocal = per_unit >= 1.0 && (per_unit * step - 1.0).abs() < 1e-12;
    let snap = |v: Real| {
        if whole_reciprocal {
            (v * per_unit).round() / per_unit
        } else {
            (v / step).round() * step
        }
    };
    Point3::new(snap(point.x), snap(point.y), snap(point.z))
}

/// Angle in degrees between two directions.
///
/// Inputs are normalized first; a zero-length input yields 0.
pub fn angle_between(a: Vector3<Real>, b: Vector3<Real>) -> Real {
    let (Some(a), Some(b)) = (a.try_normalize(0.0), b.try_normalize(0.0)) else {
        return 0.0;
    };
    a.dot(&b).clamp(-1.0, 1.0).acos().to_degrees()
}

pub fn distance(a: Point3, b: Point3) -> Real {
    (b.to_vector() - a.to_vector()).norm()
}

/// Unit direction from `from` to `to`, or `None` when the points coincide.
pub fn direction(from: Point3, to: Point3) -> Option<Vector3<Real>> {
    let delta = to.to_vector() - from.to_vector();
    if delta.norm() <= COINCIDENT_EPSILON {
        return None;
    }
    Some(delta.normalize())
}

/// `true` when `dir` runs (near-)horizontally.
pub fn is_level(dir: Vector3<Real>, tolerance: Real) -> bool {
    match dir.try_normalize(0.0) {
        Some(d) => d.y.abs() <= tolerance,
        None => false,
    }
}

/// `true` when `dir` runs (near-)vertically.
pub fn is_plumb(dir: Vector3<Real>, tolerance: Real) -> bool {
    match dir.try_normalize(0.0) {
        Some(d) => d.y.abs() >= tolerance,
        None => false,
    }
}

/// Shortest distance from `p` to the segment `a`-`b`.
pub fn distance_to_segment(p: Point3, a: Point3, b: Point3) -> Real {
    let ab = b.to_vector() - a.to_vector();
    let len_sq = ab.norm_squared();
    if len_sq <= COINCIDENT_EPSILON * COINCIDENT_EPSILON {
        return distance(p, a);
    }
    let t = ((p.to_vector() - a.to_vector()).dot(&ab) / len_sq).clamp(0.0, 1.0);
    distance(p, a.lerp(b, t))
}

/// Sum of consecutive distances along a polyline.
pub fn polyline_length(points: &[Point3]) -> Real {
    points.windows(2).map(|w| distance(w[0], w[1])).sum()
}
