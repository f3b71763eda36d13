//! Collaborators supplied by the host application.

use nalgebra::Vector3;
use pr_core::Point3;
use pr_snap::FloorplanSnapshot;

/// Pointer position in normalized device coordinates (-1..1, y up).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

/// Perspective camera state passed through to the ray caster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    pub position: Point3,
    pub target: Point3,
    /// Vertical field of view, degrees.
    pub fov_deg: f64,
    /// Viewport width / height.
    pub aspect: f64,
}

impl Default for CameraState {
    fn default() -> Self {
        Self {
            position: Point3::new(0.0, 40.0, 40.0),
            target: Point3::ORIGIN,
            fov_deg: 50.0,
            aspect: 16.0 / 9.0,
        }
    }
}

impl CameraState {
    /// World-space ray (origin, unit direction) through `pointer`.
    pub fn ray(&self, pointer: PointerPosition) -> Option<(Point3, Vector3<f64>)> {
        let forward = (self.target.to_vector() - self.position.to_vector()).try_normalize(1e-12)?;
        let right = forward.cross(&Vector3::y()).try_normalize(1e-12)?;
        let up = right.cross(&forward);
        let half = (self.fov_deg.to_radians() / 2.0).tan();
        let dir = forward + right * (pointer.x * half * self.aspect) + up * (pointer.y * half);
        Some((self.position, dir.try_normalize(1e-12)?))
    }
}

/// Scene ray-cast: nearest world-space hit under the pointer, if any.
pub trait RayCaster {
    fn cast_ray(&self, pointer: PointerPosition, camera: &CameraState) -> Option<Point3>;
}

impl<F> RayCaster for F
where
    F: Fn(PointerPosition, &CameraState) -> Option<Point3>,
{
    fn cast_ray(&self, pointer: PointerPosition, camera: &CameraState) -> Option<Point3> {
        self(pointer, camera)
    }
}

/// Ray caster that hits a horizontal work plane, for hosts without scene geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkPlane {
    pub elevation: f64,
}

impl RayCaster for WorkPlane {
    fn cast_ray(&self, pointer: PointerPosition, camera: &CameraState) -> Option<Point3> {
        let (origin, dir) = camera.ray(pointer)?;
        if dir.y.abs() < 1e-12 {
            return None;
        }
        let t = (self.elevation - origin.y) / dir.y;
        if t < 0.0 {
            return None;
        }
        Some(origin.offset(dir * t))
    }
}

/// Pull-based access to the current floorplan.
pub trait FloorplanProvider {
    fn snapshot(&self) -> FloorplanSnapshot;
}

impl FloorplanProvider for FloorplanSnapshot {
    fn snapshot(&self) -> FloorplanSnapshot {
        self.clone()
    }
}
