//! Read-only floorplan snapshot consumed by the snap catalog.

use nalgebra::{Rotation3, Vector3};
use pr_core::Point3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementCategory {
    Wall,
    Room,
    Fixture,
    Equipment,
}

/// Axis-aligned extents before rotation (feet).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    /// Along local x.
    pub width: f64,
    /// Along y.
    pub height: f64,
    /// Along local z.
    pub depth: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorplanElement {
    pub id: String,
    pub category: ElementCategory,
    /// Center of the element's bounding box.
    pub position: Point3,
    pub dimensions: Dimensions,
    /// Rotation about the vertical axis, radians.
    #[serde(default)]
    pub rotation: f64,
    /// Plumbing connection ports, offsets from `position` in the element's local frame.
    #[serde(default)]
    pub connection_ports: Vec<Point3>,
}

impl FloorplanElement {
    /// Map a local-frame offset to world space.
    pub fn to_world(&self, local: Vector3<f64>) -> Point3 {
        let rotation = Rotation3::from_axis_angle(&Vector3::y_axis(), self.rotation);
        self.position.offset(rotation * local)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.rotation.is_finite()
            && self.dimensions.width.is_finite()
            && self.dimensions.height.is_finite()
            && self.dimensions.depth.is_finite()
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FloorplanSnapshot {
    #[serde(default)]
    pub elements: Vec<FloorplanElement>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_turn_maps_x_to_negative_z() {
        let element = FloorplanElement {
            id: "w1".to_string(),
            category: ElementCategory::Wall,
            position: Point3::new(10.0, 5.0, 10.0),
            dimensions: Dimensions::default(),
            rotation: std::f64::consts::FRAC_PI_2,
            connection_ports: vec![],
        };
        let p = element.to_world(Vector3::new(1.0, 0.0, 0.0));
        assert!((p.x - 10.0).abs() < 1e-9);
        assert!((p.y - 5.0).abs() < 1e-9);
        assert!((p.z - 9.0).abs() < 1e-9);
    }
}
