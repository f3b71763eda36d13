//! Candidate anchor points derived from the floorplan.

use nalgebra::Vector3;
use pr_core::{Point3, distance};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::floorplan::{FloorplanElement, FloorplanSnapshot};

/// Points closer than this within one element are emitted once.
const DUPLICATE_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapKind {
    Center,
    Corner,
    Edge,
    Connection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapPoint {
    pub position: Point3,
    pub kind: SnapKind,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSettings {
    /// Elements longer than this (feet) also get quarter-span anchors.
    pub long_element_threshold: f64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            long_element_threshold: 20.0,
        }
    }
}

/// Snap anchors for the current floorplan.
///
/// Rebuilt by the host whenever the floorplan changes; near-duplicates
/// across elements are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapPointCatalog {
    points: Vec<SnapPoint>,
}

impl SnapPointCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: Vec<SnapPoint>) -> Self {
        Self { points }
    }

    pub fn generate(snapshot: &FloorplanSnapshot, settings: &CatalogSettings) -> Self {
        let mut points = Vec::new();
        for element in &snapshot.elements {
            if !element.is_finite() {
                warn!(element = %element.id, "skipping floorplan element with non-finite geometry");
                continue;
            }
            points.extend(element_snap_points(element, settings));
        }
        debug!(
            elements = snapshot.elements.len(),
            points = points.len(),
            "snap catalog generated"
        );
        Self { points }
    }

    pub fn points(&self) -> &[SnapPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Snap points within `radius` of `point`, nearest first.
    pub fn query(&self, point: Point3, radius: f64) -> Vec<&SnapPoint> {
        let mut hits: Vec<(f64, &SnapPoint)> = self
            .points
            .iter()
            .map(|sp| (distance(point, sp.position), sp))
            .filter(|(d, _)| *d <= radius)
            .collect();
        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        hits.into_iter().map(|(_, sp)| sp).collect()
    }

    pub fn nearest(&self, point: Point3, radius: f64) -> Option<&SnapPoint> {
        self.query(point, radius).into_iter().next()
    }
}

/// Center, footprint corners, edge midpoints, quarter spans and ports of one element.
pub fn element_snap_points(element: &FloorplanElement, settings: &CatalogSettings) -> Vec<SnapPoint> {
    let hw = element.dimensions.width.abs() / 2.0;
    let hd = element.dimensions.depth.abs() / 2.0;
    let mut out: Vec<SnapPoint> = Vec::new();
    let mut push = |local: Vector3<f64>, kind: SnapKind, description: String| {
        let position = element.to_world(local);
        if out
            .iter()
            .any(|sp| distance(sp.position, position) <= DUPLICATE_EPSILON)
        {
            return;
        }
        out.push(SnapPoint {
            position,
            kind,
            description,
        });
    };

    push(
        Vector3::zeros(),
        SnapKind::Center,
        format!("{} center", element.id),
    );

    for (sx, sz, label) in [
        (-1.0, -1.0, "back-left"),
        (1.0, -1.0, "back-right"),
        (1.0, 1.0, "front-right"),
        (-1.0, 1.0, "front-left"),
    ] {
        push(
            Vector3::new(sx * hw, 0.0, sz * hd),
            SnapKind::Corner,
            format!("{} {} corner", element.id, label),
        );
    }

    for (local, label) in [
        (Vector3::new(0.0, 0.0, -hd), "back"),
        (Vector3::new(hw, 0.0, 0.0), "right"),
        (Vector3::new(0.0, 0.0, hd), "front"),
        (Vector3::new(-hw, 0.0, 0.0), "left"),
    ] {
        push(local, SnapKind::Edge, format!("{} {} edge", element.id, label));
    }

    let long_along_x = hw >= hd;
    let half_long = hw.max(hd);
    if half_long * 2.0 > settings.long_element_threshold {
        for t in [-0.5, 0.5] {
            let local = if long_along_x {
                Vector3::new(t * half_long, 0.0, 0.0)
            } else {
                Vector3::new(0.0, 0.0, t * half_long)
            };
            let label = if t < 0.0 { "first" } else { "third" };
            push(
                local,
                SnapKind::Edge,
                format!("{} {} quarter", element.id, label),
            );
        }
    }

    for (i, port) in element.connection_ports.iter().enumerate() {
        push(
            port.to_vector(),
            SnapKind::Connection,
            format!("{} port {}", element.id, i + 1),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::floorplan::{Dimensions, ElementCategory};

    fn element(width: f64, depth: f64) -> FloorplanElement {
        FloorplanElement {
            id: "e".to_string(),
            category: ElementCategory::Fixture,
            position: Point3::new(0.0, 3.0, 0.0),
            dimensions: Dimensions {
                width,
                height: 6.0,
                depth,
            },
            rotation: 0.0,
            connection_ports: vec![],
        }
    }

    fn count(points: &[SnapPoint], kind: SnapKind) -> usize {
        points.iter().filter(|p| p.kind == kind).count()
    }

    #[test]
    fn box_element_has_center_corners_and_edges() {
        let pts = element_snap_points(&element(4.0, 2.0), &CatalogSettings::default());
        assert_eq!(count(&pts, SnapKind::Center), 1);
        assert_eq!(count(&pts, SnapKind::Corner), 4);
        assert_eq!(count(&pts, SnapKind::Edge), 4);
        assert!(pts.iter().all(|p| (p.position.y - 3.0).abs() < 1e-12));
    }

    #[test]
    fn long_wall_gets_quarter_points() {
        let pts = element_snap_points(&element(40.0, 0.5), &CatalogSettings::default());
        assert_eq!(count(&pts, SnapKind::Edge), 6);
        assert!(
            pts.iter()
                .any(|p| (p.position.x - 10.0).abs() < 1e-9 && p.position.z.abs() < 1e-9)
        );
    }

    #[test]
    fn zero_depth_wall_has_no_duplicate_points() {
        let pts = element_snap_points(&element(10.0, 0.0), &CatalogSettings::default());
        // center, two end corners; the front/back edges coincide with center
        assert_eq!(pts.len(), 3);
    }

    #[test]
    fn connection_ports_follow_rotation() {
        let mut e = element(2.0, 2.0);
        e.rotation = std::f64::consts::PI;
        e.connection_ports = vec![Point3::new(1.0, -2.0, 0.0)];
        let pts = element_snap_points(&e, &CatalogSettings::default());
        let port = pts.iter().find(|p| p.kind == SnapKind::Connection).unwrap();
        assert!((port.position.x + 1.0).abs() < 1e-9);
        assert!((port.position.y - 1.0).abs() < 1e-9);
    }

    #[test]
    fn query_is_sorted_and_bounded() {
        let catalog = SnapPointCatalog::generate(
            &FloorplanSnapshot {
                elements: vec![element(4.0, 4.0)],
            },
            &CatalogSettings::default(),
        );
        let origin = Point3::new(2.1, 3.0, 2.1);
        let hits = catalog.query(origin, 2.5);
        assert!(!hits.is_empty());
        for pair in hits.windows(2) {
            assert!(distance(origin, pair[0].position) <= distance(origin, pair[1].position));
        }
        assert!(hits.iter().all(|p| distance(origin, p.position) <= 2.5));
        assert_eq!(catalog.nearest(origin, 2.5).unwrap().kind, SnapKind::Corner);
    }

    #[test]
    fn empty_snapshot_yields_empty_catalog() {
        let catalog =
            SnapPointCatalog::generate(&FloorplanSnapshot::default(), &CatalogSettings::default());
        assert!(catalog.is_empty());
        assert!(catalog.nearest(Point3::ORIGIN, 100.0).is_none());
    }

    #[test]
    fn non_finite_elements_are_skipped() {
        let mut bad = element(1.0, 1.0);
        bad.position.x = f64::NAN;
        let catalog = SnapPointCatalog::generate(
            &FloorplanSnapshot {
                elements: vec![bad, element(1.0, 1.0)],
            },
            &CatalogSettings::default(),
        );
        assert_eq!(catalog.len(), 9);
    }
}
