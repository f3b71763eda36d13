//! Editable pipe centerline with automatic fitting classification.

use pr_core::{COINCIDENT_EPSILON, Point3, angle_between, direction, distance, polyline_length};
use serde::{Deserialize, Serialize};

use crate::schema::{Fitting, PathPoint};

pub type PathResult<T> = Result<T, PathError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("Index out of range: {index} (len={len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Point {index} would coincide with its neighbor")]
    CoincidentPoint { index: usize },

    #[error("Point {index} has a non-finite coordinate")]
    NonFinite { index: usize },
}

/// Bend-angle bands (degrees) used to infer elbows.
///
/// Elbow90 is the open band `(elbow90_min, elbow90_max)`; elbow45 is the
/// half-open band `[elbow45_min, elbow45_max)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FittingThresholds {
    pub elbow90_min: f64,
    pub elbow90_max: f64,
    pub elbow45_min: f64,
    pub elbow45_max: f64,
}

impl Default for FittingThresholds {
    fn default() -> Self {
        Self {
            elbow90_min: 70.0,
            elbow90_max: 110.0,
            elbow45_min: 30.0,
            elbow45_max: 55.0,
        }
    }
}

impl FittingThresholds {
    pub fn classify_angle(&self, angle_deg: f64) -> Fitting {
        if angle_deg > self.elbow90_min && angle_deg < self.elbow90_max {
            Fitting::Elbow90
        } else if angle_deg >= self.elbow45_min && angle_deg < self.elbow45_max {
            Fitting::Elbow45
        } else {
            Fitting::None
        }
    }
}

/// Fitting for point `index` of `points`.
///
/// Precedence: hand-placed reducers/couplings, then branch connections
/// (tee/cross), then end caps on finished paths, then the bend angle.
pub fn classify_point(
    points: &[PathPoint],
    index: usize,
    finished: bool,
    thresholds: &FittingThresholds,
) -> Fitting {
    let Some(point) = points.get(index) else {
        return Fitting::None;
    };
    if point.fitting.is_manual() {
        return point.fitting;
    }
    match point.connections.len() {
        0 => {}
        1 => return Fitting::Tee,
        _ => return Fitting::Cross,
    }
    if index == 0 || index + 1 == points.len() {
        return if finished { Fitting::Cap } else { Fitting::None };
    }

    let prev = points[index - 1].position();
    let curr = point.position();
    let next = points[index + 1].position();
    match (direction(prev, curr), direction(curr, next)) {
        (Some(incoming), Some(outgoing)) => {
            thresholds.classify_angle(angle_between(incoming, outgoing))
        }
        _ => Fitting::None,
    }
}

/// Ordered list of path points plus the fitting rules applied to them.
///
/// Consecutive points never coincide. An uncapped path is still being drawn
/// and leaves its endpoints bare; a capped path puts `cap` on both ends.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipePath {
    points: Vec<PathPoint>,
    thresholds: FittingThresholds,
    capped: bool,
}

impl PipePath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: FittingThresholds) -> Self {
        Self {
            thresholds,
            ..Self::default()
        }
    }

    /// Adopt an existing point list, e.g. a committed system loaded for editing.
    pub fn from_points(
        points: Vec<PathPoint>,
        thresholds: FittingThresholds,
        capped: bool,
    ) -> PathResult<Self> {
        for (i, p) in points.iter().enumerate() {
            if !p.position().is_finite() {
                return Err(PathError::NonFinite { index: i });
            }
            if i > 0 && distance(points[i - 1].position(), p.position()) <= COINCIDENT_EPSILON {
                return Err(PathError::CoincidentPoint { index: i });
            }
        }
        Ok(Self {
            points,
            thresholds,
            capped,
        })
    }

    pub fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn positions(&self) -> Vec<Point3> {
        self.points.iter().map(PathPoint::position).collect()
    }

    pub fn into_points(self) -> Vec<PathPoint> {
        self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PathPoint> {
        self.points.last()
    }

    pub fn is_capped(&self) -> bool {
        self.capped
    }

    pub fn thresholds(&self) -> &FittingThresholds {
        &self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: FittingThresholds) {
        self.thresholds = thresholds;
        self.classify_all(self.capped);
    }

    pub fn total_length(&self) -> f64 {
        polyline_length(&self.positions())
    }

    pub fn append(&mut self, point: impl Into<PathPoint>) -> PathResult<()> {
        let index = self.points.len();
        self.insert(index, point)
    }

    pub fn insert(&mut self, index: usize, point: impl Into<PathPoint>) -> PathResult<()> {
        let point = point.into();
        let len = self.points.len();
        if index > len {
            return Err(PathError::IndexOutOfRange { index, len });
        }
        if !point.position().is_finite() {
            return Err(PathError::NonFinite { index });
        }
        let p = point.position();
        let clashes_prev = index > 0 && coincident(self.points[index - 1].position(), p);
        let clashes_next = index < len && coincident(self.points[index].position(), p);
        if clashes_prev || clashes_next {
            return Err(PathError::CoincidentPoint { index });
        }

        self.points.insert(index, point);
        self.classify_around(index);
        Ok(())
    }

    /// Pop the tail point, if any.
    pub fn remove_last(&mut self) -> Option<PathPoint> {
        self.points.pop()
    }

    pub fn remove_at(&mut self, index: usize) -> PathResult<PathPoint> {
        let len = self.points.len();
        if index >= len {
            return Err(PathError::IndexOutOfRange { index, len });
        }
        if index > 0
            && index + 1 < len
            && coincident(
                self.points[index - 1].position(),
                self.points[index + 1].position(),
            )
        {
            return Err(PathError::CoincidentPoint { index });
        }

        let removed = self.points.remove(index);
        // The neighbors now meet at a different angle.
        if index > 0 {
            self.classify_at(index - 1);
        }
        if index < self.points.len() {
            self.classify_at(index);
        }
        Ok(removed)
    }

    pub fn move_to(&mut self, index: usize, new_point: Point3) -> PathResult<()> {
        let len = self.points.len();
        if index >= len {
            return Err(PathError::IndexOutOfRange { index, len });
        }
        if !new_point.is_finite() {
            return Err(PathError::NonFinite { index });
        }
        let clashes_prev = index > 0 && coincident(self.points[index - 1].position(), new_point);
        let clashes_next =
            index + 1 < len && coincident(self.points[index + 1].position(), new_point);
        if clashes_prev || clashes_next {
            return Err(PathError::CoincidentPoint { index });
        }

        self.points[index].set_position(new_point);
        self.classify_around(index);
        Ok(())
    }

    /// Register a branch system joining at `index`.
    pub fn connect_branch(&mut self, index: usize, system_id: impl Into<String>) -> PathResult<()> {
        let len = self.points.len();
        let point = self
            .points
            .get_mut(index)
            .ok_or(PathError::IndexOutOfRange { index, len })?;
        let system_id = system_id.into();
        if !point.connections.contains(&system_id) {
            point.connections.push(system_id);
        }
        self.classify_at(index);
        Ok(())
    }

    /// Pin a hand-placed fitting (reducer, coupling) or clear it with `Fitting::None`.
    pub fn set_manual_fitting(&mut self, index: usize, fitting: Fitting) -> PathResult<()> {
        let len = self.points.len();
        let point = self
            .points
            .get_mut(index)
            .ok_or(PathError::IndexOutOfRange { index, len })?;
        point.fitting = fitting;
        if !fitting.is_manual() {
            self.classify_at(index);
        }
        Ok(())
    }

    /// Re-classify every point; `finished` caps both ends.
    pub fn classify_all(&mut self, finished: bool) {
        self.capped = finished;
        for i in 0..self.points.len() {
            self.classify_at(i);
        }
    }

    fn classify_around(&mut self, index: usize) {
        let start = index.saturating_sub(1);
        let end = (index + 1).min(self.points.len().saturating_sub(1));
        for i in start..=end {
            self.classify_at(i);
        }
    }

    fn classify_at(&mut self, index: usize) {
        let fitting = classify_point(&self.points, index, self.capped, &self.thresholds);
        if let Some(point) = self.points.get_mut(index) {
            point.fitting = fitting;
        }
    }
}

fn coincident(a: Point3, b: Point3) -> bool {
    distance(a, b) <= COINCIDENT_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn path_of(points: &[Point3]) -> PipePath {
        let mut path = PipePath::new();
        for pt in points {
            path.append(*pt).unwrap();
        }
        path
    }

    #[test]
    fn colinear_points_get_no_fitting() {
        let path = path_of(&[p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0), p(10.0, 0.0, 0.0)]);
        assert_eq!(path.points()[1].fitting, Fitting::None);
    }

    #[test]
    fn right_angle_gets_elbow90() {
        let path = path_of(&[p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0), p(5.0, 0.0, 5.0)]);
        assert_eq!(path.points()[1].fitting, Fitting::Elbow90);
    }

    #[test]
    fn forty_five_degree_turn_gets_elbow45() {
        let path = path_of(&[p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0), p(10.0, 0.0, 5.0)]);
        assert_eq!(path.points()[1].fitting, Fitting::Elbow45);
    }

    #[test]
    fn shallow_and_in_between_angles_get_nothing() {
        let t = FittingThresholds::default();
        assert_eq!(t.classify_angle(10.0), Fitting::None);
        assert_eq!(t.classify_angle(62.0), Fitting::None);
        assert_eq!(t.classify_angle(150.0), Fitting::None);
        assert_eq!(t.classify_angle(30.0), Fitting::Elbow45);
        assert_eq!(t.classify_angle(70.0), Fitting::None);
        assert_eq!(t.classify_angle(70.5), Fitting::Elbow90);
    }

    #[test]
    fn endpoints_cap_only_when_finished() {
        let mut path = path_of(&[p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0)]);
        assert_eq!(path.points()[0].fitting, Fitting::None);
        path.classify_all(true);
        assert_eq!(path.points()[0].fitting, Fitting::Cap);
        assert_eq!(path.points()[1].fitting, Fitting::Cap);
    }

    #[test]
    fn coincident_append_is_rejected() {
        let mut path = path_of(&[p(1.0, 1.0, 1.0)]);
        let err = path.append(p(1.0, 1.0, 1.0)).unwrap_err();
        assert_eq!(err, PathError::CoincidentPoint { index: 1 });
        assert_eq!(path.len(), 1);
    }

    #[test]
    fn non_finite_point_is_rejected() {
        let mut path = PipePath::new();
        assert!(matches!(
            path.append(p(f64::NAN, 0.0, 0.0)),
            Err(PathError::NonFinite { .. })
        ));
    }

    #[test]
    fn insert_reclassifies_neighbors() {
        let mut path = path_of(&[p(0.0, 0.0, 0.0), p(10.0, 0.0, 0.0), p(20.0, 0.0, 0.0)]);
        assert_eq!(path.points()[1].fitting, Fitting::None);
        path.insert(2, p(10.0, 0.0, 10.0)).unwrap();
        assert_eq!(path.points()[1].fitting, Fitting::Elbow90);
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn insert_out_of_range_fails() {
        let mut path = path_of(&[p(0.0, 0.0, 0.0)]);
        assert_eq!(
            path.insert(3, p(1.0, 0.0, 0.0)),
            Err(PathError::IndexOutOfRange { index: 3, len: 1 })
        );
    }

    #[test]
    fn move_straightens_elbow() {
        let mut path = path_of(&[p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0), p(5.0, 0.0, 5.0)]);
        path.move_to(2, p(10.0, 0.0, 0.0)).unwrap();
        assert_eq!(path.points()[1].fitting, Fitting::None);
    }

    #[test]
    fn remove_at_rejects_collapsing_neighbors() {
        let mut path = path_of(&[p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0), p(0.0, 0.0, 0.0)]);
        assert_eq!(
            path.remove_at(1),
            Err(PathError::CoincidentPoint { index: 1 })
        );
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn remove_last_on_empty_is_noop() {
        let mut path = PipePath::new();
        assert!(path.remove_last().is_none());
    }

    #[test]
    fn branch_connections_make_tees_and_crosses() {
        let mut path = path_of(&[p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0), p(10.0, 0.0, 0.0)]);
        path.connect_branch(1, "branch-a").unwrap();
        assert_eq!(path.points()[1].fitting, Fitting::Tee);
        path.connect_branch(1, "branch-a").unwrap();
        assert_eq!(path.points()[1].connections.len(), 1);
        path.connect_branch(1, "branch-b").unwrap();
        assert_eq!(path.points()[1].fitting, Fitting::Cross);
    }

    #[test]
    fn manual_fittings_survive_classification() {
        let mut path = path_of(&[p(0.0, 0.0, 0.0), p(5.0, 0.0, 0.0), p(10.0, 0.0, 0.0)]);
        path.set_manual_fitting(1, Fitting::Reducer).unwrap();
        path.classify_all(true);
        assert_eq!(path.points()[1].fitting, Fitting::Reducer);
    }

    #[test]
    fn from_points_rejects_bad_geometry() {
        let pts = vec![PathPoint::new(0.0, 0.0, 0.0), PathPoint::new(0.0, 0.0, 0.0)];
        assert!(PipePath::from_points(pts, FittingThresholds::default(), true).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn length_never_shrinks_on_append(
            start in prop::collection::vec((-50.0_f64..50.0, -50.0_f64..50.0, -50.0_f64..50.0), 0..6),
            next in (-50.0_f64..50.0, -50.0_f64..50.0, -50.0_f64..50.0),
        ) {
            let mut path = PipePath::new();
            for (x, y, z) in start {
                let _ = path.append(Point3::new(x, y, z));
            }
            let before = path.total_length();
            let _ = path.append(Point3::new(next.0, next.1, next.2));
            prop_assert!(path.total_length() >= before);
        }
    }
}
