//! Smart-alignment detection for interactive point placement.
//!
//! Each detector is a pure function over an [`AlignmentContext`]. They are
//! listed in priority order in [`DETECTORS`]; [`detect_alignment`] keeps the
//! highest-confidence result, with earlier detectors winning ties.

use pr_core::{Point3, distance, quantize};
use serde::{Deserialize, Serialize};

use crate::catalog::SnapPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentType {
    #[default]
    None,
    /// Level with the previous path point.
    Horizontal,
    /// Plumb above/below the previous path point along one axis.
    Vertical,
    /// Same height as a nearby snap point or existing pipe.
    Height,
    Grid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlignmentSettings {
    /// Max height difference (ft) to the previous point for a level match.
    pub level_tolerance: f64,
    /// Max x or z difference (ft) to the previous point for a plumb match.
    pub plumb_tolerance: f64,
    /// Max height difference (ft) for snap-point and pipe height matches.
    pub height_tolerance: f64,
    pub snap_band_min: f64,
    pub snap_band_max: f64,
    pub pipe_band_min: f64,
    pub pipe_band_max: f64,
    pub grid_step: f64,
    pub grid_confidence: f64,
    /// Results at or above this confidence are actionable.
    pub activation_threshold: f64,
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            level_tolerance: 0.25,
            plumb_tolerance: 0.25,
            height_tolerance: 0.25,
            snap_band_min: 1.0,
            snap_band_max: 20.0,
            pipe_band_min: 2.0,
            pipe_band_max: 30.0,
            grid_step: 0.1,
            grid_confidence: 0.3,
            activation_threshold: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlignmentResult {
    pub is_aligned: bool,
    pub alignment_type: AlignmentType,
    pub confidence: f64,
    pub snap_position: Point3,
    pub description: String,
}

impl AlignmentResult {
    /// `is_aligned` follows from `confidence` and the activation threshold.
    pub fn new(
        alignment_type: AlignmentType,
        confidence: f64,
        snap_position: Point3,
        description: impl Into<String>,
        activation_threshold: f64,
    ) -> Self {
        let confidence = confidence.clamp(0.0, 1.0);
        Self {
            is_aligned: confidence >= activation_threshold,
            alignment_type,
            confidence,
            snap_position,
            description: description.into(),
        }
    }

    pub fn none(position: Point3) -> Self {
        Self {
            is_aligned: false,
            alignment_type: AlignmentType::None,
            confidence: 0.0,
            snap_position: position,
            description: String::new(),
        }
    }
}

/// Everything a detector may look at.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentContext<'a> {
    pub candidate: Point3,
    pub current_path: &'a [Point3],
    pub existing_paths: &'a [Vec<Point3>],
    pub snap_points: &'a [SnapPoint],
    pub settings: &'a AlignmentSettings,
}

pub type Detector = fn(&AlignmentContext<'_>) -> Option<AlignmentResult>;

/// Detectors in priority order.
pub const DETECTORS: [Detector; 5] = [
    detect_horizontal,
    detect_vertical,
    detect_snap_height,
    detect_pipe_height,
    detect_grid,
];

pub fn detect_alignment(ctx: &AlignmentContext<'_>) -> AlignmentResult {
    detect_with(ctx, &DETECTORS)
}

/// Run `detectors` and keep the best result.
pub fn detect_with(ctx: &AlignmentContext<'_>, detectors: &[Detector]) -> AlignmentResult {
    pick_best(detectors.iter().filter_map(|detect| detect(ctx)))
        .unwrap_or_else(|| AlignmentResult::none(ctx.candidate))
}

/// Highest confidence wins; the earliest result wins a tie.
pub fn pick_best(results: impl IntoIterator<Item = AlignmentResult>) -> Option<AlignmentResult> {
    let mut best: Option<AlignmentResult> = None;
    for result in results {
        match &best {
            Some(b) if result.confidence <= b.confidence => {}
            _ => best = Some(result),
        }
    }
    best
}

fn quadratic_falloff(diff: f64, tolerance: f64) -> f64 {
    let t = 1.0 - diff / tolerance;
    t * t
}

pub fn detect_horizontal(ctx: &AlignmentContext<'_>) -> Option<AlignmentResult> {
    let last = ctx.current_path.last()?;
    let tol = ctx.settings.level_tolerance;
    let diff = (ctx.candidate.y - last.y).abs();
    if tol <= 0.0 || diff > tol {
        return None;
    }
    Some(AlignmentResult::new(
        AlignmentType::Horizontal,
        quadratic_falloff(diff, tol),
        ctx.candidate.with_y(last.y),
        format!("Level at {:.2} ft", last.y),
        ctx.settings.activation_threshold,
    ))
}

pub fn detect_vertical(ctx: &AlignmentContext<'_>) -> Option<AlignmentResult> {
    let last = ctx.current_path.last()?;
    let tol = ctx.settings.plumb_tolerance;
    let dx = (ctx.candidate.x - last.x).abs();
    let dz = (ctx.candidate.z - last.z).abs();
    // Only the stronger axis is reported so two guides never compete.
    let (diff, snapped, axis) = if dx <= dz {
        (dx, ctx.candidate.with_x(last.x), "x")
    } else {
        (dz, ctx.candidate.with_z(last.z), "z")
    };
    if tol <= 0.0 || diff > tol {
        return None;
    }
    Some(AlignmentResult::new(
        AlignmentType::Vertical,
        quadratic_falloff(diff, tol),
        snapped,
        format!("Plumb on {axis}"),
        ctx.settings.activation_threshold,
    ))
}

fn best_height_match<'p>(
    candidate: Point3,
    anchors: impl Iterator<Item = (Point3, &'p str)>,
    band: (f64, f64),
    tolerance: f64,
) -> Option<(f64, Point3, &'p str)> {
    if tolerance <= 0.0 {
        return None;
    }
    let mut best: Option<(f64, Point3, &'p str)> = None;
    for (anchor, label) in anchors {
        let d = distance(candidate, anchor);
        if d < band.0 || d > band.1 {
            continue;
        }
        let diff = (candidate.y - anchor.y).abs();
        if diff > tolerance {
            continue;
        }
        let confidence = 1.0 - diff / tolerance;
        if best.as_ref().is_none_or(|(c, _, _)| confidence > *c) {
            best = Some((confidence, anchor, label));
        }
    }
    best
}

pub fn detect_snap_height(ctx: &AlignmentContext<'_>) -> Option<AlignmentResult> {
    let s = ctx.settings;
    let (confidence, anchor, label) = best_height_match(
        ctx.candidate,
        ctx.snap_points
            .iter()
            .map(|sp| (sp.position, sp.description.as_str())),
        (s.snap_band_min, s.snap_band_max),
        s.height_tolerance,
    )?;
    Some(AlignmentResult::new(
        AlignmentType::Height,
        confidence,
        ctx.candidate.with_y(anchor.y),
        format!("Level with {label}"),
        s.activation_threshold,
    ))
}

pub fn detect_pipe_height(ctx: &AlignmentContext<'_>) -> Option<AlignmentResult> {
    let s = ctx.settings;
    let (confidence, anchor, _) = best_height_match(
        ctx.candidate,
        ctx.existing_paths
            .iter()
            .flat_map(|path| path.iter().map(|p| (*p, "existing pipe"))),
        (s.pipe_band_min, s.pipe_band_max),
        s.height_tolerance,
    )?;
    Some(AlignmentResult::new(
        AlignmentType::Height,
        confidence,
        ctx.candidate.with_y(anchor.y),
        format!("Level with existing pipe at {:.2} ft", anchor.y),
        s.activation_threshold,
    ))
}

pub fn detect_grid(ctx: &AlignmentContext<'_>) -> Option<AlignmentResult> {
    let s = ctx.settings;
    Some(AlignmentResult::new(
        AlignmentType::Grid,
        s.grid_confidence,
        quantize(ctx.candidate, s.grid_step),
        format!("Grid {} ft", s.grid_step),
        s.activation_threshold,
    ))
}
