//! Frame-counted debouncing of alignment corrections.

use pr_core::Point3;

use crate::alignment::{AlignmentResult, AlignmentType};

pub const DEFAULT_STABLE_FRAMES: u32 = 3;

/// Outcome of feeding one pointer-move tick through the stabilizer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizedPoint {
    /// Where the preview should be drawn.
    pub position: Point3,
    /// `true` once the snap correction has been applied.
    pub applied: bool,
    pub alignment_type: AlignmentType,
    /// Consecutive ticks the current alignment type has been reported.
    pub streak: u32,
}

/// Holds back snap corrections until one alignment type has been reported
/// for `required_frames` consecutive ticks.
///
/// Counting is per call, not per wall-clock interval. The streak restarts
/// whenever the reported type changes.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentStabilizer {
    required_frames: u32,
    last_type: Option<AlignmentType>,
    streak: u32,
}

impl Default for AlignmentStabilizer {
    fn default() -> Self {
        Self::new(DEFAULT_STABLE_FRAMES)
    }
}

impl AlignmentStabilizer {
    pub fn new(required_frames: u32) -> Self {
        Self {
            required_frames,
            last_type: None,
            streak: 0,
        }
    }

    pub fn required_frames(&self) -> u32 {
        self.required_frames
    }

    pub fn reset(&mut self) {
        self.last_type = None;
        self.streak = 0;
    }

    /// Record `result` and return the point to preview: the snap position
    /// once stable, `raw` until then.
    pub fn observe(&mut self, result: &AlignmentResult, raw: Point3) -> StabilizedPoint {
        if self.last_type == Some(result.alignment_type) {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.last_type = Some(result.alignment_type);
            self.streak = 1;
        }

        let applied = result.is_aligned && self.streak >= self.required_frames;
        StabilizedPoint {
            position: if applied { result.snap_position } else { raw },
            applied,
            alignment_type: result.alignment_type,
            streak: self.streak,
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn kind(i: u8) -> AlignmentType {
        match i % 4 {
            0 => AlignmentType::Horizontal,
            1 => AlignmentType::Vertical,
            2 => AlignmentType::Height,
            _ => AlignmentType::Grid,
        }
    }

    proptest! {
        #[test]
        fn applied_only_after_required_run(
            kinds in prop::collection::vec(0u8..4, 1..40),
            required in 1u32..6,
        ) {
            let mut stab = AlignmentStabilizer::new(required);
            let raw = Point3::new(0.3, 0.3, 0.3);
            let mut run = 0u32;
            let mut last = None;
            for k in kinds {
                let t = kind(k);
                run = if last == Some(t) { run + 1 } else { 1 };
                last = Some(t);
                let r = AlignmentResult::new(t, 0.9, Point3::ORIGIN, "", 0.7);
                let out = stab.observe(&r, raw);
                prop_assert_eq!(out.streak, run);
                prop_assert_eq!(out.applied, run >= required);
                if !out.applied {
                    prop_assert_eq!(out.position, raw);
                }
            }
        }
    }
}
