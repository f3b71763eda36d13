//! pr-snap: snap anchors and smart alignment for interactive routing.
//!
//! Provides:
//! - Floorplan snapshot types consumed read-only from the host
//! - The snap point catalog (centers, corners, edges, ports)
//! - Ranked alignment detectors and their reducer
//! - A frame-counted stabilizer that keeps previews from flickering

pub mod alignment;
pub mod catalog;
pub mod floorplan;
pub mod stabilizer;

pub use alignment::{
    AlignmentContext, AlignmentResult, AlignmentSettings, AlignmentType, DETECTORS, Detector,
    detect_alignment, detect_with, pick_best,
};
pub use catalog::{CatalogSettings, SnapKind, SnapPoint, SnapPointCatalog};
pub use floorplan::{Dimensions, ElementCategory, FloorplanElement, FloorplanSnapshot};
pub use stabilizer::{AlignmentStabilizer, DEFAULT_STABLE_FRAMES, StabilizedPoint};
