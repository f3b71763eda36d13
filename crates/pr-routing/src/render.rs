//! Derived render primitives, rebuilt only when a system's structure changes.

use std::collections::HashMap;

use pr_core::{FittingId, IdAllocator, Point3, SegmentId, as_ft, inches};
use pr_model::{Fitting, Material, PathPoint, PipeSystemConfig, SystemType};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::registry::PipeSystemRegistry;
use crate::session::RoutingSession;

/// Preview color for the in-progress path.
pub const PREVIEW_COLOR: u32 = 0x33cc66;

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentPrimitive {
    pub id: SegmentId,
    pub start: Point3,
    pub end: Point3,
    /// Outer radius in feet.
    pub radius_ft: f64,
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FittingPrimitive {
    pub id: FittingId,
    pub position: Point3,
    pub fitting: Fitting,
    pub color: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SystemView {
    pub hash: String,
    pub segments: Vec<SegmentPrimitive>,
    pub fittings: Vec<FittingPrimitive>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewView {
    pub hash: String,
    pub segments: Vec<SegmentPrimitive>,
    /// Hover marker; moving it never rebuilds `segments`.
    pub cursor: Option<Point3>,
    pub applied: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    pub rebuilt: Vec<String>,
    pub unchanged: usize,
    pub removed: Vec<String>,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.rebuilt.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSync {
    Rebuilt,
    TransformOnly,
    Cleared,
    Unchanged,
}

#[derive(Serialize)]
struct Structure<'a> {
    system_type: SystemType,
    material: Material,
    diameter: f64,
    path: &'a [PathPoint],
}

/// Hash of everything that affects geometry or appearance.
///
/// Names, pressure ratings and other metadata are left out so renaming a
/// system does not rebuild its meshes.
pub fn structural_hash(
    system_type: SystemType,
    material: Material,
    diameter: f64,
    path: &[PathPoint],
) -> String {
    let structure = Structure {
        system_type,
        material,
        diameter,
        path,
    };
    let mut hasher = Sha256::new();
    let json = serde_json::to_string(&structure).unwrap_or_default();
    hasher.update(json.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn config_hash(config: &PipeSystemConfig) -> String {
    structural_hash(
        config.system_type,
        config.material,
        config.diameter,
        &config.path,
    )
}

#[derive(Debug, Default)]
pub struct RenderCache {
    views: HashMap<String, SystemView>,
    preview: Option<PreviewView>,
    ids: IdAllocator,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self, id: &str) -> Option<&SystemView> {
        self.views.get(id)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn preview(&self) -> Option<&PreviewView> {
        self.preview.as_ref()
    }

    /// Bring the views in line with the registry.
    pub fn sync(&mut self, registry: &PipeSystemRegistry) -> SyncReport {
        let mut report = SyncReport::default();

        for system in registry.get_all() {
            let config = system.config();
            let hash = config_hash(config);
            if self.views.get(system.id()).is_some_and(|v| v.hash == hash) {
                report.unchanged += 1;
                continue;
            }
            let color = config.material.profile().color_for(config.system_type);
            let positions = config.positions();
            let view = SystemView {
                segments: self.segments(&positions, config.diameter, color),
                fittings: self.fittings(&config.path, color),
                hash,
            };
            self.views.insert(system.id().to_string(), view);
            report.rebuilt.push(system.id().to_string());
        }

        let stale: Vec<String> = self
            .views
            .keys()
            .filter(|id| !registry.contains(id))
            .cloned()
            .collect();
        for id in stale {
            self.views.remove(&id);
            report.removed.push(id);
        }

        if !report.is_noop() {
            debug!(
                rebuilt = report.rebuilt.len(),
                removed = report.removed.len(),
                unchanged = report.unchanged,
                "render views synced"
            );
        }
        report
    }

    /// Update the in-progress path preview.
    pub fn sync_preview(&mut self, session: &RoutingSession) -> PreviewSync {
        let path = session.current_path();
        if !session.mode().is_routing() {
            return if self.preview.take().is_some() {
                PreviewSync::Cleared
            } else {
                PreviewSync::Unchanged
            };
        }

        let hash = structural_hash(
            session.system_type(),
            session.material(),
            session.diameter(),
            path.points(),
        );
        let cursor = session.hover().map(|h| h.position);
        let applied = session.hover().is_some_and(|h| h.applied);

        if let Some(preview) = self.preview.as_mut()
            && preview.hash == hash
        {
            if preview.cursor == cursor && preview.applied == applied {
                return PreviewSync::Unchanged;
            }
            preview.cursor = cursor;
            preview.applied = applied;
            return PreviewSync::TransformOnly;
        }

        let segments = self.segments(&path.positions(), session.diameter(), PREVIEW_COLOR);
        self.preview = Some(PreviewView {
            hash,
            segments,
            cursor,
            applied,
        });
        PreviewSync::Rebuilt
    }

    fn segments(&mut self, positions: &[Point3], diameter: f64, color: u32) -> Vec<SegmentPrimitive> {
        let radius_ft = as_ft(inches(diameter)) / 2.0;
        let mut out = Vec::with_capacity(positions.len().saturating_sub(1));
        for w in positions.windows(2) {
            let Some(id) = self.ids.allocate() else {
                warn!("render id space exhausted");
                break;
            };
            out.push(SegmentPrimitive {
                id,
                start: w[0],
                end: w[1],
                radius_ft,
                color,
            });
        }
        out
    }

    fn fittings(&mut self, path: &[PathPoint], color: u32) -> Vec<FittingPrimitive> {
        let mut out = Vec::new();
        for point in path.iter().filter(|p| !p.fitting.is_none()) {
            let Some(id) = self.ids.allocate() else {
                warn!("render id space exhausted");
                break;
            };
            out.push(FittingPrimitive {
                id,
                position: point.position(),
                fitting: point.fitting,
                color,
            });
        }
        out
    }
}
