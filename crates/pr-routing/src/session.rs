//! Interactive routing session: the state machine behind the pipe tool.
//!
//! ```text
//! view --start(create)--> create --finish/cancel--> view
//! view --start(edit)----> edit   --finish/cancel--> view
//! view --start(delete)--> delete (each click removes one system)
//! ```

use std::sync::mpsc::Receiver;

use pr_core::{Point3, distance_to_segment, quantize};
use pr_model::{
    Material, PathPoint, PipePath, PipeSystemConfig, SystemType, is_nominal_diameter,
    next_diameter,
};
use pr_snap::{
    AlignmentContext, AlignmentResult, AlignmentStabilizer, SnapPointCatalog,
    detect_alignment,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{RoutingError, RoutingResult};
use crate::events::{EventBus, SessionEvent};
use crate::registry::PipeSystemRegistry;
use crate::services::{CameraState, PointerPosition, RayCaster};
use crate::settings::RoutingSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingMode {
    #[default]
    View,
    Create,
    Edit,
    Delete,
}

impl RoutingMode {
    pub fn is_routing(self) -> bool {
        matches!(self, RoutingMode::Create | RoutingMode::Edit)
    }
}

/// The five user-invocable actions, bindable to any input scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingCommand {
    FinishPath,
    CancelPath,
    RemoveLastPoint,
    CycleMaterial,
    CycleDiameter,
}

/// Where the next point would land if the user clicked now.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverPreview {
    /// Grid-quantized ray hit.
    pub raw: Point3,
    /// `raw`, or the snap position once the alignment is stable.
    pub position: Point3,
    pub alignment: AlignmentResult,
    pub applied: bool,
}

#[derive(Debug)]
pub struct RoutingSession {
    settings: RoutingSettings,
    mode: RoutingMode,
    current_path: PipePath,
    hover: Option<HoverPreview>,
    material: Material,
    diameter: f64,
    system_type: SystemType,
    selected_system_id: Option<String>,
    editing_system_id: Option<String>,
    stabilizer: AlignmentStabilizer,
    events: EventBus<SessionEvent>,
}

impl Default for RoutingSession {
    fn default() -> Self {
        Self::new(RoutingSettings::default())
    }
}

impl RoutingSession {
    pub fn new(settings: RoutingSettings) -> Self {
        Self {
            mode: RoutingMode::View,
            current_path: PipePath::with_thresholds(settings.fittings),
            hover: None,
            material: settings.default_material,
            diameter: settings.default_diameter,
            system_type: settings.default_system_type,
            selected_system_id: None,
            editing_system_id: None,
            stabilizer: AlignmentStabilizer::new(settings.stable_frames),
            events: EventBus::new(),
            settings,
        }
    }

    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn settings(&self) -> &RoutingSettings {
        &self.settings
    }

    pub fn mode(&self) -> RoutingMode {
        self.mode
    }

    pub fn current_path(&self) -> &PipePath {
        &self.current_path
    }

    pub fn hover(&self) -> Option<&HoverPreview> {
        self.hover.as_ref()
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    pub fn system_type(&self) -> SystemType {
        self.system_type
    }

    pub fn selected_system_id(&self) -> Option<&str> {
        self.selected_system_id.as_deref()
    }

    pub fn editing_system_id(&self) -> Option<&str> {
        self.editing_system_id.as_deref()
    }

    /// Choose the system the next `start_routing(Edit)` loads.
    pub fn select_system(&mut self, id: Option<String>) {
        self.selected_system_id = id;
    }

    /// Enter `mode`, discarding any in-progress path.
    ///
    /// Edit mode loads a copy of the selected system, including its
    /// material, diameter and system type.
    pub fn start_routing(
        &mut self,
        mode: RoutingMode,
        registry: &PipeSystemRegistry,
    ) -> RoutingResult<()> {
        let mut path = PipePath::with_thresholds(self.settings.fittings);
        let mut editing = None;

        if mode == RoutingMode::Edit {
            let id = self
                .selected_system_id
                .clone()
                .ok_or(RoutingError::NoSystemSelected)?;
            let system = registry
                .get(&id)
                .ok_or_else(|| RoutingError::UnknownSystem(id.clone()))?;
            let config = system.config();
            path = PipePath::from_points(config.path.clone(), self.settings.fittings, true)?;
            self.material = config.material;
            self.diameter = config.diameter;
            self.system_type = config.system_type;
            editing = Some(id);
        }

        self.current_path = path;
        self.editing_system_id = editing;
        self.clear_transient();
        self.set_mode(mode);
        Ok(())
    }

    /// Pointer moved: ray-cast, quantize, detect alignment, update the preview.
    ///
    /// A ray miss, or a mode that is not routing, leaves the session untouched.
    pub fn pointer_move(
        &mut self,
        pointer: PointerPosition,
        camera: &CameraState,
        ray_caster: &dyn RayCaster,
        catalog: &SnapPointCatalog,
        registry: &PipeSystemRegistry,
    ) -> Option<&HoverPreview> {
        if !self.mode.is_routing() {
            return None;
        }
        let hit = ray_caster.cast_ray(pointer, camera)?;
        self.hover_at(hit, catalog, registry)
    }

    /// Preview update for a world-space point (the ray hit).
    pub fn hover_at(
        &mut self,
        world: Point3,
        catalog: &SnapPointCatalog,
        registry: &PipeSystemRegistry,
    ) -> Option<&HoverPreview> {
        if !self.mode.is_routing() || !world.is_finite() {
            return None;
        }
        let raw = quantize(world, self.settings.alignment.grid_step);
        let current = self.current_path.positions();
        let existing = registry.paths_except(self.editing_system_id.as_deref());
        let ctx = AlignmentContext {
            candidate: raw,
            current_path: &current,
            existing_paths: &existing,
            snap_points: catalog.points(),
            settings: &self.settings.alignment,
        };
        let alignment = detect_alignment(&ctx);
        let stable = self.stabilizer.observe(&alignment, raw);

        let previous_type = self.hover.as_ref().map(|h| h.alignment.alignment_type);
        if previous_type != Some(alignment.alignment_type) {
            self.events.publish(SessionEvent::AlignmentChanged {
                alignment: alignment.alignment_type,
            });
        }
        self.events.publish(SessionEvent::PreviewUpdated {
            position: stable.position,
            applied: stable.applied,
        });

        self.hover = Some(HoverPreview {
            raw,
            position: stable.position,
            alignment,
            applied: stable.applied,
        });
        self.hover.as_ref()
    }

    /// Click: append the previewed point for the pointer position.
    ///
    /// Returns `Ok(None)` when the ray misses.
    pub fn commit_click(
        &mut self,
        pointer: PointerPosition,
        camera: &CameraState,
        ray_caster: &dyn RayCaster,
        catalog: &SnapPointCatalog,
        registry: &PipeSystemRegistry,
    ) -> RoutingResult<Option<Point3>> {
        self.require_routing()?;
        let Some(hit) = ray_caster.cast_ray(pointer, camera) else {
            return Ok(None);
        };
        self.commit_at(hit, catalog, registry).map(Some)
    }

    /// Click at a world-space point (the ray hit).
    pub fn commit_at(
        &mut self,
        world: Point3,
        catalog: &SnapPointCatalog,
        registry: &PipeSystemRegistry,
    ) -> RoutingResult<Point3> {
        self.require_routing()?;
        let position = self
            .hover_at(world, catalog, registry)
            .map(|h| h.position)
            .unwrap_or(world);
        self.current_path.append(position)?;

        let index = self.current_path.len() - 1;
        debug!(index, x = position.x, y = position.y, z = position.z, "point committed");
        self.events
            .publish(SessionEvent::PointCommitted { index, position });
        self.stabilizer.reset();
        Ok(position)
    }

    /// Package the path into a pipe system and hand it to the registry.
    ///
    /// Fewer than two points, or a strict-policy rejection, leaves the
    /// session exactly as it was.
    pub fn finish(&mut self, registry: &mut PipeSystemRegistry) -> RoutingResult<String> {
        self.require_routing()?;
        let count = self.current_path.len();
        if count < 2 {
            return Err(RoutingError::TooFewPoints { count });
        }

        let mut path = self.current_path.clone();
        path.classify_all(true);
        let profile = self.material.profile();
        let mut config = PipeSystemConfig::new(
            format!("{} {}", self.system_type.display_name(), registry.len() + 1),
            self.system_type,
            self.material,
            self.diameter,
            path.into_points(),
        );
        config.support_spacing = Some(profile.support_spacing_ft);
        config.insulated = Some(self.system_type == SystemType::HotWater);

        let policy = self.settings.commit_policy;
        let id = match self.editing_system_id.clone() {
            Some(id) => {
                if let Some(existing) = registry.get(&id) {
                    let existing = existing.config();
                    config.name = existing.name.clone();
                    config.pressure = existing.pressure;
                    config.insulated = existing.insulated;
                }
                config.id = id;
                registry.replace(config, policy)?.id().to_string()
            }
            None => registry.create(config, policy)?.id().to_string(),
        };

        debug!(id = %id, points = count, "path finished");
        self.events.publish(SessionEvent::PathFinished {
            system_id: id.clone(),
        });
        self.reset_to_view();
        Ok(id)
    }

    /// Abort the in-progress path without committing anything.
    pub fn cancel(&mut self) {
        if self.mode.is_routing() {
            self.events.publish(SessionEvent::PathCancelled);
        }
        self.reset_to_view();
    }

    /// Pop the tail of the in-progress path; `None` when it is empty.
    pub fn remove_last_point(&mut self) -> Option<PathPoint> {
        let removed = self.current_path.remove_last()?;
        self.events.publish(SessionEvent::PointRemoved {
            index: self.current_path.len(),
        });
        self.hover = None;
        self.stabilizer.reset();
        Some(removed)
    }

    pub fn insert_point(&mut self, index: usize, point: Point3) -> RoutingResult<()> {
        self.require_routing()?;
        self.current_path.insert(index, point)?;
        self.events.publish(SessionEvent::PointCommitted {
            index,
            position: point,
        });
        Ok(())
    }

    pub fn remove_point(&mut self, index: usize) -> RoutingResult<PathPoint> {
        self.require_routing()?;
        let removed = self.current_path.remove_at(index)?;
        self.events.publish(SessionEvent::PointRemoved { index });
        Ok(removed)
    }

    pub fn move_point(&mut self, index: usize, point: Point3) -> RoutingResult<()> {
        self.require_routing()?;
        self.current_path.move_to(index, point)?;
        Ok(())
    }

    /// Takes effect on the next `finish`; placed points are not revisited.
    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn set_diameter(&mut self, diameter: f64) -> RoutingResult<()> {
        if !is_nominal_diameter(diameter) {
            return Err(RoutingError::UnsupportedDiameter(diameter));
        }
        self.diameter = diameter;
        Ok(())
    }

    pub fn set_system_type(&mut self, system_type: SystemType) {
        self.system_type = system_type;
    }

    pub fn cycle_material(&mut self) -> Material {
        self.material = self.material.next();
        self.material
    }

    pub fn cycle_diameter(&mut self) -> f64 {
        self.diameter = next_diameter(self.diameter);
        self.diameter
    }

    /// Dispatch one of the named keyboard actions.
    pub fn apply_command(
        &mut self,
        command: RoutingCommand,
        registry: &mut PipeSystemRegistry,
    ) -> RoutingResult<()> {
        match command {
            RoutingCommand::FinishPath => self.finish(registry).map(|_| ()),
            RoutingCommand::CancelPath => {
                self.cancel();
                Ok(())
            }
            RoutingCommand::RemoveLastPoint => {
                self.remove_last_point();
                Ok(())
            }
            RoutingCommand::CycleMaterial => {
                self.cycle_material();
                Ok(())
            }
            RoutingCommand::CycleDiameter => {
                self.cycle_diameter();
                Ok(())
            }
        }
    }

    /// Id of the committed system nearest `world`, within the pick radius.
    pub fn pick_system(&self, world: Point3, registry: &PipeSystemRegistry) -> Option<String> {
        let mut best: Option<(f64, &str)> = None;
        for system in registry.get_all() {
            let points = system.positions();
            let d = points
                .windows(2)
                .map(|w| distance_to_segment(world, w[0], w[1]))
                .fold(f64::INFINITY, f64::min);
            if d <= self.settings.pick_radius && best.is_none_or(|(bd, _)| d < bd) {
                best = Some((d, system.id()));
            }
        }
        best.map(|(_, id)| id.to_string())
    }

    /// Delete-mode click: remove the system under the pointer.
    pub fn delete_at(
        &mut self,
        pointer: PointerPosition,
        camera: &CameraState,
        ray_caster: &dyn RayCaster,
        registry: &mut PipeSystemRegistry,
    ) -> RoutingResult<Option<String>> {
        if self.mode != RoutingMode::Delete {
            return Err(RoutingError::WrongMode {
                expected: "delete",
                actual: self.mode,
            });
        }
        let Some(hit) = ray_caster.cast_ray(pointer, camera) else {
            return Ok(None);
        };
        Ok(self.delete_nearest(hit, registry))
    }

    pub fn delete_nearest(
        &mut self,
        world: Point3,
        registry: &mut PipeSystemRegistry,
    ) -> Option<String> {
        let id = self.pick_system(world, registry)?;
        if registry.remove(&id) {
            if self.selected_system_id.as_deref() == Some(id.as_str()) {
                self.selected_system_id = None;
            }
            Some(id)
        } else {
            None
        }
    }

    fn require_routing(&self) -> RoutingResult<()> {
        if self.mode.is_routing() {
            Ok(())
        } else {
            Err(RoutingError::WrongMode {
                expected: "create or edit",
                actual: self.mode,
            })
        }
    }

    fn clear_transient(&mut self) {
        self.hover = None;
        self.stabilizer.reset();
    }

    fn reset_to_view(&mut self) {
        self.current_path = PipePath::with_thresholds(self.settings.fittings);
        self.editing_system_id = None;
        self.clear_transient();
        self.set_mode(RoutingMode::View);
    }

    fn set_mode(&mut self, mode: RoutingMode) {
        if self.mode != mode {
            debug!(from = ?self.mode, to = ?mode, "routing mode changed");
            self.events.publish(SessionEvent::ModeChanged {
                from: self.mode,
                to: mode,
            });
        }
        self.mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::CommitPolicy;
    use pr_model::Fitting;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn creating() -> (RoutingSession, PipeSystemRegistry, SnapPointCatalog) {
        let mut session = RoutingSession::default();
        let registry = PipeSystemRegistry::new();
        session.start_routing(RoutingMode::Create, &registry).unwrap();
        (session, registry, SnapPointCatalog::new())
    }

    #[test]
    fn finish_needs_two_points() {
        let (mut session, mut registry, catalog) = creating();
        session.commit_at(p(0.0, 9.0, 0.0), &catalog, &registry).unwrap();
        assert!(matches!(
            session.finish(&mut registry),
            Err(RoutingError::TooFewPoints { count: 1 })
        ));
        assert_eq!(session.mode(), RoutingMode::Create);
        assert_eq!(session.current_path().len(), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn cancel_discards_everything() {
        let (mut session, registry, catalog) = creating();
        session.commit_at(p(0.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session.commit_at(p(10.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session.cancel();
        assert_eq!(session.mode(), RoutingMode::View);
        assert!(session.current_path().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn remove_last_point_on_empty_is_noop() {
        let (mut session, _, _) = creating();
        assert!(session.remove_last_point().is_none());
    }

    #[test]
    fn undo_clears_the_hover_preview() {
        let (mut session, registry, catalog) = creating();
        session.commit_at(p(0.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session.commit_at(p(10.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session.hover_at(p(20.0, 9.0, 5.0), &catalog, &registry).unwrap();
        assert!(session.hover().is_some());

        let events = session.subscribe();
        session.remove_last_point().unwrap();
        assert!(session.hover().is_none());

        session.hover_at(p(20.0, 9.0, 5.0), &catalog, &registry).unwrap();
        assert!(
            events
                .try_iter()
                .any(|e| matches!(e, SessionEvent::AlignmentChanged { .. }))
        );
    }

    #[test]
    fn clicks_outside_routing_modes_are_rejected() {
        let mut session = RoutingSession::default();
        let registry = PipeSystemRegistry::new();
        let err = session
            .commit_at(p(0.0, 0.0, 0.0), &SnapPointCatalog::new(), &registry)
            .unwrap_err();
        assert!(matches!(err, RoutingError::WrongMode { .. }));
    }

    #[test]
    fn ray_miss_is_a_noop() {
        let (mut session, registry, catalog) = creating();
        let miss = |_: PointerPosition, _: &CameraState| -> Option<Point3> { None };
        let camera = CameraState::default();
        assert!(
            session
                .pointer_move(PointerPosition::default(), &camera, &miss, &catalog, &registry)
                .is_none()
        );
        let committed = session
            .commit_click(PointerPosition::default(), &camera, &miss, &catalog, &registry)
            .unwrap();
        assert!(committed.is_none());
        assert!(session.current_path().is_empty());
    }

    #[test]
    fn material_change_applies_on_finish_only() {
        let (mut session, mut registry, catalog) = creating();
        session.commit_at(p(0.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session.set_material(Material::Copper);
        session.commit_at(p(10.0, 9.0, 0.0), &catalog, &registry).unwrap();
        let id = session.finish(&mut registry).unwrap();
        assert_eq!(registry.get(&id).unwrap().config().material, Material::Copper);
    }

    #[test]
    fn unsupported_diameter_is_rejected() {
        let mut session = RoutingSession::default();
        assert!(session.set_diameter(0.6).is_err());
        assert!(session.set_diameter(2.0).is_ok());
        assert_eq!(session.cycle_diameter(), 2.5);
    }

    #[test]
    fn keyboard_commands_dispatch() {
        let (mut session, mut registry, catalog) = creating();
        session.commit_at(p(0.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session.commit_at(p(8.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session
            .apply_command(RoutingCommand::RemoveLastPoint, &mut registry)
            .unwrap();
        assert_eq!(session.current_path().len(), 1);
        session
            .apply_command(RoutingCommand::CycleMaterial, &mut registry)
            .unwrap();
        assert_eq!(session.material(), Material::Copper);
        assert!(
            session
                .apply_command(RoutingCommand::FinishPath, &mut registry)
                .is_err()
        );
        session
            .apply_command(RoutingCommand::CancelPath, &mut registry)
            .unwrap();
        assert_eq!(session.mode(), RoutingMode::View);
    }

    #[test]
    fn edit_round_trip_replaces_system() {
        let (mut session, mut registry, catalog) = creating();
        session.commit_at(p(0.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session.commit_at(p(10.0, 9.0, 0.0), &catalog, &registry).unwrap();
        let id = session.finish(&mut registry).unwrap();

        session.select_system(Some(id.clone()));
        session.start_routing(RoutingMode::Edit, &registry).unwrap();
        assert_eq!(session.editing_system_id(), Some(id.as_str()));
        assert_eq!(session.current_path().len(), 2);
        session.insert_point(1, p(5.0, 9.0, 5.0)).unwrap();
        let same = session.finish(&mut registry).unwrap();

        assert_eq!(same, id);
        assert_eq!(registry.len(), 1);
        let path = &registry.get(&id).unwrap().config().path;
        assert_eq!(path.len(), 3);
        assert_eq!(path[0].fitting, Fitting::Cap);
        assert_eq!(path[1].fitting, Fitting::Elbow90);
    }

    #[test]
    fn edit_without_selection_fails() {
        let mut session = RoutingSession::default();
        let registry = PipeSystemRegistry::new();
        assert!(matches!(
            session.start_routing(RoutingMode::Edit, &registry),
            Err(RoutingError::NoSystemSelected)
        ));
        session.select_system(Some("ghost".into()));
        assert!(matches!(
            session.start_routing(RoutingMode::Edit, &registry),
            Err(RoutingError::UnknownSystem(_))
        ));
        assert_eq!(session.mode(), RoutingMode::View);
    }

    #[test]
    fn delete_mode_removes_nearest_system() {
        let (mut session, mut registry, catalog) = creating();
        session.commit_at(p(0.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session.commit_at(p(10.0, 9.0, 0.0), &catalog, &registry).unwrap();
        let id = session.finish(&mut registry).unwrap();

        session.start_routing(RoutingMode::Delete, &registry).unwrap();
        let far = |_: PointerPosition, _: &CameraState| Some(Point3::new(5.0, 20.0, 0.0));
        let near = |_: PointerPosition, _: &CameraState| Some(Point3::new(5.0, 9.5, 0.0));
        let camera = CameraState::default();
        assert_eq!(
            session
                .delete_at(PointerPosition::default(), &camera, &far, &mut registry)
                .unwrap(),
            None
        );
        assert_eq!(
            session
                .delete_at(PointerPosition::default(), &camera, &near, &mut registry)
                .unwrap(),
            Some(id)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn strict_rejection_keeps_session() {
        let settings = RoutingSettings {
            commit_policy: CommitPolicy::Strict,
            ..RoutingSettings::default()
        };
        let mut session = RoutingSession::new(settings);
        let mut registry = PipeSystemRegistry::new();
        let catalog = SnapPointCatalog::new();
        session.start_routing(RoutingMode::Create, &registry).unwrap();
        // pex 0.5": bend segments must be >= 3 ft
        session.commit_at(p(0.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session.commit_at(p(1.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session.commit_at(p(1.0, 9.0, 10.0), &catalog, &registry).unwrap();
        assert!(matches!(
            session.finish(&mut registry),
            Err(RoutingError::Registry(_))
        ));
        assert_eq!(session.mode(), RoutingMode::Create);
        assert_eq!(session.current_path().len(), 3);
    }

    #[test]
    fn events_follow_the_session() {
        let (mut session, mut registry, catalog) = creating();
        let rx = session.subscribe();
        session.commit_at(p(0.0, 9.0, 0.0), &catalog, &registry).unwrap();
        session.commit_at(p(10.0, 9.0, 0.0), &catalog, &registry).unwrap();
        let id = session.finish(&mut registry).unwrap();
        let events: Vec<_> = rx.try_iter().collect();
        assert!(events.contains(&SessionEvent::PathFinished { system_id: id }));
        assert!(events.contains(&SessionEvent::ModeChanged {
            from: RoutingMode::Create,
            to: RoutingMode::View,
        }));
        assert_eq!(
            events
                .iter()
                .filter(|e| matches!(e, SessionEvent::PointCommitted { .. }))
                .count(),
            2
        );
    }
}
