//! Single entry point a host drives with input events.

use pr_core::Point3;
use pr_model::{Material, PipeSystemConfig, SystemType};
use pr_snap::{FloorplanSnapshot, SnapPointCatalog};
use tracing::debug;

use crate::error::RoutingResult;
use crate::registry::{ImportSummary, PipeSystemRegistry};
use crate::render::{PreviewSync, RenderCache, SyncReport};
use crate::services::{CameraState, FloorplanProvider, PointerPosition, RayCaster};
use crate::session::{RoutingCommand, RoutingMode, RoutingSession};
use crate::settings::RoutingSettings;

#[derive(Debug, Clone, PartialEq)]
pub enum ControllerCommand {
    Start(RoutingMode),
    SelectSystem(Option<String>),
    PointerMove {
        pointer: PointerPosition,
        camera: CameraState,
    },
    Click {
        pointer: PointerPosition,
        camera: CameraState,
    },
    /// Pointer move with the ray hit already resolved.
    HoverAt(Point3),
    /// Click with the ray hit already resolved.
    ClickAt(Point3),
    Action(RoutingCommand),
    SetMaterial(Material),
    SetDiameter(f64),
    SetSystemType(SystemType),
    FloorplanChanged(FloorplanSnapshot),
    ImportSystems(Vec<PipeSystemConfig>),
}

/// What a dispatched command changed, for the host's redraw.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub views: SyncReport,
    pub preview: PreviewSync,
}

#[derive(Debug, Default)]
pub struct RoutingController {
    session: RoutingSession,
    registry: PipeSystemRegistry,
    catalog: SnapPointCatalog,
    render: RenderCache,
}

impl RoutingController {
    pub fn new(settings: RoutingSettings) -> Self {
        Self {
            registry: PipeSystemRegistry::with_cost_settings(settings.cost),
            session: RoutingSession::new(settings),
            catalog: SnapPointCatalog::new(),
            render: RenderCache::new(),
        }
    }

    pub fn session(&self) -> &RoutingSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut RoutingSession {
        &mut self.session
    }

    pub fn registry(&self) -> &PipeSystemRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PipeSystemRegistry {
        &mut self.registry
    }

    pub fn catalog(&self) -> &SnapPointCatalog {
        &self.catalog
    }

    pub fn render(&self) -> &RenderCache {
        &self.render
    }

    /// Regenerate the snap catalog from the host's floorplan.
    pub fn floorplan_changed(&mut self, provider: &dyn FloorplanProvider) {
        self.set_floorplan(&provider.snapshot());
    }

    fn set_floorplan(&mut self, snapshot: &FloorplanSnapshot) {
        self.catalog = SnapPointCatalog::generate(snapshot, &self.session.settings().catalog);
    }

    pub fn import(&mut self, configs: Vec<PipeSystemConfig>) -> ImportSummary {
        let summary = self.registry.import_all(configs);
        self.render.sync(&self.registry);
        summary
    }

    pub fn dispatch(
        &mut self,
        command: ControllerCommand,
        ray_caster: &dyn RayCaster,
    ) -> RoutingResult<Outcome> {
        debug!(?command, "dispatch");
        let session = &mut self.session;
        match command {
            ControllerCommand::Start(mode) => session.start_routing(mode, &self.registry)?,
            ControllerCommand::SelectSystem(id) => session.select_system(id),
            ControllerCommand::PointerMove { pointer, camera } => {
                session.pointer_move(pointer, &camera, ray_caster, &self.catalog, &self.registry);
            }
            ControllerCommand::Click { pointer, camera } => {
                if session.mode() == RoutingMode::Delete {
                    session.delete_at(pointer, &camera, ray_caster, &mut self.registry)?;
                } else {
                    session.commit_click(
                        pointer,
                        &camera,
                        ray_caster,
                        &self.catalog,
                        &self.registry,
                    )?;
                }
            }
            ControllerCommand::HoverAt(world) => {
                session.hover_at(world, &self.catalog, &self.registry);
            }
            ControllerCommand::ClickAt(world) => {
                if session.mode() == RoutingMode::Delete {
                    session.delete_nearest(world, &mut self.registry);
                } else {
                    session.commit_at(world, &self.catalog, &self.registry)?;
                }
            }
            ControllerCommand::Action(action) => session.apply_command(action, &mut self.registry)?,
            ControllerCommand::SetMaterial(material) => session.set_material(material),
            ControllerCommand::SetDiameter(diameter) => session.set_diameter(diameter)?,
            ControllerCommand::SetSystemType(system_type) => session.set_system_type(system_type),
            ControllerCommand::FloorplanChanged(snapshot) => self.set_floorplan(&snapshot),
            ControllerCommand::ImportSystems(configs) => {
                self.registry.import_all(configs);
            }
        }

        Ok(Outcome {
            views: self.render.sync(&self.registry),
            preview: self.render.sync_preview(&self.session),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::WorkPlane;
    use pr_snap::{Dimensions, ElementCategory, FloorplanElement};

    fn no_hit(_: PointerPosition, _: &CameraState) -> Option<Point3> {
        None
    }

    #[test]
    fn create_then_finish_syncs_views() {
        let mut c = RoutingController::default();
        c.dispatch(ControllerCommand::Start(RoutingMode::Create), &no_hit)
            .unwrap();
        c.dispatch(ControllerCommand::ClickAt(Point3::new(0.0, 9.0, 0.0)), &no_hit)
            .unwrap();
        let out = c
            .dispatch(ControllerCommand::ClickAt(Point3::new(10.0, 9.0, 0.0)), &no_hit)
            .unwrap();
        assert_eq!(out.preview, PreviewSync::Rebuilt);
        let out = c
            .dispatch(ControllerCommand::Action(RoutingCommand::FinishPath), &no_hit)
            .unwrap();
        assert_eq!(out.views.rebuilt.len(), 1);
        assert_eq!(out.preview, PreviewSync::Cleared);
        assert_eq!(c.registry().len(), 1);
    }

    #[test]
    fn pointer_click_goes_through_ray_caster() {
        let mut c = RoutingController::default();
        let plane = WorkPlane { elevation: 9.0 };
        let camera = CameraState::default();
        c.dispatch(ControllerCommand::Start(RoutingMode::Create), &plane)
            .unwrap();
        c.dispatch(
            ControllerCommand::Click {
                pointer: PointerPosition::default(),
                camera,
            },
            &plane,
        )
        .unwrap();
        let placed = c.session().current_path().points()[0].position();
        assert!((placed.y - 9.0).abs() < 1e-9);

        // a miss is a no-op
        c.dispatch(
            ControllerCommand::Click {
                pointer: PointerPosition::default(),
                camera,
            },
            &no_hit,
        )
        .unwrap();
        assert_eq!(c.session().current_path().len(), 1);
    }

    #[test]
    fn floorplan_change_rebuilds_catalog() {
        let mut c = RoutingController::default();
        assert!(c.catalog().is_empty());
        let snapshot = FloorplanSnapshot {
            elements: vec![FloorplanElement {
                id: "sink".into(),
                category: ElementCategory::Fixture,
                position: Point3::new(5.0, 3.0, 5.0),
                dimensions: Dimensions {
                    width: 2.0,
                    height: 1.0,
                    depth: 1.5,
                },
                rotation: 0.0,
                connection_ports: vec![],
            }],
        };
        c.floorplan_changed(&snapshot);
        assert_eq!(c.catalog().len(), 9);
        c.dispatch(
            ControllerCommand::FloorplanChanged(FloorplanSnapshot::default()),
            &no_hit,
        )
        .unwrap();
        assert!(c.catalog().is_empty());
    }

    #[test]
    fn delete_click_removes_system() {
        let mut c = RoutingController::default();
        c.dispatch(ControllerCommand::Start(RoutingMode::Create), &no_hit)
            .unwrap();
        c.dispatch(ControllerCommand::ClickAt(Point3::new(0.0, 9.0, 0.0)), &no_hit)
            .unwrap();
        c.dispatch(ControllerCommand::ClickAt(Point3::new(10.0, 9.0, 0.0)), &no_hit)
            .unwrap();
        c.dispatch(ControllerCommand::Action(RoutingCommand::FinishPath), &no_hit)
            .unwrap();
        c.dispatch(ControllerCommand::Start(RoutingMode::Delete), &no_hit)
            .unwrap();
        let out = c
            .dispatch(ControllerCommand::ClickAt(Point3::new(4.0, 9.2, 0.0)), &no_hit)
            .unwrap();
        assert_eq!(out.views.removed.len(), 1);
        assert!(c.registry().is_empty());
        assert!(c.render().is_empty());
    }
}
