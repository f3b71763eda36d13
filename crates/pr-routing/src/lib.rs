//! pr-routing: interactive pipe routing on top of the model and snap crates.
//!
//! Owns the session state machine, the committed-system registry and the
//! render cache. Scene ray-casting and floorplan access stay with the host
//! behind the [`RayCaster`] and [`FloorplanProvider`] traits.

pub mod controller;
pub mod error;
pub mod events;
pub mod registry;
pub mod render;
pub mod services;
pub mod session;
pub mod settings;

pub use controller::{ControllerCommand, Outcome, RoutingController};
pub use error::{RegistryError, RegistryResult, RoutingError, RoutingResult};
pub use events::{DEFAULT_EVENT_CAPACITY, EventBus, RegistryEvent, SessionEvent};
pub use registry::{CommitPolicy, ImportSummary, PipeSystem, PipeSystemRegistry};
pub use render::{
    FittingPrimitive, PreviewSync, PreviewView, RenderCache, SegmentPrimitive, SyncReport,
    SystemView, structural_hash,
};
pub use services::{CameraState, FloorplanProvider, PointerPosition, RayCaster, WorkPlane};
pub use session::{HoverPreview, RoutingCommand, RoutingMode, RoutingSession};
pub use settings::RoutingSettings;
