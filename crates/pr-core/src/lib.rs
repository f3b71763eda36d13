//! pr-core: shared foundation for piperoute.
//!
//! Contains:
//! - geometry (Point3 + snapping, angle and distance helpers)
//! - units (uom constructors for feet, inches, psi, fahrenheit)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact arena handles for derived render primitives)
//! - error (shared error types)

pub mod error;
pub mod geometry;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{PrError, PrResult};
pub use geometry::*;
pub use ids::*;
pub use numeric::*;
pub use units::*;
