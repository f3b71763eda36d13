//! Persisted pipe-system schema.
//!
//! The JSON shape is the interchange format used by facility floorplans:
//!
//! ```json
//! {
//!   "id": "ps-1", "name": "Cold supply", "systemType": "cold_water",
//!   "material": "pex", "diameter": 0.75,
//!   "path": [{"x": 0.0, "y": 9.0, "z": 0.0}, {"x": 10.0, "y": 9.0, "z": 0.0, "fitting": "cap"}],
//!   "pressure": 80.0, "insulated": false, "supportSpacing": 2.67
//! }
//! ```

use pr_core::Point3;
use serde::{Deserialize, Serialize};

/// Nominal pipe diameters (inches) a system may use.
pub const NOMINAL_DIAMETERS: [f64; 10] = [0.5, 0.75, 1.0, 1.25, 1.5, 2.0, 2.5, 3.0, 4.0, 6.0];

pub fn is_nominal_diameter(diameter: f64) -> bool {
    NOMINAL_DIAMETERS
        .iter()
        .any(|d| (d - diameter).abs() < 1e-9)
}

/// Diameter following `diameter` in the nominal list, wrapping around.
///
/// An off-list diameter cycles to the smallest size.
pub fn next_diameter(diameter: f64) -> f64 {
    match NOMINAL_DIAMETERS
        .iter()
        .position(|d| (d - diameter).abs() < 1e-9)
    {
        Some(i) => NOMINAL_DIAMETERS[(i + 1) % NOMINAL_DIAMETERS.len()],
        None => NOMINAL_DIAMETERS[0],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fitting {
    #[default]
    None,
    Elbow90,
    Elbow45,
    Tee,
    Cross,
    Reducer,
    Cap,
    Coupling,
}

impl Fitting {
    pub fn is_none(&self) -> bool {
        matches!(self, Fitting::None)
    }

    /// Fittings placed by hand that automatic classification must keep.
    pub fn is_manual(&self) -> bool {
        matches!(self, Fitting::Reducer | Fitting::Coupling)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemType {
    HotWater,
    ColdWater,
    Waste,
    Vent,
    Gas,
    CompressedAir,
}

impl SystemType {
    pub const ALL: [SystemType; 6] = [
        SystemType::HotWater,
        SystemType::ColdWater,
        SystemType::Waste,
        SystemType::Vent,
        SystemType::Gas,
        SystemType::CompressedAir,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            SystemType::HotWater => "Hot Water",
            SystemType::ColdWater => "Cold Water",
            SystemType::Waste => "Waste",
            SystemType::Vent => "Vent",
            SystemType::Gas => "Gas",
            SystemType::CompressedAir => "Compressed Air",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Material {
    Pex,
    Copper,
    Pvc,
    Cpvc,
    Steel,
    CastIron,
}

impl Material {
    pub const ALL: [Material; 6] = [
        Material::Pex,
        Material::Copper,
        Material::Pvc,
        Material::Cpvc,
        Material::Steel,
        Material::CastIron,
    ];

    /// Next material in [`Material::ALL`], wrapping around.
    pub fn next(self) -> Material {
        let i = Material::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Material::ALL[(i + 1) % Material::ALL.len()]
    }
}

/// A vertex of a pipe centerline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default, skip_serializing_if = "Fitting::is_none")]
    pub fitting: Fitting,
    /// Ids of pipe systems branching off at this point.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<String>,
}

impl PathPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            fitting: Fitting::None,
            connections: Vec::new(),
        }
    }

    pub fn position(&self) -> Point3 {
        Point3::new(self.x, self.y, self.z)
    }

    pub fn set_position(&mut self, p: Point3) {
        self.x = p.x;
        self.y = p.y;
        self.z = p.z;
    }

    pub fn with_fitting(mut self, fitting: Fitting) -> Self {
        self.fitting = fitting;
        self
    }
}

impl From<Point3> for PathPoint {
    fn from(p: Point3) -> Self {
        PathPoint::new(p.x, p.y, p.z)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipeSystemConfig {
    /// Empty until the registry assigns one.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub system_type: SystemType,
    pub material: Material,
    /// Nominal diameter in inches.
    pub diameter: f64,
    pub path: Vec<PathPoint>,
    /// Working pressure in psi.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insulated: Option<bool>,
    /// Hanger spacing in feet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_spacing: Option<f64>,
}

impl PipeSystemConfig {
    pub fn new(
        name: impl Into<String>,
        system_type: SystemType,
        material: Material,
        diameter: f64,
        path: Vec<PathPoint>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            system_type,
            material,
            diameter,
            path,
            pressure: None,
            insulated: None,
            support_spacing: None,
        }
    }

    pub fn positions(&self) -> Vec<Point3> {
        self.path.iter().map(PathPoint::position).collect()
    }
}
