//! Static material profiles.

use pr_core::{Pressure, Temperature, deg_f, psi};

use crate::schema::{Material, SystemType};

/// Physical and commercial properties of a pipe material.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialProfile {
    pub material: Material,
    pub display_name: &'static str,
    /// Base display color (0xRRGGBB).
    pub color: u32,
    /// Surface look for the render host; not used by routing.
    pub roughness: f64,
    pub metalness: f64,
    pub cost_per_foot: f64,
    pub max_pressure: Pressure,
    pub min_temperature: Temperature,
    pub max_temperature: Temperature,
    /// Minimum segment length around a bend, as a multiple of the nominal diameter.
    pub min_bend_radius_multiplier: f64,
    /// Recommended hanger spacing in feet.
    pub support_spacing_ft: f64,
}

impl MaterialProfile {
    /// Display color for a system of the given type.
    ///
    /// PEX and PVC are color-coded by service; other materials show their own finish.
    pub fn color_for(&self, system_type: SystemType) -> u32 {
        match (self.material, system_type) {
            (Material::Pex, SystemType::HotWater) => 0xcc_3333,
            (Material::Pex, SystemType::ColdWater) => 0x33_66cc,
            (Material::Pvc, SystemType::Waste | SystemType::Vent) => 0xf5_f5f5,
            (Material::Pvc, _) => 0xdd_dddd,
            _ => self.color,
        }
    }

    /// Minimum segment length adjacent to an interior path point.
    pub fn min_bend_length(&self, diameter: f64) -> f64 {
        diameter * self.min_bend_radius_multiplier
    }
}

impl Material {
    pub fn profile(self) -> MaterialProfile {
        match self {
            Material::Pex => MaterialProfile {
                material: self,
                display_name: "PEX",
                color: 0xe8_e8e8,
                roughness: 0.6,
                metalness: 0.0,
                cost_per_foot: 0.85,
                max_pressure: psi(160.0),
                min_temperature: deg_f(40.0),
                max_temperature: deg_f(180.0),
                min_bend_radius_multiplier: 6.0,
                support_spacing_ft: 2.67,
            },
            Material::Copper => MaterialProfile {
                material: self,
                display_name: "Copper",
                color: 0xb8_7333,
                roughness: 0.3,
                metalness: 0.9,
                cost_per_foot: 4.50,
                max_pressure: psi(400.0),
                min_temperature: deg_f(40.0),
                max_temperature: deg_f(400.0),
                min_bend_radius_multiplier: 3.0,
                support_spacing_ft: 6.0,
            },
            Material::Pvc => MaterialProfile {
                material: self,
                display_name: "PVC",
                color: 0xf5_f5f5,
                roughness: 0.5,
                metalness: 0.0,
                cost_per_foot: 1.20,
                max_pressure: psi(200.0),
                min_temperature: deg_f(40.0),
                max_temperature: deg_f(140.0),
                min_bend_radius_multiplier: 4.0,
                support_spacing_ft: 4.0,
            },
            Material::Cpvc => MaterialProfile {
                material: self,
                display_name: "CPVC",
                color: 0xf0_e68c,
                roughness: 0.5,
                metalness: 0.0,
                cost_per_foot: 1.80,
                max_pressure: psi(400.0),
                min_temperature: deg_f(40.0),
                max_temperature: deg_f(200.0),
                min_bend_radius_multiplier: 4.0,
                support_spacing_ft: 3.0,
            },
            Material::Steel => MaterialProfile {
                material: self,
                display_name: "Steel",
                color: 0x70_8090,
                roughness: 0.4,
                metalness: 0.8,
                cost_per_foot: 6.00,
                max_pressure: psi(600.0),
                min_temperature: deg_f(-20.0),
                max_temperature: deg_f(800.0),
                min_bend_radius_multiplier: 5.0,
                support_spacing_ft: 10.0,
            },
            Material::CastIron => MaterialProfile {
                material: self,
                display_name: "Cast Iron",
                color: 0x2f_2f2f,
                roughness: 0.8,
                metalness: 0.6,
                cost_per_foot: 12.00,
                max_pressure: psi(150.0),
                min_temperature: deg_f(32.0),
                max_temperature: deg_f(212.0),
                min_bend_radius_multiplier: 8.0,
                support_spacing_ft: 5.0,
            },
        }
    }
}
