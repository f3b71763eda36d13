//! Derived quantities: length, cost, supports and bill of materials.

use std::collections::BTreeMap;

use pr_core::{Point3, distance, polyline_length};
use serde::{Deserialize, Serialize};

use crate::schema::{Fitting, Material, PathPoint, PipeSystemConfig};

/// Fitting pricing on top of the per-foot pipe cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CostSettings {
    /// Flat fee per fitting, dollars.
    pub flat_fitting_fee: f64,
    /// Additional fee per inch of diameter per fitting, dollars.
    pub per_inch_fitting_fee: f64,
}

impl Default for CostSettings {
    fn default() -> Self {
        Self {
            flat_fitting_fee: 5.0,
            per_inch_fitting_fee: 2.5,
        }
    }
}

pub fn total_length(path: &[PathPoint]) -> f64 {
    let positions: Vec<Point3> = path.iter().map(PathPoint::position).collect();
    polyline_length(&positions)
}

pub fn fitting_count(path: &[PathPoint]) -> usize {
    path.iter().filter(|p| !p.fitting.is_none()).count()
}

pub fn total_cost(config: &PipeSystemConfig, settings: &CostSettings) -> f64 {
    let profile = config.material.profile();
    let pipe = total_length(&config.path) * profile.cost_per_foot;
    let per_fitting =
        settings.flat_fitting_fee + config.diameter * settings.per_inch_fitting_fee;
    pipe + fitting_count(&config.path) as f64 * per_fitting
}

/// Hangers needed along the path: each segment gets `ceil(len / spacing)`.
pub fn support_count(config: &PipeSystemConfig) -> usize {
    let spacing = config
        .support_spacing
        .filter(|s| s.is_finite() && *s > 0.0)
        .unwrap_or_else(|| config.material.profile().support_spacing_ft);
    config
        .path
        .windows(2)
        .map(|w| {
            let len = distance(w[0].position(), w[1].position());
            (len / spacing).ceil() as usize
        })
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillOfMaterials {
    pub material: Material,
    pub diameter: f64,
    pub pipe_length_ft: f64,
    pub fittings: BTreeMap<Fitting, usize>,
    pub supports: usize,
    pub cost: f64,
}

pub fn bill_of_materials(config: &PipeSystemConfig, settings: &CostSettings) -> BillOfMaterials {
    let mut fittings = BTreeMap::new();
    for point in config.path.iter().filter(|p| !p.fitting.is_none()) {
        *fittings.entry(point.fitting).or_insert(0) += 1;
    }
    BillOfMaterials {
        material: config.material,
        diameter: config.diameter,
        pipe_length_ft: total_length(&config.path),
        fittings,
        supports: support_count(config),
        cost: total_cost(config, settings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SystemType;

    fn l_shape() -> PipeSystemConfig {
        PipeSystemConfig::new(
            "L",
            SystemType::ColdWater,
            Material::Pex,
            0.5,
            vec![
                PathPoint::new(0.0, 0.0, 0.0).with_fitting(Fitting::Cap),
                PathPoint::new(10.0, 0.0, 0.0).with_fitting(Fitting::Elbow90),
                PathPoint::new(10.0, 0.0, 5.0).with_fitting(Fitting::Cap),
            ],
        )
    }

    #[test]
    fn length_and_fittings() {
        let c = l_shape();
        assert!((total_length(&c.path) - 15.0).abs() < 1e-12);
        assert_eq!(fitting_count(&c.path), 3);
    }

    #[test]
    fn cost_adds_pipe_and_fittings() {
        let c = l_shape();
        let cost = total_cost(&c, &CostSettings::default());
        // 15 ft * 0.85 + 3 * (5.0 + 0.5 * 2.5)
        assert!((cost - (12.75 + 18.75)).abs() < 1e-9);
    }

    #[test]
    fn supports_use_material_default_spacing() {
        let mut c = l_shape();
        c.material = Material::Copper; // 6 ft
        assert_eq!(support_count(&c), 2 + 1);
        c.support_spacing = Some(2.5);
        assert_eq!(support_count(&c), 4 + 2);
    }

    #[test]
    fn bill_groups_fittings() {
        let bom = bill_of_materials(&l_shape(), &CostSettings::default());
        assert_eq!(bom.fittings.get(&Fitting::Cap), Some(&2));
        assert_eq!(bom.fittings.get(&Fitting::Elbow90), Some(&1));
        assert!(bom.fittings.get(&Fitting::Tee).is_none());
    }
}
