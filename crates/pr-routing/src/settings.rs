//! Routing configuration.
//!
//! Every field has a default, so a settings file only lists what it changes:
//!
//! ```yaml
//! stable_frames: 4
//! alignment:
//!   grid_step: 0.25
//! fittings:
//!   elbow45_min: 35.0
//! ```

use std::path::Path;

use pr_core::{ensure_finite, ensure_positive};
use pr_model::{CostSettings, FittingThresholds, Material, SystemType};
use pr_snap::{AlignmentSettings, CatalogSettings, DEFAULT_STABLE_FRAMES};
use serde::{Deserialize, Serialize};

use crate::error::{RoutingError, RoutingResult};
use crate::registry::CommitPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutingSettings {
    pub alignment: AlignmentSettings,
    pub catalog: CatalogSettings,
    pub fittings: FittingThresholds,
    pub cost: CostSettings,
    /// Consecutive identical alignment reports before a snap is applied.
    pub stable_frames: u32,
    /// Max distance (ft) from a click to a pipe for delete/select picking.
    pub pick_radius: f64,
    pub commit_policy: CommitPolicy,
    pub default_material: Material,
    pub default_diameter: f64,
    pub default_system_type: SystemType,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            alignment: AlignmentSettings::default(),
            catalog: CatalogSettings::default(),
            fittings: FittingThresholds::default(),
            cost: CostSettings::default(),
            stable_frames: DEFAULT_STABLE_FRAMES,
            pick_radius: 1.0,
            commit_policy: CommitPolicy::Lenient,
            default_material: Material::Pex,
            default_diameter: 0.5,
            default_system_type: SystemType::ColdWater,
        }
    }
}

impl RoutingSettings {
    /// Load from a `.json` file, or YAML for any other extension.
    pub fn load(path: &Path) -> RoutingResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| RoutingError::SettingsRead {
                path: path.to_path_buf(),
                source: e,
            })?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            let settings: Self = serde_json::from_str(&content)?;
            settings.validate()?;
            Ok(settings)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    pub fn from_yaml_str(content: &str) -> RoutingResult<Self> {
        let settings: Self = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Tolerances, radii and the grid step must be positive; confidences finite.
    pub fn validate(&self) -> RoutingResult<()> {
        let a = &self.alignment;
        ensure_positive(a.level_tolerance, "alignment.level_tolerance")?;
        ensure_positive(a.plumb_tolerance, "alignment.plumb_tolerance")?;
        ensure_positive(a.height_tolerance, "alignment.height_tolerance")?;
        ensure_positive(a.grid_step, "alignment.grid_step")?;
        ensure_finite(a.grid_confidence, "alignment.grid_confidence")?;
        ensure_finite(a.activation_threshold, "alignment.activation_threshold")?;
        ensure_positive(self.catalog.long_element_threshold, "catalog.long_element_threshold")?;
        ensure_positive(self.pick_radius, "pick_radius")?;
        ensure_positive(self.default_diameter, "default_diameter")?;
        Ok(())
    }
}
