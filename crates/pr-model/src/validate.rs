//! Pipe-system validation.
//!
//! Validation is advisory: it reports every problem it finds and never
//! mutates the config. Callers choose whether issues block a commit.

use pr_core::{COINCIDENT_EPSILON, as_deg_f, as_psi, deg_f, distance, psi};

use crate::schema::{PipeSystemConfig, is_nominal_diameter};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationIssue {
    #[error("Path needs at least 2 points (has {count})")]
    TooFewPoints { count: usize },

    #[error("Unsupported diameter: {diameter} in")]
    UnsupportedDiameter { diameter: f64 },

    #[error("Point {index} has a non-finite coordinate")]
    NonFinitePoint { index: usize },

    #[error("Point {index} coincides with the point before it")]
    CoincidentPoints { index: usize },

    #[error("Working pressure {pressure} psi exceeds {material} rating of {max} psi")]
    PressureExceedsRating {
        pressure: f64,
        max: f64,
        material: &'static str,
    },

    #[error(
        "Point {index}: segment of {segment_length:.2} is shorter than the minimum bend length {min_length:.2}"
    )]
    BendRadius {
        index: usize,
        segment_length: f64,
        min_length: f64,
    },

    #[error("Design temperature {temperature} °F outside {material} range {min}..{max} °F")]
    TemperatureOutOfRange {
        temperature: f64,
        min: f64,
        max: f64,
        material: &'static str,
    },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
}

impl ValidationIssue {
    /// Path point the issue refers to, if any.
    pub fn point_index(&self) -> Option<usize> {
        match self {
            ValidationIssue::NonFinitePoint { index }
            | ValidationIssue::CoincidentPoints { index }
            | ValidationIssue::BendRadius { index, .. } => Some(*index),
            _ => None,
        }
    }

    /// Issues that make the config unusable as a pipe system at all.
    ///
    /// Pressure rating, bend length and temperature range are engineering
    /// advice; everything else breaks the shape of the config.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            ValidationIssue::PressureExceedsRating { .. }
                | ValidationIssue::BendRadius { .. }
                | ValidationIssue::TemperatureOutOfRange { .. }
        )
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Pipe system '{name}' failed validation: {}", .issues.first().map(ToString::to_string).unwrap_or_default())]
    Failed {
        name: String,
        issues: Vec<ValidationIssue>,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }
}

/// Extra operating conditions not stored on the config itself.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ValidationContext {
    /// Design fluid temperature in °F.
    pub design_temperature_f: Option<f64>,
}

pub fn validate(config: &PipeSystemConfig) -> ValidationReport {
    validate_with(config, &ValidationContext::default())
}

pub fn validate_with(config: &PipeSystemConfig, ctx: &ValidationContext) -> ValidationReport {
    let profile = config.material.profile();
    let mut issues = Vec::new();

    if config.path.len() < 2 {
        issues.push(ValidationIssue::TooFewPoints {
            count: config.path.len(),
        });
    }

    if !config.diameter.is_finite() || config.diameter <= 0.0 {
        issues.push(ValidationIssue::InvalidValue {
            field: "diameter",
            value: config.diameter,
            reason: "must be positive and finite",
        });
    } else if !is_nominal_diameter(config.diameter) {
        issues.push(ValidationIssue::UnsupportedDiameter {
            diameter: config.diameter,
        });
    }

    let positions = config.positions();
    let mut geometry_ok = true;
    for (i, p) in positions.iter().enumerate() {
        if !p.is_finite() {
            issues.push(ValidationIssue::NonFinitePoint { index: i });
            geometry_ok = false;
        } else if i > 0 && distance(positions[i - 1], *p) <= COINCIDENT_EPSILON {
            issues.push(ValidationIssue::CoincidentPoints { index: i });
        }
    }

    if let Some(pressure) = config.pressure {
        if !pressure.is_finite() || pressure < 0.0 {
            issues.push(ValidationIssue::InvalidValue {
                field: "pressure",
                value: pressure,
                reason: "must be non-negative and finite",
            });
        } else if psi(pressure) > profile.max_pressure {
            issues.push(ValidationIssue::PressureExceedsRating {
                pressure,
                max: as_psi(profile.max_pressure),
                material: profile.display_name,
            });
        }
    }

    if let Some(spacing) = config.support_spacing
        && (!spacing.is_finite() || spacing <= 0.0)
    {
        issues.push(ValidationIssue::InvalidValue {
            field: "supportSpacing",
            value: spacing,
            reason: "must be positive and finite",
        });
    }

    if let Some(t) = ctx.design_temperature_f {
        let temperature = deg_f(t);
        if temperature < profile.min_temperature || temperature > profile.max_temperature {
            issues.push(ValidationIssue::TemperatureOutOfRange {
                temperature: t,
                min: as_deg_f(profile.min_temperature),
                max: as_deg_f(profile.max_temperature),
                material: profile.display_name,
            });
        }
    }

    if geometry_ok && config.diameter.is_finite() && config.diameter > 0.0 {
        let min_length = profile.min_bend_length(config.diameter);
        for i in 1..positions.len().saturating_sub(1) {
            let before = distance(positions[i - 1], positions[i]);
            let after = distance(positions[i], positions[i + 1]);
            let shortest = before.min(after);
            if shortest < min_length {
                issues.push(ValidationIssue::BendRadius {
                    index: i,
                    segment_length: shortest,
                    min_length,
                });
            }
        }
    }

    ValidationReport::from_issues(issues)
}

/// Validation that fails on any issue.
pub fn validate_strict(config: &PipeSystemConfig) -> Result<(), ValidationError> {
    let report = validate(config);
    if report.valid {
        Ok(())
    } else {
        Err(ValidationError::Failed {
            name: config.name.clone(),
            issues: report.errors,
        })
    }
}
