//! pr-model: pipe-system schema, material data, path editing and validation.

pub mod materials;
pub mod metrics;
pub mod path;
pub mod schema;
pub mod validate;

pub use materials::MaterialProfile;
pub use metrics::{
    BillOfMaterials, CostSettings, bill_of_materials, fitting_count, support_count, total_cost,
    total_length,
};
pub use path::{FittingThresholds, PathError, PathResult, PipePath, classify_point};
pub use schema::*;
pub use validate::{
    ValidationContext, ValidationError, ValidationIssue, ValidationReport, validate,
    validate_strict, validate_with,
};

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(thiserror::Error, Debug)]
pub enum ModelError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn from_json_str(content: &str) -> ModelResult<Vec<PipeSystemConfig>> {
    Ok(serde_json::from_str(content)?)
}

pub fn to_json_string(configs: &[PipeSystemConfig]) -> ModelResult<String> {
    Ok(serde_json::to_string_pretty(configs)?)
}

pub fn load_json(path: &std::path::Path) -> ModelResult<Vec<PipeSystemConfig>> {
    let content = std::fs::read_to_string(path)?;
    from_json_str(&content)
}

pub fn save_json(path: &std::path::Path, configs: &[PipeSystemConfig]) -> ModelResult<()> {
    let content = to_json_string(configs)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_yaml(path: &std::path::Path) -> ModelResult<Vec<PipeSystemConfig>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

pub fn save_yaml(path: &std::path::Path, configs: &[PipeSystemConfig]) -> ModelResult<()> {
    let content = serde_yaml::to_string(configs)?;
    std::fs::write(path, content)?;
    Ok(())
}
