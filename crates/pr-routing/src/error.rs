//! Error types for the routing layer.

use std::path::PathBuf;

use pr_core::PrError;
use pr_model::{PathError, ValidationError, ValidationIssue};

use crate::session::RoutingMode;

pub type RoutingResult<T> = Result<T, RoutingError>;
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, thiserror::Error)]
pub enum RoutingError {
    #[error("A pipe path needs at least 2 points (has {count})")]
    TooFewPoints { count: usize },

    #[error("Operation requires {expected} mode (current mode: {actual:?})")]
    WrongMode {
        expected: &'static str,
        actual: RoutingMode,
    },

    #[error("No pipe system selected")]
    NoSystemSelected,

    #[error("Pipe system not found: {0}")]
    UnknownSystem(String),

    #[error("Unsupported diameter: {0} in")]
    UnsupportedDiameter(f64),

    #[error("Path error: {0}")]
    Path(#[from] PathError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Invalid setting: {0}")]
    Setting(#[from] PrError),

    #[error("Failed to read settings file: {path}")]
    SettingsRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("Duplicate pipe system id: {0}")]
    DuplicateId(String),

    #[error("Pipe system not found: {0}")]
    UnknownId(String),

    #[error("Rejected by validation: {0}")]
    Rejected(#[from] ValidationError),

    #[error("Malformed pipe system config: {0}")]
    Malformed(ValidationIssue),
}
