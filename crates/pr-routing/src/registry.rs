//! Committed pipe systems.

use std::sync::mpsc::Receiver;

use pr_core::Point3;
use pr_model::{
    CostSettings, PipeSystemConfig, ValidationError, ValidationReport, total_cost, total_length,
    validate,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{RegistryError, RegistryResult};
use crate::events::{EventBus, RegistryEvent};

/// Whether validation issues block a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    Strict,
    /// Store anyway and surface the issues as warnings.
    #[default]
    Lenient,
}

/// An immutable committed config plus quantities derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeSystem {
    config: PipeSystemConfig,
    length: f64,
    cost: f64,
    report: ValidationReport,
}

impl PipeSystem {
    fn derive(config: PipeSystemConfig, report: ValidationReport, cost: &CostSettings) -> Self {
        Self {
            length: total_length(&config.path),
            cost: total_cost(&config, cost),
            config,
            report,
        }
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn config(&self) -> &PipeSystemConfig {
        &self.config
    }

    pub fn total_length(&self) -> f64 {
        self.length
    }

    pub fn total_cost(&self) -> f64 {
        self.cost
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn positions(&self) -> Vec<Point3> {
        self.config.positions()
    }
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub imported: Vec<String>,
    /// Input index and reason for each config that was not recreated.
    pub failed: Vec<(usize, RegistryError)>,
}

/// Id-keyed set of committed systems, kept in insertion order.
#[derive(Debug, Default)]
pub struct PipeSystemRegistry {
    systems: Vec<PipeSystem>,
    cost: CostSettings,
    events: EventBus<RegistryEvent>,
}

impl PipeSystemRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cost_settings(cost: CostSettings) -> Self {
        Self {
            cost,
            ..Self::default()
        }
    }

    pub fn subscribe(&mut self) -> Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    pub fn len(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&PipeSystem> {
        self.systems.iter().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn get_all(&self) -> &[PipeSystem] {
        &self.systems
    }

    /// Validate, assign an id if missing, and store.
    ///
    /// Structural problems (too few points, bad coordinates, off-list
    /// diameter) are rejected under every policy.
    pub fn create(
        &mut self,
        mut config: PipeSystemConfig,
        policy: CommitPolicy,
    ) -> RegistryResult<&PipeSystem> {
        if config.id.is_empty() {
            config.id = uuid::Uuid::new_v4().to_string();
        }
        if self.contains(&config.id) {
            return Err(RegistryError::DuplicateId(config.id));
        }

        let report = check(&config, policy)?;
        let id = config.id.clone();
        info!(id = %id, name = %config.name, points = config.path.len(), "pipe system created");
        self.systems
            .push(PipeSystem::derive(config, report, &self.cost));
        self.events.publish(RegistryEvent::Created { id });
        Ok(&self.systems[self.systems.len() - 1])
    }

    /// Swap in a new version of an existing system (edit round trip).
    pub fn replace(
        &mut self,
        config: PipeSystemConfig,
        policy: CommitPolicy,
    ) -> RegistryResult<&PipeSystem> {
        let index = self
            .systems
            .iter()
            .position(|s| s.id() == config.id)
            .ok_or_else(|| RegistryError::UnknownId(config.id.clone()))?;

        let report = check(&config, policy)?;
        let id = config.id.clone();
        info!(id = %id, points = config.path.len(), "pipe system replaced");
        self.systems[index] = PipeSystem::derive(config, report, &self.cost);
        self.events.publish(RegistryEvent::Replaced { id });
        Ok(&self.systems[index])
    }

    /// Remove a system; `false` when the id is unknown.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.systems.len();
        self.systems.retain(|s| s.id() != id);
        let removed = self.systems.len() != before;
        if removed {
            info!(id, "pipe system removed");
            self.events.publish(RegistryEvent::Removed { id: id.to_string() });
        }
        removed
    }

    pub fn export_all(&self) -> Vec<PipeSystemConfig> {
        self.systems.iter().map(|s| s.config.clone()).collect()
    }

    /// Replace the whole registry with `configs`, leniently.
    pub fn import_all(&mut self, configs: Vec<PipeSystemConfig>) -> ImportSummary {
        self.systems.clear();
        let mut summary = ImportSummary::default();
        for (i, config) in configs.into_iter().enumerate() {
            match self.create(config, CommitPolicy::Lenient) {
                Ok(system) => summary.imported.push(system.id().to_string()),
                Err(e) => {
                    warn!(index = i, error = %e, "pipe system skipped on import");
                    summary.failed.push((i, e));
                }
            }
        }
        info!(
            imported = summary.imported.len(),
            failed = summary.failed.len(),
            "pipe systems imported"
        );
        self.events.publish(RegistryEvent::Imported {
            count: summary.imported.len(),
        });
        summary
    }

    pub fn cost_settings(&self) -> &CostSettings {
        &self.cost
    }

    /// Change fitting pricing and recompute every cached cost.
    pub fn set_cost_settings(&mut self, cost: CostSettings) {
        self.cost = cost;
        for system in &mut self.systems {
            system.cost = total_cost(&system.config, &self.cost);
        }
    }

    pub fn total_length(&self) -> f64 {
        self.systems.iter().map(PipeSystem::total_length).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.systems.iter().map(PipeSystem::total_cost).sum()
    }

    /// Centerlines of every system except `skip`, for alignment against existing pipe.
    pub fn paths_except(&self, skip: Option<&str>) -> Vec<Vec<Point3>> {
        self.systems
            .iter()
            .filter(|s| Some(s.id()) != skip)
            .map(PipeSystem::positions)
            .collect()
    }
}

fn check(config: &PipeSystemConfig, policy: CommitPolicy) -> RegistryResult<ValidationReport> {
    let report = validate(config);
    if report.valid {
        return Ok(report);
    }
    if let Some(issue) = report.errors.iter().find(|i| i.is_structural()) {
        return Err(RegistryError::Malformed(issue.clone()));
    }
    match policy {
        CommitPolicy::Strict => Err(RegistryError::Rejected(ValidationError::Failed {
            name: config.name.clone(),
            issues: report.errors,
        })),
        CommitPolicy::Lenient => {
            for issue in &report.errors {
                warn!(id = %config.id, %issue, "committing pipe system with validation issue");
            }
            Ok(report)
        }
    }
}
