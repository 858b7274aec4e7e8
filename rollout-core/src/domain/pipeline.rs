//! Pipeline domain types
//!
//! A pipeline is a named graph of steps. Each step names at most two
//! follow-on steps (`on_success`, `on_failure`); a missing edge ends the
//! branch.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Closed set of step behaviours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepType {
    ClusterProbe,
    PlanImageDeployment,
    PlanClusterDeployment,
    PlanNamespaceDeployment,
    ApplyDeployment,
    TakeSnapshot,
    Rollback,
    LogError,
}

/// Allow-lists narrowing what a planning step touches
///
/// An absent list matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespaces: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployments: Option<Vec<String>>,
}

impl StepFilter {
    pub fn allows_namespace(&self, namespace: Option<&str>) -> bool {
        allows(&self.namespaces, namespace)
    }

    pub fn allows_deployment(&self, deployment: &str) -> bool {
        allows(&self.deployments, Some(deployment))
    }
}

fn allows(list: &Option<Vec<String>>, value: Option<&str>) -> bool {
    match (list, value) {
        (None, _) => true,
        (Some(list), Some(value)) => list.iter().any(|entry| entry == value),
        (Some(_), None) => false,
    }
}

/// One node of a pipeline's step graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: StepType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_success: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_failure: Option<String>,

    /// Image tag to resolve (planImageDeployment, optionally planClusterDeployment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Source cluster (planClusterDeployment, planNamespaceDeployment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    /// Readiness hook url (clusterProbe)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hook: Option<String>,
    /// Source namespace (planNamespaceDeployment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Target namespace (planNamespaceDeployment)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<StepFilter>,
}

impl StepDescription {
    /// Creates a step with no edges and no parameters
    pub fn new(name: impl Into<String>, step_type: StepType) -> Self {
        Self {
            name: name.into(),
            step_type,
            on_success: None,
            on_failure: None,
            tag: None,
            cluster: None,
            hook: None,
            source: None,
            target: None,
            filter: None,
        }
    }

    pub fn on_success(mut self, step: impl Into<String>) -> Self {
        self.on_success = Some(step.into());
        self
    }

    pub fn on_failure(mut self, step: impl Into<String>) -> Self {
        self.on_failure = Some(step.into());
        self
    }

    /// Returns the step filter, or the allow-everything filter
    pub fn filter(&self) -> StepFilter {
        self.filter.clone().unwrap_or_default()
    }
}

/// A named, schedulable deployment workflow
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineDescription {
    pub name: String,
    /// Default target cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
    pub steps: Vec<StepDescription>,
    /// Name of the entry step
    pub start: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
}

/// Structural problems in a pipeline definition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineValidationError {
    #[error("pipeline name cannot be empty")]
    EmptyName,

    #[error("pipeline '{pipeline}' declares step '{step}' more than once")]
    DuplicateStep { pipeline: String, step: String },

    #[error("pipeline '{pipeline}' starts at unknown step '{step}'")]
    UnknownStart { pipeline: String, step: String },

    #[error("step '{step}' of pipeline '{pipeline}' references unknown step '{target}'")]
    UnknownEdge {
        pipeline: String,
        step: String,
        target: String,
    },
}

impl PipelineDescription {
    /// Looks up a step by name
    pub fn step(&self, name: &str) -> Option<&StepDescription> {
        self.steps.iter().find(|step| step.name == name)
    }

    /// Checks that step names are unique and every reference resolves
    pub fn validate(&self) -> Result<(), PipelineValidationError> {
        if self.name.trim().is_empty() {
            return Err(PipelineValidationError::EmptyName);
        }

        let mut names = HashSet::new();
        for step in &self.steps {
            if !names.insert(step.name.as_str()) {
                return Err(PipelineValidationError::DuplicateStep {
                    pipeline: self.name.clone(),
                    step: step.name.clone(),
                });
            }
        }

        if !names.contains(self.start.as_str()) {
            return Err(PipelineValidationError::UnknownStart {
                pipeline: self.name.clone(),
                step: self.start.clone(),
            });
        }

        for step in &self.steps {
            for target in [&step.on_success, &step.on_failure].into_iter().flatten() {
                if !names.contains(target.as_str()) {
                    return Err(PipelineValidationError::UnknownEdge {
                        pipeline: self.name.clone(),
                        step: step.name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}
