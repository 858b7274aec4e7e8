//! Core domain types
//!
//! This module contains the structures shared by every layer of the system.
//! The same types travel through the dispatcher whether a call is served
//! in-process or by a remote worker.

pub mod cluster;
pub mod cron;
pub mod event;
pub mod image;
pub mod log;
pub mod pipeline;
pub mod plan;
pub mod run;

pub use cluster::{Deployment, Pod, Replicas, Scaler, ServerGroup};
pub use cron::CronJobDescriptor;
pub use event::{Event, EventField};
pub use image::Image;
pub use log::{LogEntry, LogLevel};
pub use pipeline::{
    PipelineDescription, PipelineValidationError, StepDescription, StepFilter, StepType,
};
pub use plan::{DeploymentPlan, JobPlan};
pub use run::{RunReport, RunStatus};
