//! Standard jobs repository
//!
//! Interprets a pipeline's step graph. A walk starts at the pipeline's
//! `start` step and follows `onSuccess` or `onFailure` depending on the
//! outcome of each step until it reaches a step without the matching edge.
//! Steps of one walk run strictly one after the other.

use async_trait::async_trait;
use rollout_core::Dispatcher;
use rollout_core::domain::{
    CronJobDescriptor, DeploymentPlan, JobPlan, PipelineDescription, RunReport, RunStatus,
    StepDescription, StepType,
};
use rollout_core::dto::cluster::UpdateDeploymentRequest;
use rollout_core::procedures::cluster;
use std::collections::HashSet;
use std::sync::{Arc, Weak};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{Instrument, debug, info, warn};
use uuid::Uuid;

use super::{JobsOptions, JobsRepository};
use crate::error::{JobsError, StepError};
use crate::planner;
use crate::scheduler::{CronRegistry, expression};
use crate::service::{EventPublisher, applied_event};

/// Whether a walk only computes a plan or also executes it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkMode {
    /// Side-effect free: probes pass, the walk stops at the first apply step
    Plan,
    /// Probes are checked and apply steps update the cluster
    Run,
}

/// State carried along one walk
#[derive(Default)]
struct Walk {
    /// Plan entries accumulated since the last apply
    pending: Vec<DeploymentPlan>,
    /// Plans handed to apply so far
    applied: Vec<JobPlan>,
    /// Most recent handled step failure, reported by `logError`
    last_error: Option<String>,
    /// Step failure that ended the walk
    failure: Option<(String, StepError)>,
}

/// Jobs repository over an immutable set of pipelines
pub struct StandardJobsRepository {
    pipelines: Vec<PipelineDescription>,
    crons: CronRegistry,
    dispatcher: Arc<dyn Dispatcher>,
    events: EventPublisher,
    options: JobsOptions,
}

impl StandardJobsRepository {
    /// Creates the repository and registers one timer per scheduled pipeline
    ///
    /// # Arguments
    /// * `pipelines` - Pipeline definitions, kept in this order
    /// * `crons` - Registry receiving the timers
    /// * `dispatcher` - Call layer reaching the cluster, images and events modules
    /// * `options` - Probe, run log, clock and step budget
    ///
    /// # Errors
    /// Fails when a pipeline is malformed, a name repeats or a cron
    /// expression does not parse
    pub fn new(
        pipelines: Vec<PipelineDescription>,
        crons: CronRegistry,
        dispatcher: Arc<dyn Dispatcher>,
        options: JobsOptions,
    ) -> Result<Arc<Self>, JobsError> {
        {
            let mut names = HashSet::new();
            for pipeline in &pipelines {
                pipeline.validate()?;
                if !names.insert(pipeline.name.as_str()) {
                    return Err(JobsError::DuplicatePipeline(pipeline.name.clone()));
                }
                if let Some(cron) = &pipeline.cron {
                    expression::parse(cron)?;
                }
            }
        }

        let repo = Arc::new(Self {
            events: EventPublisher::new(Arc::clone(&dispatcher)),
            pipelines,
            crons,
            dispatcher,
            options,
        });

        for pipeline in &repo.pipelines {
            let Some(cron) = &pipeline.cron else {
                continue;
            };

            let weak: Weak<Self> = Arc::downgrade(&repo);
            let name = pipeline.name.clone();
            repo.crons.register(&pipeline.name, cron, move || {
                let weak = Weak::clone(&weak);
                let name = name.clone();
                async move {
                    if let Some(repo) = weak.upgrade() {
                        repo.run(&name).await;
                    }
                }
            })?;
        }

        info!(
            "Registered {} pipeline(s), {} scheduled",
            repo.pipelines.len(),
            repo.crons.len()
        );

        Ok(repo)
    }

    /// Runs a pipeline in its own task
    pub fn spawn_run(self: &Arc<Self>, name: &str) -> JoinHandle<RunReport> {
        let repo = Arc::clone(self);
        let name = name.to_string();
        tokio::spawn(async move { repo.run(&name).await })
    }

    /// The registry holding this repository's timers
    pub fn cron_registry(&self) -> &CronRegistry {
        &self.crons
    }

    /// Stops every cron timer
    pub fn stop(&self) {
        self.crons.stop();
    }

    fn pipeline(&self, name: &str) -> Option<&PipelineDescription> {
        self.pipelines.iter().find(|pipeline| pipeline.name == name)
    }

    // =============================================================================
    // Step graph interpreter
    // =============================================================================

    async fn walk(&self, pipeline: &PipelineDescription, mode: WalkMode) -> Walk {
        let log = &self.options.run_log;
        let mut walk = Walk::default();
        let mut visited = HashSet::new();
        let mut steps_taken = 0usize;
        let mut current = Some(pipeline.start.clone());

        while let Some(name) = current.take() {
            let Some(step) = pipeline.step(&name) else {
                warn!("Pipeline '{}' has no step '{}'", pipeline.name, name);
                break;
            };

            match mode {
                WalkMode::Plan => {
                    if step.step_type == StepType::ApplyDeployment {
                        break;
                    }
                    if !visited.insert(name.clone()) {
                        debug!("Plan walk revisits step '{}', stopping", name);
                        break;
                    }
                }
                WalkMode::Run => {
                    steps_taken += 1;
                    if steps_taken > self.options.max_steps {
                        let err = StepError::BudgetExhausted {
                            max_steps: self.options.max_steps,
                        };
                        log.warning(
                            &pipeline.name,
                            format!("Stopping run before step '{}': {}", name, err),
                        );
                        walk.failure = Some((name, err));
                        break;
                    }
                }
            }

            debug!("Executing step '{}' ({:?})", step.name, step.step_type);

            match self.execute(pipeline, step, mode, &mut walk).await {
                Ok(()) => current = step.on_success.clone(),
                Err(err) => {
                    walk.last_error = Some(format!("Step '{}' failed: {}", step.name, err));

                    match &step.on_failure {
                        Some(next) => {
                            log.warning(
                                &pipeline.name,
                                format!(
                                    "Step '{}' failed, continuing with '{}': {}",
                                    step.name, next, err
                                ),
                            );
                            current = Some(next.clone());
                        }
                        None => {
                            log.error(
                                &pipeline.name,
                                format!("Step '{}' failed: {}", step.name, err),
                            );
                            walk.failure = Some((step.name.clone(), err));
                        }
                    }
                }
            }
        }

        walk
    }

    async fn execute(
        &self,
        pipeline: &PipelineDescription,
        step: &StepDescription,
        mode: WalkMode,
        walk: &mut Walk,
    ) -> Result<(), StepError> {
        match step.step_type {
            StepType::ClusterProbe => {
                if mode == WalkMode::Plan {
                    return Ok(());
                }
                let hook = step
                    .hook
                    .as_deref()
                    .ok_or_else(|| StepError::missing(&step.name, "hook"))?;
                self.options.probe.check(hook).await
            }
            StepType::PlanImageDeployment
            | StepType::PlanClusterDeployment
            | StepType::PlanNamespaceDeployment => {
                let plans =
                    planner::plan_step(self.dispatcher.as_ref(), step, pipeline.cluster.as_deref())
                        .await?;
                debug!("Step '{}' planned {} deployment(s)", step.name, plans.len());
                walk.pending.extend(plans);
                Ok(())
            }
            StepType::ApplyDeployment => {
                let plan = JobPlan::new(&pipeline.name, std::mem::take(&mut walk.pending));
                if plan.is_empty() {
                    self.options
                        .run_log
                        .info(&pipeline.name, "Nothing to apply".to_string());
                    return Ok(());
                }

                let result = self.apply(&plan).await;
                walk.applied.push(plan);
                result
            }
            StepType::TakeSnapshot | StepType::Rollback => {
                debug!("Step '{}' ({:?}) has no effect", step.name, step.step_type);
                Ok(())
            }
            StepType::LogError => {
                let message = walk
                    .last_error
                    .clone()
                    .unwrap_or_else(|| "No step failure recorded".to_string());
                self.options.run_log.error(&pipeline.name, message);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl JobsRepository for StandardJobsRepository {
    fn list(&self) -> Vec<PipelineDescription> {
        self.pipelines.clone()
    }

    fn crons(&self) -> Vec<CronJobDescriptor> {
        self.crons.descriptors()
    }

    fn schedules(&self, name: &str) -> Option<CronJobDescriptor> {
        self.pipeline(name)?.cron.as_ref()?;
        self.crons.descriptor(name)
    }

    async fn plan(&self, name: &str) -> Result<Option<JobPlan>, StepError> {
        let Some(pipeline) = self.pipeline(name) else {
            warn!("Cannot plan unknown pipeline '{}'", name);
            return Ok(None);
        };

        let walk = self.walk(pipeline, WalkMode::Plan).await;
        if let Some((_, err)) = walk.failure {
            return Err(err);
        }

        Ok(Some(JobPlan::new(&pipeline.name, walk.pending)))
    }

    async fn run(&self, name: &str) -> RunReport {
        let Some(pipeline) = self.pipeline(name) else {
            warn!("Cannot run unknown pipeline '{}'", name);
            return RunReport::unknown(name);
        };

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("pipeline_run", pipeline = %pipeline.name, run_id = %run_id);

        async move {
            let log = &self.options.run_log;
            log.info(&pipeline.name, format!("Starting run {}", run_id));

            let walk = self.walk(pipeline, WalkMode::Run).await;
            let status = match walk.failure {
                Some((step, err)) => RunStatus::Failed {
                    step,
                    error: err.to_string(),
                },
                None => RunStatus::Completed,
            };

            log.info(&pipeline.name, format!("Run {} finished: {}", run_id, status));

            RunReport {
                run_id,
                pipeline: pipeline.name.clone(),
                status,
                applied: walk.applied,
            }
        }
        .instrument(span)
        .await
    }

    async fn apply(&self, plan: &JobPlan) -> Result<(), StepError> {
        if plan.is_empty() {
            debug!("Plan for pipeline '{}' is empty, nothing to apply", plan.name);
            return Ok(());
        }

        info!(
            "Applying {} deployment(s) for pipeline '{}'",
            plan.deployments.len(),
            plan.name
        );

        let mut updates = JoinSet::new();
        for (index, entry) in plan.deployments.iter().enumerate() {
            let dispatcher = Arc::clone(&self.dispatcher);
            let request = UpdateDeploymentRequest {
                deployment: entry.deployment.clone(),
                image: entry.image.clone(),
                group: entry.group.clone(),
            };

            updates.spawn(async move {
                let result = dispatcher.call(&cluster::UPDATE_DEPLOYMENT, &request).await;
                (index, result.map(|_| ()).map_err(|e| e.to_string()))
            });
        }

        let mut outcomes: Vec<Result<(), String>> =
            vec![Err("update task did not complete".to_string()); plan.deployments.len()];
        while let Some(joined) = updates.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = outcome,
                Err(e) => warn!("Deployment update task failed: {}", e),
            }
        }

        for (entry, outcome) in plan.deployments.iter().zip(&outcomes) {
            if let Err(e) = outcome {
                self.options.run_log.error(
                    &plan.name,
                    format!(
                        "Failed to update {} in {}: {}",
                        entry.deployment.name, entry.group, e
                    ),
                );
            }
        }

        let event = applied_event(plan, &outcomes, self.options.clock.now());
        if let Err(e) = self.events.publish(&event).await {
            warn!("Failed to publish event for pipeline '{}': {}", plan.name, e);
            self.options
                .run_log
                .warning(&plan.name, format!("Failed to publish event: {}", e));
        }

        let failed = outcomes.iter().filter(|outcome| outcome.is_err()).count();
        if failed > 0 {
            return Err(StepError::ApplyFailed {
                pipeline: plan.name.clone(),
                failed,
                total: outcomes.len(),
            });
        }

        Ok(())
    }

    fn start(&self) {
        self.crons.start();
    }
}
