//! Jobs command handlers
//!
//! Lists pipelines, previews and runs them, and shows their cron schedules.

use anyhow::Result;
use colored::*;
use rollout_core::Dispatcher;
use rollout_core::domain::{CronJobDescriptor, JobPlan, RunReport, RunStatus};
use rollout_core::dto::jobs::PipelineRequest;
use rollout_core::procedures::jobs;

/// List all pipelines
pub async fn pipelines(dispatcher: &dyn Dispatcher) -> Result<()> {
    let pipelines = dispatcher.call(&jobs::PIPELINES, &()).await?;

    if pipelines.is_empty() {
        println!("{}", "No pipelines found.".yellow());
        return Ok(());
    }

    println!("{}", format!("Found {} pipeline(s):", pipelines.len()).bold());
    println!();
    for pipeline in pipelines {
        println!("  {} {}", "▸".cyan(), pipeline.name.bold());
        if let Some(cluster) = &pipeline.cluster {
            println!("    Cluster: {}", cluster);
        }
        println!("    Start:   {}", pipeline.start);
        println!("    Steps:   {}", pipeline.steps.len());
        if let Some(cron) = &pipeline.cron {
            println!("    Cron:    {}", cron.dimmed());
        }
        println!();
    }

    Ok(())
}

/// Show the plan of a pipeline
pub async fn plan(dispatcher: &dyn Dispatcher, pipeline: &str) -> Result<()> {
    let plan = dispatcher
        .call(&jobs::PLAN, &PipelineRequest::new(pipeline))
        .await?;

    match plan {
        None => println!("{}", format!("Pipeline '{}' not found.", pipeline).yellow()),
        Some(plan) if plan.is_empty() => {
            println!("{}", format!("Pipeline '{}' is up to date.", pipeline).green())
        }
        Some(plan) => print_plan(&plan),
    }

    Ok(())
}

/// Run a pipeline and report its outcome
pub async fn run(dispatcher: &dyn Dispatcher, pipeline: &str) -> Result<()> {
    let report = dispatcher
        .call(&jobs::RUN, &PipelineRequest::new(pipeline))
        .await?;

    print_report(&report);

    if let RunStatus::Failed { step, error } = &report.status {
        anyhow::bail!("Pipeline '{}' failed at step '{}': {}", pipeline, step, error);
    }

    Ok(())
}

/// Show cron schedules
pub async fn schedules(dispatcher: &dyn Dispatcher, pipeline: Option<String>) -> Result<()> {
    let crons = match pipeline {
        Some(name) => {
            let request = PipelineRequest::new(name.clone());
            match dispatcher.call(&jobs::SCHEDULES, &request).await? {
                Some(cron) => vec![cron],
                None => {
                    println!("{}", format!("Pipeline '{}' is not scheduled.", name).yellow());
                    return Ok(());
                }
            }
        }
        None => dispatcher.call(&jobs::CRONS, &()).await?,
    };

    if crons.is_empty() {
        println!("{}", "No scheduled pipelines.".yellow());
    }
    for cron in &crons {
        print_cron(cron);
    }

    Ok(())
}

fn print_plan(plan: &JobPlan) {
    println!(
        "{}",
        format!("Plan for '{}': {} update(s)", plan.name, plan.deployments.len()).bold()
    );
    for entry in &plan.deployments {
        println!(
            "  {} {} {}",
            "▸".cyan(),
            entry.group.to_string().dimmed(),
            entry.deployment.name
        );
        println!("    {} {}", "-".red(), entry.deployment.image);
        println!("    {} {}", "+".green(), entry.image);
    }
}

fn print_report(report: &RunReport) {
    let status = match &report.status {
        RunStatus::Completed => report.status.to_string().green(),
        RunStatus::Failed { .. } => report.status.to_string().red(),
        RunStatus::UnknownPipeline => report.status.to_string().yellow(),
    };

    println!("{}", "Run Details:".bold());
    println!("  ID:       {}", report.run_id.to_string().cyan());
    println!("  Pipeline: {}", report.pipeline);
    println!("  Status:   {}", status);
    println!("  Updated:  {} deployment(s)", report.deployments_applied());

    for plan in &report.applied {
        println!();
        print_plan(plan);
    }
}

fn print_cron(cron: &CronJobDescriptor) {
    let state = if cron.is_running {
        "running".green()
    } else if cron.is_started {
        "started".cyan()
    } else {
        "stopped".dimmed()
    };

    println!("  {} {} ({})", "▸".cyan(), cron.name.bold(), state);
    if let Some(last) = cron.last_run {
        println!("    Last run:  {}", last.format("%Y-%m-%d %H:%M:%S"));
    }
    for next in &cron.next_runs {
        println!("    Next run:  {}", next.format("%Y-%m-%d %H:%M:%S"));
    }
}
