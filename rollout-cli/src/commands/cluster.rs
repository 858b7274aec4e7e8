//! Cluster command handlers
//!
//! Walks every server group of the selected clusters and prints its pods,
//! deployments or scalers.

use anyhow::Result;
use colored::*;
use rollout_core::Dispatcher;
use rollout_core::domain::{Pod, Replicas, Scaler, ServerGroup};
use rollout_core::dto::cluster::{GroupRequest, NamespacesRequest};
use rollout_core::procedures::cluster;

/// Pods restarting more than this are flagged
const RESTART_ALARM: u32 = 30;
/// Pods restarting more than this are highlighted
const RESTART_WARNING: u32 = 10;

/// How prominently a value is printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Highlight {
    Alarm,
    Warning,
    Normal,
}

fn restart_highlight(restarts: u32) -> Highlight {
    if restarts > RESTART_ALARM {
        Highlight::Alarm
    } else if restarts > RESTART_WARNING {
        Highlight::Warning
    } else {
        Highlight::Normal
    }
}

fn scaler_highlight(replicas: &Replicas) -> Highlight {
    if replicas.current < replicas.minimum {
        Highlight::Alarm
    } else if replicas.current >= replicas.maximum {
        Highlight::Warning
    } else {
        Highlight::Normal
    }
}

/// Server groups of the selected clusters
///
/// A cluster without namespaces is a single cluster-wide group.
async fn groups(dispatcher: &dyn Dispatcher, only: Option<String>) -> Result<Vec<ServerGroup>> {
    let clusters = match only {
        Some(name) => vec![name],
        None => dispatcher.call(&cluster::CLUSTERS, &()).await?,
    };

    let mut groups = Vec::new();
    for name in clusters {
        let request = NamespacesRequest {
            cluster: name.clone(),
        };
        let namespaces = dispatcher.call(&cluster::NAMESPACES, &request).await?;

        if namespaces.is_empty() {
            groups.push(ServerGroup::cluster(name));
        } else {
            groups.extend(
                namespaces
                    .into_iter()
                    .map(|namespace| ServerGroup::new(name.clone(), Some(namespace))),
            );
        }
    }

    Ok(groups)
}

fn print_group_header(group: &ServerGroup) {
    println!("{}", group.to_string().bold());
}

/// List pods of every group
pub async fn pods(dispatcher: &dyn Dispatcher, only: Option<String>) -> Result<()> {
    for group in groups(dispatcher, only).await? {
        let pods = dispatcher
            .call(&cluster::PODS, &GroupRequest::from(&group))
            .await?;
        if pods.is_empty() {
            continue;
        }

        print_group_header(&group);
        for pod in &pods {
            print_pod(pod);
        }
        println!();
    }

    Ok(())
}

fn print_pod(pod: &Pod) {
    let restarts = pod.restarts.to_string();
    let restarts = match restart_highlight(pod.restarts) {
        Highlight::Alarm => format!("{}!", restarts).bold().cyan(),
        Highlight::Warning => restarts.bold().magenta(),
        Highlight::Normal => restarts.normal(),
    };
    let image = pod
        .image
        .as_ref()
        .map(|image| image.to_string())
        .unwrap_or_default();

    println!("  {} {} {} {}", "▸".cyan(), pod.name, restarts, image.dimmed());
}

/// List deployments of every group
pub async fn deployments(dispatcher: &dyn Dispatcher, only: Option<String>) -> Result<()> {
    for group in groups(dispatcher, only).await? {
        let deployments = dispatcher
            .call(&cluster::DEPLOYMENTS, &GroupRequest::from(&group))
            .await?;
        if deployments.is_empty() {
            continue;
        }

        print_group_header(&group);
        for deployment in &deployments {
            println!(
                "  {} {} {}",
                "▸".cyan(),
                deployment.name,
                deployment.image.to_string().dimmed()
            );
        }
        println!();
    }

    Ok(())
}

/// List scalers of every group
pub async fn scalers(dispatcher: &dyn Dispatcher, only: Option<String>) -> Result<()> {
    for group in groups(dispatcher, only).await? {
        let scalers = dispatcher
            .call(&cluster::SCALERS, &GroupRequest::from(&group))
            .await?;
        if scalers.is_empty() {
            continue;
        }

        print_group_header(&group);
        for scaler in &scalers {
            print_scaler(scaler);
        }
        println!();
    }

    Ok(())
}

fn print_scaler(scaler: &Scaler) {
    let replicas = &scaler.replicas;
    let current = replicas.current.to_string();
    let current = match scaler_highlight(replicas) {
        Highlight::Alarm => format!("{}!", current).cyan(),
        Highlight::Warning => current.magenta(),
        Highlight::Normal => current.normal(),
    };

    println!(
        "  {} {} {} {}",
        "▸".cyan(),
        scaler.name,
        current,
        format!("[{}..{}]", replicas.minimum, replicas.maximum).dimmed()
    );
}
