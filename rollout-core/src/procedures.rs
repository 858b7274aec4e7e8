//! Procedure catalogue
//!
//! Every `(module, procedure)` pair the system serves or consumes, bound to
//! its input and output types. Handlers are registered against these
//! constants and callers invoke them through `dyn Dispatcher::call`.

/// Cluster state: enumeration and deployment updates
pub mod cluster {
    use crate::dispatch::Procedure;
    use crate::domain::{Deployment, Pod, Scaler};
    use crate::dto::cluster::{GroupRequest, NamespacesRequest, UpdateDeploymentRequest};

    pub const MODULE: &str = "cluster";

    pub const CLUSTERS: Procedure<(), Vec<String>> = Procedure::new(MODULE, "clusters");
    pub const NAMESPACES: Procedure<NamespacesRequest, Vec<String>> =
        Procedure::new(MODULE, "namespaces");
    pub const DEPLOYMENTS: Procedure<GroupRequest, Vec<Deployment>> =
        Procedure::new(MODULE, "deployments");
    pub const PODS: Procedure<GroupRequest, Vec<Pod>> = Procedure::new(MODULE, "pods");
    pub const SCALERS: Procedure<GroupRequest, Vec<Scaler>> = Procedure::new(MODULE, "scalers");
    /// Returns the deployments of the group after the update
    pub const UPDATE_DEPLOYMENT: Procedure<UpdateDeploymentRequest, Vec<Deployment>> =
        Procedure::new(MODULE, "updateDeployment");
}

/// Image registry lookups
pub mod images {
    use crate::dispatch::Procedure;
    use crate::domain::Image;
    use crate::dto::images::{ImageRequest, VersionsRequest};

    pub const MODULE: &str = "images";

    pub const IMAGES: Procedure<(), Vec<String>> = Procedure::new(MODULE, "images");
    pub const IMAGE: Procedure<ImageRequest, Image> = Procedure::new(MODULE, "image");
    /// Most recent first
    pub const VERSIONS: Procedure<VersionsRequest, Vec<Image>> = Procedure::new(MODULE, "versions");
}

/// Notification sink
pub mod events {
    use crate::dispatch::Procedure;
    use crate::domain::Event;

    pub const MODULE: &str = "events";

    pub const LOG: Procedure<Event, ()> = Procedure::new(MODULE, "log");
}

/// Pipeline registry, planning, runs and schedules
pub mod jobs {
    use crate::dispatch::Procedure;
    use crate::domain::{CronJobDescriptor, JobPlan, PipelineDescription, RunReport};
    use crate::dto::jobs::PipelineRequest;

    pub const MODULE: &str = "jobs";

    pub const PIPELINES: Procedure<(), Vec<PipelineDescription>> =
        Procedure::new(MODULE, "pipelines");
    pub const PLAN: Procedure<PipelineRequest, Option<JobPlan>> = Procedure::new(MODULE, "plan");
    pub const RUN: Procedure<PipelineRequest, RunReport> = Procedure::new(MODULE, "run");
    pub const SCHEDULES: Procedure<PipelineRequest, Option<CronJobDescriptor>> =
        Procedure::new(MODULE, "schedules");
    pub const CRONS: Procedure<(), Vec<CronJobDescriptor>> = Procedure::new(MODULE, "crons");
}
