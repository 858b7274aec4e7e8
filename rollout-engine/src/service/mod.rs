//! Service layer
//!
//! Collaborators the jobs repository talks to besides the dispatcher:
//! the run log channel, the readiness probe and the event publisher.
//!
//! All services are trait-based to enable testing and dependency injection.

mod events;
mod probe;
mod run_log;

// Re-export traits
pub use probe::Probe;
pub use run_log::RunLog;

// Re-export implementations
pub use events::{EventPublisher, applied_event, field_title};
pub use probe::HttpProbe;
pub use run_log::{InMemoryRunLog, TracingRunLog};
