// src/cluster/mod.rs

//! Cluster-side status of the dev workload.
//!
//! The watch core never talks to a platform API directly. It consumes a
//! [`StatusSource`] and turns its streams into:
//! - [`ClusterEvent`]s for the event loop ([`watchers`]);
//! - a one-shot readiness verdict at session start ([`wait`]);
//! - human-readable pod phase summaries ([`pod_phases`]).

pub mod labels;
pub mod pod_phases;
pub mod source;
pub mod types;
pub mod wait;
pub mod watchers;

pub use pod_phases::{PhaseSummary, PodPhases};
pub use source::{SourceFuture, StaticStatusSource, StatusSource, WarningStream};
pub use types::{ClusterEvent, DeploymentStatus, PodEvent, PodInfo, PodPhase, WarningEvent};
pub use wait::{wait_for_component, ReadinessWait};
pub use watchers::{spawn_resource_watchers, StatusLine, WARNINGS_FORBIDDEN};
