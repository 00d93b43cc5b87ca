// src/cluster/types.rs

use std::fmt;
use std::time::SystemTime;

/// Observed status of the workload controller (Deployment,
/// DeploymentConfig, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentStatus {
    /// Resource kind used in status lines, e.g. `Deployment`.
    pub kind: String,
    pub name: String,
    pub requested_replicas: u32,
    pub available_replicas: u32,
    /// Set when the controller reports a terminal error condition.
    pub failure: Option<String>,
}

impl DeploymentStatus {
    pub fn new(name: impl Into<String>, requested: u32, available: u32) -> Self {
        Self {
            kind: "Deployment".to_string(),
            name: name.into(),
            requested_replicas: requested,
            available_replicas: available,
            failure: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.failure.is_none()
            && self.requested_replicas > 0
            && self.requested_replicas == self.available_replicas
    }

    pub fn status_line(&self) -> String {
        format!(
            "{}: Requested Replicas ({}) | Available Replicas ({})",
            self.kind, self.requested_replicas, self.available_replicas
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl PodPhase {
    /// Phases after which the pod will never become ready.
    pub fn is_terminal_failure(self) -> bool {
        matches!(self, PodPhase::Failed | PodPhase::Unknown)
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodInfo {
    pub name: String,
    pub creation_timestamp: SystemTime,
    pub phase: PodPhase,
    /// The pod has a deletion timestamp and is shutting down.
    pub deletion_requested: bool,
}

impl PodInfo {
    pub fn new(name: impl Into<String>, creation_timestamp: SystemTime, phase: PodPhase) -> Self {
        Self {
            name: name.into(),
            creation_timestamp,
            phase,
            deletion_requested: false,
        }
    }

    /// Phase as shown to the user; a pod being deleted shows `Terminating`.
    pub fn display_phase(&self) -> String {
        if self.deletion_requested {
            "Terminating".to_string()
        } else {
            self.phase.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PodEvent {
    /// Added or modified.
    Applied(PodInfo),
    Deleted(PodInfo),
}

/// A platform warning event about some object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningEvent {
    pub involved_object: String,
    pub message: String,
}

/// Everything the resource watchers forward into the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterEvent {
    Deployment(DeploymentStatus),
    Pod(PodEvent),
    Warning(WarningEvent),
    /// Warning events cannot be listed with the current permissions.
    WarningsForbidden,
    /// A resource stream failed or closed; the watcher is reconnecting.
    WatchFailed { resource: String, message: String },
}
