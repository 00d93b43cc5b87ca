// src/cluster/pod_phases.rs

use std::collections::BTreeMap;
use std::time::SystemTime;

use crate::cluster::types::{PodInfo, PodPhase};

/// How a phase summary should be styled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseSummary {
    Success(String),
    Warning(String),
}

impl PhaseSummary {
    pub fn message(&self) -> &str {
        match self {
            PhaseSummary::Success(m) | PhaseSummary::Warning(m) => m,
        }
    }
}

/// Last observed phase of every pod of the component, keyed by creation
/// time so that a replacement pod sorts after the one it replaces.
#[derive(Debug, Clone, Default)]
pub struct PodPhases {
    phases: BTreeMap<SystemTime, String>,
}

impl PodPhases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the phase of an added or modified pod. Returns true if the
    /// displayed phases changed.
    pub fn add(&mut self, pod: &PodInfo) -> bool {
        let phase = pod.display_phase();
        match self.phases.get(&pod.creation_timestamp) {
            Some(existing) if *existing == phase => false,
            _ => {
                self.phases.insert(pod.creation_timestamp, phase);
                true
            }
        }
    }

    /// Forget a deleted pod. Returns true if it was known.
    pub fn delete(&mut self, pod: &PodInfo) -> bool {
        self.phases.remove(&pod.creation_timestamp).is_some()
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// The most recently created pod is running.
    pub fn latest_is_running(&self) -> bool {
        self.phases
            .values()
            .next_back()
            .is_some_and(|p| p == &PodPhase::Running.to_string())
    }

    pub fn display(&self) -> PhaseSummary {
        let mut values = self.phases.values();
        match (values.next(), values.next()) {
            (None, _) => PhaseSummary::Warning("No pod exists".to_string()),
            (Some(only), None) => {
                let msg = format!("Pod is {only}");
                if only == &PodPhase::Running.to_string() {
                    PhaseSummary::Success(msg)
                } else {
                    PhaseSummary::Warning(msg)
                }
            }
            (Some(_), Some(_)) => {
                let all: Vec<&str> = self.phases.values().map(String::as_str).collect();
                PhaseSummary::Warning(format!("Pods are {}", all.join(", ")))
            }
        }
    }
}
