// src/engine/status.rs

use tracing::info;

use crate::types::ComponentState;

/// What a cluster observation did to the component state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// The workload became available; a full sync should follow.
    BecameReady,
    /// The workload went away or failed; pushes are blocked again.
    Regressed,
}

/// Lifecycle register of the remote dev workload.
///
/// Owned by the event loop. Cluster observations update the readiness facts
/// and [`ComponentStatus::reconcile`] derives the state from them; push
/// handlers may move the state directly through [`ComponentStatus::set_state`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentStatus {
    state: ComponentState,
    deployment_available: bool,
    pod_running: bool,
    first_push_done: bool,
}

impl ComponentStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A status for sessions without a cluster: already deployed and running.
    pub fn ready() -> Self {
        Self {
            state: ComponentState::Ready,
            deployment_available: true,
            pod_running: true,
            first_push_done: false,
        }
    }

    pub fn state(&self) -> ComponentState {
        self.state
    }

    pub fn set_state(&mut self, state: ComponentState) {
        if self.state != state {
            info!(from = %self.state, to = %state, "component state changed");
            self.state = state;
        }
    }

    /// Files may only be pushed to a ready workload.
    pub fn can_sync(&self) -> bool {
        self.state == ComponentState::Ready
    }

    pub fn first_push_done(&self) -> bool {
        self.first_push_done
    }

    pub fn mark_pushed(&mut self) {
        self.first_push_done = true;
    }

    pub fn set_deployment_available(&mut self, available: bool) -> Transition {
        self.deployment_available = available;
        self.reconcile()
    }

    pub fn set_pod_running(&mut self, running: bool) -> Transition {
        self.pod_running = running;
        self.reconcile()
    }

    /// Derive the state from the readiness facts.
    ///
    /// Both facts true while waiting moves to `Ready`. Losing either fact
    /// moves any other state back to `WaitDeployment` and forgets the first
    /// push, so the next push rescans the whole tree.
    pub fn reconcile(&mut self) -> Transition {
        let available = self.deployment_available && self.pod_running;
        match (self.state, available) {
            (ComponentState::WaitDeployment, true) => {
                self.set_state(ComponentState::Ready);
                Transition::BecameReady
            }
            (ComponentState::WaitDeployment, false) | (_, true) => Transition::None,
            (_, false) => {
                self.set_state(ComponentState::WaitDeployment);
                self.first_push_done = false;
                Transition::Regressed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn becomes_ready_only_when_both_facts_hold() {
        let mut status = ComponentStatus::new();
        assert!(!status.can_sync());
        assert_eq!(status.set_deployment_available(true), Transition::None);
        assert_eq!(status.set_pod_running(true), Transition::BecameReady);
        assert!(status.can_sync());
        assert_eq!(status.reconcile(), Transition::None);
    }

    #[test]
    fn regression_resets_first_push() {
        let mut status = ComponentStatus::ready();
        status.mark_pushed();
        status.set_state(ComponentState::SyncOutdated);
        assert!(!status.can_sync());

        assert_eq!(status.set_pod_running(false), Transition::Regressed);
        assert_eq!(status.state(), ComponentState::WaitDeployment);
        assert!(!status.first_push_done());
        assert_eq!(status.set_pod_running(false), Transition::None);
    }
}
