// src/cluster/wait.rs

//! One-shot "wait for everything" readiness check used at session start.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::cluster::source::StatusSource;
use crate::cluster::types::{DeploymentStatus, PodEvent, PodPhase};
use crate::errors::WaitError;

/// Readiness checkers for one wait call.
///
/// Each checker consumes one stream until its resource is ready or has
/// failed. State lives in this value only, so concurrent waits never
/// interfere. Dropping it aborts every checker still running.
#[derive(Debug, Default)]
pub struct ReadinessWait {
    checkers: JoinSet<Result<(), WaitError>>,
}

impl ReadinessWait {
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeeds once requested == available replicas (> 0); fails on a
    /// failure condition.
    pub fn watch_deployment(&mut self, mut rx: mpsc::Receiver<DeploymentStatus>) -> &mut Self {
        self.checkers.spawn(async move {
            while let Some(status) = rx.recv().await {
                debug!(
                    name = %status.name,
                    requested = status.requested_replicas,
                    available = status.available_replicas,
                    "deployment status"
                );
                if let Some(reason) = status.failure {
                    return Err(WaitError::DeploymentFailed {
                        name: status.name,
                        reason,
                    });
                }
                if status.is_available() {
                    return Ok(());
                }
            }
            Err(WaitError::StreamClosed("deployment".to_string()))
        });
        self
    }

    /// Succeeds once a pod is `Running`; fails on `Failed` or `Unknown`.
    pub fn watch_pods(&mut self, mut rx: mpsc::Receiver<PodEvent>) -> &mut Self {
        self.checkers.spawn(async move {
            while let Some(event) = rx.recv().await {
                let PodEvent::Applied(pod) = event else {
                    continue;
                };
                debug!(pod = %pod.name, phase = %pod.phase, "pod status");
                if pod.phase.is_terminal_failure() {
                    return Err(WaitError::PodFailed {
                        pod: pod.name,
                        phase: pod.phase.to_string(),
                    });
                }
                if pod.phase == PodPhase::Running && !pod.deletion_requested {
                    return Ok(());
                }
            }
            Err(WaitError::StreamClosed("pod".to_string()))
        });
        self
    }

    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }

    /// Ok once every checker succeeded; the first failure as soon as any
    /// checker fails; [`WaitError::Timeout`] if neither happens in time.
    pub async fn wait(mut self, timeout: Duration) -> Result<(), WaitError> {
        let all = async {
            while let Some(joined) = self.checkers.join_next().await {
                match joined {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => return Err(err),
                    Err(join_err) => return Err(WaitError::Aborted(join_err.to_string())),
                }
            }
            Ok(())
        };

        match tokio::time::timeout(timeout, all).await {
            Ok(res) => res,
            Err(_) => Err(WaitError::Timeout(timeout)),
        }
    }
}

/// Wait until the component's deployment and pod are both ready.
pub async fn wait_for_component(
    source: &dyn StatusSource,
    selector: &str,
    timeout: Duration,
) -> Result<(), WaitError> {
    let watch_err = |resource: &str, err: anyhow::Error| WaitError::Watch {
        resource: resource.to_string(),
        message: format!("{err:#}"),
    };

    let deployments = source
        .deployment_watcher(selector)
        .await
        .map_err(|e| watch_err("deployment", e))?;
    let pods = source
        .pod_watcher(selector)
        .await
        .map_err(|e| watch_err("pod", e))?;

    let mut wait = ReadinessWait::new();
    wait.watch_deployment(deployments).watch_pods(pods);
    wait.wait(timeout).await?;
    info!(%selector, "component is ready");
    Ok(())
}
