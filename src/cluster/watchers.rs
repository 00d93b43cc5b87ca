// src/cluster/watchers.rs

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cluster::source::StatusSource;
use crate::cluster::types::{ClusterEvent, DeploymentStatus, PodEvent, WarningEvent};
use crate::engine::backoff::ExpBackoff;

/// Printed once when warning events cannot be listed.
pub const WARNINGS_FORBIDDEN: &str =
    "Unable to watch Events resource, warning Events won't be displayed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Deployment,
    Pod,
    Warning,
}

impl Resource {
    pub fn name(self) -> &'static str {
        match self {
            Resource::Deployment => "deployment",
            Resource::Pod => "pod",
            Resource::Warning => "events",
        }
    }
}

enum Opened {
    Deployments(mpsc::Receiver<DeploymentStatus>),
    Pods(mpsc::Receiver<PodEvent>),
    Warnings(mpsc::Receiver<WarningEvent>),
}

impl Opened {
    async fn next(&mut self) -> Option<ClusterEvent> {
        match self {
            Opened::Deployments(rx) => rx.recv().await.map(ClusterEvent::Deployment),
            Opened::Pods(rx) => rx.recv().await.map(ClusterEvent::Pod),
            Opened::Warnings(rx) => rx.recv().await.map(ClusterEvent::Warning),
        }
    }
}

/// One long-lived watch on a cluster resource type.
///
/// Events are forwarded into the event loop channel. When the stream fails
/// to open or closes, the failure is reported as
/// [`ClusterEvent::WatchFailed`] and the stream is re-opened after an
/// exponential backoff; a successful open resets the backoff.
struct ResourceWatcher {
    resource: Resource,
    source: Arc<dyn StatusSource>,
    selector: String,
    tx: mpsc::Sender<ClusterEvent>,
    cancel: CancellationToken,
    warned_forbidden: bool,
}

impl ResourceWatcher {
    async fn run(mut self) {
        let cancel = self.cancel.clone();
        let mut backoff = ExpBackoff::new();
        loop {
            let opened = tokio::select! {
                _ = cancel.cancelled() => return,
                res = self.open() => res,
            };

            let message = match opened {
                Ok(Some(mut stream)) => {
                    backoff.reset();
                    debug!(resource = self.resource.name(), "watch stream opened");
                    if !self.forward(&mut stream).await {
                        return;
                    }
                    "watch stream closed".to_string()
                }
                Ok(None) => return,
                Err(err) => format!("{err:#}"),
            };

            error!(resource = self.resource.name(), %message, "resource watch failed; reconnecting");
            let failed = ClusterEvent::WatchFailed {
                resource: self.resource.name().to_string(),
                message,
            };
            if self.tx.send(failed).await.is_err() {
                return;
            }

            let wait = backoff.delay();
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(wait) => {}
            }
        }
    }

    /// `Ok(None)` means the event loop is gone.
    async fn open(&mut self) -> anyhow::Result<Option<Opened>> {
        let opened = match self.resource {
            Resource::Deployment => {
                Opened::Deployments(self.source.deployment_watcher(&self.selector).await?)
            }
            Resource::Pod => Opened::Pods(self.source.pod_watcher(&self.selector).await?),
            Resource::Warning => {
                let stream = self.source.warning_watcher().await?;
                if stream.forbidden && !self.warned_forbidden {
                    self.warned_forbidden = true;
                    if self.tx.send(ClusterEvent::WarningsForbidden).await.is_err() {
                        return Ok(None);
                    }
                }
                Opened::Warnings(stream.events)
            }
        };
        Ok(Some(opened))
    }

    /// Forward until the stream closes (true) or the session ends (false).
    async fn forward(&self, stream: &mut Opened) -> bool {
        loop {
            let event = tokio::select! {
                _ = self.cancel.cancelled() => return false,
                ev = stream.next() => ev,
            };
            let Some(event) = event else {
                return true;
            };

            if let ClusterEvent::Warning(ref warning) = event {
                if !self.concerns_component(warning).await {
                    continue;
                }
            }
            if self.tx.send(event).await.is_err() {
                return false;
            }
        }
    }

    async fn concerns_component(&self, warning: &WarningEvent) -> bool {
        match self
            .source
            .pod_matches_selector(&warning.involved_object, &self.selector)
            .await
        {
            Ok(matching) => matching,
            Err(err) => {
                debug!(object = %warning.involved_object, error = %err, "unable to match warning to component");
                false
            }
        }
    }
}

/// Spawn one watcher task per resource type. The tasks end when `cancel`
/// fires or `tx` is closed.
pub fn spawn_resource_watchers(
    source: Arc<dyn StatusSource>,
    selector: &str,
    tx: mpsc::Sender<ClusterEvent>,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    info!(%selector, "starting cluster resource watchers");
    [Resource::Deployment, Resource::Pod, Resource::Warning]
        .into_iter()
        .map(|resource| {
            let watcher = ResourceWatcher {
                resource,
                source: Arc::clone(&source),
                selector: selector.to_string(),
                tx: tx.clone(),
                cancel: cancel.clone(),
                warned_forbidden: false,
            };
            tokio::spawn(watcher.run())
        })
        .collect()
}

/// Prints `<Kind>: Requested Replicas (N) | Available Replicas (M)` only
/// when it differs from the previous line.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    last: Option<String>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The line to print for `status`, or `None` if unchanged.
    pub fn update(&mut self, status: &DeploymentStatus) -> Option<String> {
        let line = status.status_line();
        if self.last.as_deref() == Some(line.as_str()) {
            return None;
        }
        self.last = Some(line.clone());
        Some(line)
    }
}
