use std::sync::Mutex;

use tokio::sync::mpsc;
use odo_watch::cluster::{
    DeploymentStatus, PodEvent, SourceFuture, StatusSource, WarningEvent, WarningStream,
};

/// Sending side of a [`ChannelStatusSource`].
#[derive(Debug)]
pub struct StatusFeed {
    pub deployments: mpsc::Sender<DeploymentStatus>,
    pub pods: mpsc::Sender<PodEvent>,
    pub warnings: mpsc::Sender<WarningEvent>,
}

/// A status source whose streams are fed by the test.
///
/// Each stream can be opened once; later opens fail, which is what a
/// resource watcher sees when the cluster connection is gone.
#[derive(Debug)]
pub struct ChannelStatusSource {
    deployments: Mutex<Option<mpsc::Receiver<DeploymentStatus>>>,
    pods: Mutex<Option<mpsc::Receiver<PodEvent>>>,
    warnings: Mutex<Option<mpsc::Receiver<WarningEvent>>>,
    warnings_forbidden: bool,
    matching_pods: Vec<String>,
}

impl ChannelStatusSource {
    pub fn new() -> (Self, StatusFeed) {
        let (dep_tx, dep_rx) = mpsc::channel(16);
        let (pod_tx, pod_rx) = mpsc::channel(16);
        let (warn_tx, warn_rx) = mpsc::channel(16);
        let source = Self {
            deployments: Mutex::new(Some(dep_rx)),
            pods: Mutex::new(Some(pod_rx)),
            warnings: Mutex::new(Some(warn_rx)),
            warnings_forbidden: false,
            matching_pods: Vec::new(),
        };
        let feed = StatusFeed {
            deployments: dep_tx,
            pods: pod_tx,
            warnings: warn_tx,
        };
        (source, feed)
    }

    /// Report the warning stream as forbidden.
    pub fn forbid_warnings(mut self) -> Self {
        self.warnings_forbidden = true;
        self
    }

    /// Pods whose warnings belong to the component.
    pub fn with_matching_pod(mut self, name: impl Into<String>) -> Self {
        self.matching_pods.push(name.into());
        self
    }
}

fn take<T>(slot: &Mutex<Option<mpsc::Receiver<T>>>, what: &str) -> anyhow::Result<mpsc::Receiver<T>> {
    slot.lock()
        .unwrap()
        .take()
        .ok_or_else(|| anyhow::anyhow!("{what} stream already consumed"))
}

impl StatusSource for ChannelStatusSource {
    fn deployment_watcher<'a>(
        &'a self,
        _selector: &'a str,
    ) -> SourceFuture<'a, mpsc::Receiver<DeploymentStatus>> {
        Box::pin(async move { take(&self.deployments, "deployment") })
    }

    fn pod_watcher<'a>(&'a self, _selector: &'a str) -> SourceFuture<'a, mpsc::Receiver<PodEvent>> {
        Box::pin(async move { take(&self.pods, "pod") })
    }

    fn warning_watcher(&self) -> SourceFuture<'_, WarningStream> {
        Box::pin(async move {
            Ok(WarningStream {
                events: take(&self.warnings, "warning")?,
                forbidden: self.warnings_forbidden,
            })
        })
    }

    fn pod_matches_selector<'a>(
        &'a self,
        pod_name: &'a str,
        _selector: &'a str,
    ) -> SourceFuture<'a, bool> {
        Box::pin(async move { Ok(self.matching_pods.iter().any(|p| p == pod_name)) })
    }
}
