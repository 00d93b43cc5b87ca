// src/cluster/source.rs

//! The cluster capability consumed by the watch core.
//!
//! A [`StatusSource`] opens typed watch streams keyed by a label selector.
//! Real clients (Kubernetes, Podman) live outside this crate; the binary
//! uses [`StaticStatusSource`], and tests use channel-backed sources.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::cluster::labels::selector_matches;
use crate::cluster::types::{DeploymentStatus, PodEvent, PodInfo, PodPhase, WarningEvent};

pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Warning events plus whether listing them was forbidden. A forbidden
/// stream stays open but never yields.
#[derive(Debug)]
pub struct WarningStream {
    pub events: mpsc::Receiver<WarningEvent>,
    pub forbidden: bool,
}

pub trait StatusSource: Send + Sync {
    fn deployment_watcher<'a>(
        &'a self,
        selector: &'a str,
    ) -> SourceFuture<'a, mpsc::Receiver<DeploymentStatus>>;

    fn pod_watcher<'a>(&'a self, selector: &'a str) -> SourceFuture<'a, mpsc::Receiver<PodEvent>>;

    fn warning_watcher(&self) -> SourceFuture<'_, WarningStream>;

    /// Whether the pod named `pod_name` carries labels matching `selector`.
    fn pod_matches_selector<'a>(
        &'a self,
        pod_name: &'a str,
        selector: &'a str,
    ) -> SourceFuture<'a, bool>;
}

const STREAM_CAPACITY: usize = 16;

/// A source reporting one fully available deployment with one running pod.
///
/// Used when no cluster is involved: the component is considered deployed
/// as soon as the session starts. Streams stay open for the lifetime of the
/// source.
#[derive(Debug)]
pub struct StaticStatusSource {
    name: String,
    labels: BTreeMap<String, String>,
    started: SystemTime,
    deployments: Mutex<Vec<mpsc::Sender<DeploymentStatus>>>,
    pods: Mutex<Vec<mpsc::Sender<PodEvent>>>,
    warnings: Mutex<Vec<mpsc::Sender<WarningEvent>>>,
}

impl StaticStatusSource {
    pub fn new(name: impl Into<String>, labels: BTreeMap<String, String>) -> Self {
        Self {
            name: name.into(),
            labels,
            started: SystemTime::now(),
            deployments: Mutex::new(Vec::new()),
            pods: Mutex::new(Vec::new()),
            warnings: Mutex::new(Vec::new()),
        }
    }

    fn pod_name(&self) -> String {
        format!("{}-0", self.name)
    }
}

fn keep<T>(slot: &Mutex<Vec<mpsc::Sender<T>>>, tx: mpsc::Sender<T>) {
    slot.lock().unwrap_or_else(PoisonError::into_inner).push(tx);
}

impl StatusSource for StaticStatusSource {
    fn deployment_watcher<'a>(
        &'a self,
        selector: &'a str,
    ) -> SourceFuture<'a, mpsc::Receiver<DeploymentStatus>> {
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
            if selector_matches(selector, &self.labels) {
                tx.send(DeploymentStatus::new(self.name.clone(), 1, 1)).await?;
            }
            keep(&self.deployments, tx);
            Ok(rx)
        })
    }

    fn pod_watcher<'a>(&'a self, selector: &'a str) -> SourceFuture<'a, mpsc::Receiver<PodEvent>> {
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
            if selector_matches(selector, &self.labels) {
                let pod = PodInfo::new(self.pod_name(), self.started, PodPhase::Running);
                tx.send(PodEvent::Applied(pod)).await?;
            }
            keep(&self.pods, tx);
            Ok(rx)
        })
    }

    fn warning_watcher(&self) -> SourceFuture<'_, WarningStream> {
        Box::pin(async move {
            let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
            keep(&self.warnings, tx);
            Ok(WarningStream {
                events: rx,
                forbidden: false,
            })
        })
    }

    fn pod_matches_selector<'a>(
        &'a self,
        pod_name: &'a str,
        selector: &'a str,
    ) -> SourceFuture<'a, bool> {
        Box::pin(async move {
            Ok(pod_name == self.pod_name() && selector_matches(selector, &self.labels))
        })
    }
}
