// src/engine/event_loop.rs

use std::io::Write;
use std::sync::Arc;

use tokio::sync::{mpsc, Notify};
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cluster::labels::component_selector;
use crate::cluster::{
    spawn_resource_watchers, ClusterEvent, PhaseSummary, PodEvent, PodPhases, StatusLine,
    StatusSource, WARNINGS_FORBIDDEN,
};
use crate::engine::descriptor::DescriptorWatch;
use crate::engine::params::WatchParameters;
use crate::engine::pending::{ChangeBatch, PendingChangeSet};
use crate::engine::push::{PushHandler, PushParameters, PUSH_ERROR_STRING};
use crate::engine::status::{ComponentStatus, Transition};
use crate::errors::WatchError;
use crate::fs::{FileSystem, RealFileSystem};
use crate::keyboard::KEYBOARD_HELP;
use crate::output::Printer;
use crate::types::{ComponentState, KeyCommand};
use crate::watch::{evaluate_file_changes, FileEvent, IgnoreMatcher, SourceStreams, SourceWatcher};

/// A single dev-mode watch session.
///
/// Fans in file changes, cluster events, keyboard commands and
/// cancellation, and pushes settled batches through the configured
/// [`PushHandler`]. Built with [`WatchSession::new`] and the `with_*`
/// methods, consumed by [`WatchSession::run`].
pub struct WatchSession {
    params: WatchParameters,
    handler: Box<dyn PushHandler>,
    printer: Printer,
    status_source: Option<Arc<dyn StatusSource>>,
    keys: Option<mpsc::Receiver<KeyCommand>>,
    fs: Arc<dyn FileSystem>,
    extra_events: Option<mpsc::UnboundedReceiver<FileEvent>>,
    extra_errors: Option<mpsc::UnboundedReceiver<notify::Error>>,
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("params", &self.params)
            .field("cluster", &self.status_source.is_some())
            .field("keyboard", &self.keys.is_some())
            .finish_non_exhaustive()
    }
}

impl WatchSession {
    pub fn new(
        params: WatchParameters,
        handler: Box<dyn PushHandler>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            params,
            handler,
            printer: Printer::new(out),
            status_source: None,
            keys: None,
            fs: Arc::new(RealFileSystem),
            extra_events: None,
            extra_errors: None,
        }
    }

    /// Follow the workload through `source`. Without one the component is
    /// considered deployed and ready from the start.
    pub fn with_status_source(mut self, source: Arc<dyn StatusSource>) -> Self {
        self.status_source = Some(source);
        self
    }

    pub fn with_key_commands(mut self, keys: mpsc::Receiver<KeyCommand>) -> Self {
        self.keys = Some(keys);
        self
    }

    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Emit `\r\n` line endings (terminal in raw mode).
    pub fn with_raw_line_endings(mut self, raw: bool) -> Self {
        self.printer.set_raw_line_endings(raw);
        self
    }

    /// Feed file events from another producer in addition to the detector.
    pub fn with_file_events(mut self, events: mpsc::UnboundedReceiver<FileEvent>) -> Self {
        self.extra_events = Some(events);
        self
    }

    /// Feed watcher errors from another producer. Like detector errors,
    /// the first one ends the session.
    pub fn with_watch_errors(mut self, errors: mpsc::UnboundedReceiver<notify::Error>) -> Self {
        self.extra_errors = Some(errors);
        self
    }

    /// Run until cancelled, asked to exit, or a fatal error occurs.
    ///
    /// A user-requested exit returns [`WatchError::Interrupted`]; callers
    /// should treat it as success.
    pub async fn run(self, cancel: CancellationToken) -> Result<(), WatchError> {
        let WatchSession {
            params,
            handler,
            printer,
            status_source,
            mut keys,
            fs,
            extra_events,
            extra_errors,
        } = self;

        info!(
            path = ?params.path,
            component = %params.component_name,
            ignores = ?params.ignores,
            "starting watch session"
        );

        let ignores = IgnoreMatcher::new(&params.ignores)?;
        let root = fs.canonicalize(&params.path).unwrap_or_else(|_| params.path.clone());
        let (detector, streams) = if params.watch_files {
            SourceWatcher::new(&root, ignores.clone())?
        } else {
            SourceWatcher::unwatched(&root, ignores.clone())?
        };

        let pending = Arc::new(PendingChangeSet::new());
        let wake = Arc::new(Notify::new());
        let tasks = cancel.child_token();

        let (descriptor_watch, mut descriptor_rx) =
            if params.watch_files && !params.descriptor_paths.is_empty() {
                let (tx, rx) = mpsc::channel::<()>(1);
                let watch = DescriptorWatch::new(
                    &root,
                    &params.descriptor_paths,
                    tx,
                    Arc::clone(&pending),
                    Arc::clone(&wake),
                )?;
                (Some(watch), Some(rx))
            } else {
                (None, None)
            };

        let ingest = tokio::spawn(
            Ingestion {
                detector,
                streams,
                extra: extra_events,
                extra_errors,
                fs: Arc::clone(&fs),
                pending: Arc::clone(&pending),
                wake: Arc::clone(&wake),
            }
            .run(tasks.clone()),
        );
        let descriptor = descriptor_watch.map(|watch| tokio::spawn(watch.run(tasks.clone())));

        let selector = component_selector(&params.component_name, &params.application_name);
        let (cluster_tx, cluster_rx) = mpsc::channel::<ClusterEvent>(64);
        let (status, watchers, mut cluster_rx) = match status_source {
            Some(source) => {
                let handles = spawn_resource_watchers(source, &selector, cluster_tx, tasks.clone());
                (ComponentStatus::new(), handles, Some(cluster_rx))
            }
            None => (ComponentStatus::ready(), Vec::new(), None),
        };

        let mut ticker = if params.delay.is_zero() {
            None
        } else {
            let mut interval = tokio::time::interval_at(Instant::now() + params.delay, params.delay);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(interval)
        };

        let mut state = LoopState {
            keyboard_help: keys.is_some(),
            params,
            handler,
            printer,
            fs,
            status,
            pending,
            phases: PodPhases::new(),
            deployment_line: StatusLine::new(),
            banner_pending: true,
        };

        let path = state.params.path.display().to_string();
        state
            .printer
            .line(format_args!("Waiting for something to change in {path}"));

        let result = loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break Err(WatchError::Interrupted),

                _ = wake.notified() => {
                    if let Some(err) = state.pending.take_error() {
                        break Err(err);
                    }
                    if ticker.is_none() {
                        if let Err(err) = state.sync_if_settled().await {
                            break Err(err);
                        }
                    }
                }

                update = recv_or_pending(&mut descriptor_rx) => match update {
                    Some(()) => {
                        state.printer.line("Updating component ...");
                        state.pending.force_sync();
                        if let Err(err) = state.sync_if_settled().await {
                            break Err(err);
                        }
                    }
                    None => descriptor_rx = None,
                },

                key = recv_or_pending(&mut keys) => match key {
                    Some(KeyCommand::Exit) => break Err(WatchError::Interrupted),
                    Some(KeyCommand::Sync) => {
                        state.printer.section("Manually syncing files");
                        state.pending.force_sync();
                        if !state.status.can_sync() {
                            state.printer.line("Waiting for the component to be ready before syncing");
                        }
                        if let Err(err) = state.sync_if_settled().await {
                            break Err(err);
                        }
                    }
                    None => {
                        debug!("keyboard commands closed");
                        keys = None;
                    }
                },

                event = recv_or_pending(&mut cluster_rx) => match event {
                    Some(event) => {
                        state.handle_cluster_event(event);
                        if let Err(err) = state.sync_if_settled().await {
                            break Err(err);
                        }
                    }
                    None => {
                        debug!("cluster event channel closed");
                        cluster_rx = None;
                    }
                },

                _ = tick(&mut ticker) => {
                    if let Some(err) = state.pending.take_error() {
                        break Err(err);
                    }
                    if let Err(err) = state.sync_if_settled().await {
                        break Err(err);
                    }
                }
            }
        };

        tasks.cancel();
        ingest.abort();
        if let Some(handle) = descriptor {
            handle.abort();
        }
        for handle in watchers {
            handle.abort();
        }

        match &result {
            Err(err) if err.is_user_exit() => info!("watch session interrupted by user"),
            Err(err) => warn!(error = %err, "watch session failed"),
            Ok(()) => {}
        }
        result
    }
}

/// Loop-owned state. Only the event loop mutates it.
struct LoopState {
    params: WatchParameters,
    handler: Box<dyn PushHandler>,
    printer: Printer,
    fs: Arc<dyn FileSystem>,
    status: ComponentStatus,
    pending: Arc<PendingChangeSet>,
    phases: PodPhases,
    deployment_line: StatusLine,
    banner_pending: bool,
    keyboard_help: bool,
}

impl LoopState {
    async fn sync_if_settled(&mut self) -> Result<(), WatchError> {
        if !self.status.can_sync() {
            return Ok(());
        }
        if !self.pending.is_settled(self.params.delay, Instant::now()) {
            return Ok(());
        }
        let mut batch = self.pending.drain();
        batch.settle(self.fs.as_ref());
        if batch.is_empty() && !batch.forced {
            debug!("pending changes no longer exist; nothing to push");
            return Ok(());
        }
        if !batch.forced {
            self.printer.section("Automatically syncing files");
        }
        self.push(batch).await
    }

    async fn push(&mut self, batch: ChangeBatch) -> Result<(), WatchError> {
        for path in batch.affected_paths() {
            self.printer
                .line(format_args!("File {} changed", path.display()));
        }
        self.printer.line("Pushing files...");

        let params = PushParameters {
            component_name: self.params.component_name.clone(),
            application_name: self.params.application_name.clone(),
            path: self.params.path.clone(),
            changed_files: batch.changed,
            deleted_files: batch.deleted,
            ignored_files: self.params.ignores.clone(),
            scan_index: !self.status.first_push_done(),
            forced: batch.forced,
            options: self.params.push.clone(),
        };
        debug!(
            changed = params.changed_files.len(),
            deleted = params.deleted_files.len(),
            scan_index = params.scan_index,
            "pushing files"
        );

        self.status.set_state(ComponentState::SyncOutdated);
        let outcome = self.handler.push(params, &mut self.status).await;
        let still_syncing = self.status.state() == ComponentState::SyncOutdated;

        match outcome {
            Ok(()) => {
                self.status.mark_pushed();
                if still_syncing {
                    self.status.set_state(ComponentState::Ready);
                }
                if self.banner_pending && self.status.can_sync() {
                    self.banner_pending = false;
                    self.print_banner();
                }
                Ok(())
            }
            Err(err) if err.is_fatal() => Err(WatchError::FatalPush(err.to_string())),
            Err(err) if !self.params.watch_files => {
                // Nothing would trigger a retry.
                warn!(error = %err, "push failed with file watching disabled");
                Err(WatchError::Push(err.to_string()))
            }
            Err(err) => {
                warn!(error = %err, "push failed");
                self.printer.line(format_args!("{PUSH_ERROR_STRING} - {err}"));
                self.printer.blank();
                if still_syncing {
                    self.status.set_state(ComponentState::Ready);
                }
                Ok(())
            }
        }
    }

    fn print_banner(&mut self) {
        self.printer.section("Dev mode");
        self.printer.line(format_args!(
            " Status:\n Watching for changes in the current directory {}",
            self.params.path.display()
        ));
        if self.keyboard_help {
            self.printer.blank();
            self.printer.line(" Keyboard Commands:");
            self.printer.line(KEYBOARD_HELP);
        }
    }

    fn handle_cluster_event(&mut self, event: ClusterEvent) {
        let transition = match event {
            ClusterEvent::Deployment(deployment) => {
                if let Some(line) = self.deployment_line.update(&deployment) {
                    self.printer.line(line);
                }
                if let Some(reason) = &deployment.failure {
                    self.printer
                        .warning(format_args!("{} {}: {reason}", deployment.kind, deployment.name));
                }
                self.status.set_deployment_available(deployment.is_available())
            }
            ClusterEvent::Pod(pod_event) => {
                let changed = match &pod_event {
                    PodEvent::Applied(pod) => self.phases.add(pod),
                    PodEvent::Deleted(pod) => self.phases.delete(pod),
                };
                if changed {
                    self.print_phases();
                }
                self.status.set_pod_running(self.phases.latest_is_running())
            }
            ClusterEvent::Warning(warning) => {
                self.printer.warning(warning.message);
                Transition::None
            }
            ClusterEvent::WarningsForbidden => {
                self.printer.warning(WARNINGS_FORBIDDEN);
                Transition::None
            }
            ClusterEvent::WatchFailed { resource, message } => {
                debug!(%resource, %message, "cluster watch interrupted");
                Transition::None
            }
        };

        match transition {
            Transition::BecameReady => {
                // Whatever ran before, the new workload needs the full tree.
                self.pending.force_sync();
                self.banner_pending = true;
            }
            Transition::Regressed => {
                info!("workload no longer available; pushes suspended");
            }
            Transition::None => {}
        }
    }

    fn print_phases(&mut self) {
        match self.phases.display() {
            PhaseSummary::Success(msg) => self.printer.success(msg),
            PhaseSummary::Warning(msg) => self.printer.warning(msg),
        }
    }
}

/// Owns the detector; turns raw events into pending changes.
struct Ingestion {
    detector: SourceWatcher,
    streams: SourceStreams,
    extra: Option<mpsc::UnboundedReceiver<FileEvent>>,
    extra_errors: Option<mpsc::UnboundedReceiver<notify::Error>>,
    fs: Arc<dyn FileSystem>,
    pending: Arc<PendingChangeSet>,
    wake: Arc<Notify>,
}

impl Ingestion {
    async fn run(mut self, cancel: CancellationToken) {
        loop {
            let first = tokio::select! {
                _ = cancel.cancelled() => return,
                event = self.streams.events.recv() => match event {
                    Some(event) => event,
                    None => return,
                },
                event = recv_unbounded_or_pending(&mut self.extra) => match event {
                    Some(event) => event,
                    None => {
                        self.extra = None;
                        continue;
                    }
                },
                err = self.streams.errors.recv() => {
                    if let Some(err) = err {
                        self.fail(WatchError::Notify(err));
                    }
                    return;
                }
                err = recv_unbounded_or_pending(&mut self.extra_errors) => match err {
                    Some(err) => {
                        self.fail(WatchError::Notify(err));
                        return;
                    }
                    None => {
                        self.extra_errors = None;
                        continue;
                    }
                },
            };

            let mut batch = vec![first];
            while let Ok(event) = self.streams.events.try_recv() {
                batch.push(event);
            }
            if let Some(extra) = self.extra.as_mut() {
                while let Ok(event) = extra.try_recv() {
                    batch.push(event);
                }
            }

            if let Err(err) = self.ingest(&batch) {
                self.fail(err);
                return;
            }
        }
    }

    fn ingest(&mut self, batch: &[FileEvent]) -> Result<(), WatchError> {
        let changes = evaluate_file_changes(
            self.fs.as_ref(),
            self.detector.root(),
            batch,
            self.detector.ignores(),
        );

        for path in &changes.unwatch {
            self.detector.remove_watch(path);
        }
        for path in &changes.rewatch {
            self.detector.add_recursive_watch(path)?;
        }

        if self.pending.record(&changes, Instant::now()) {
            debug!(
                changed = changes.changed.len(),
                deleted = changes.deleted.len(),
                "recorded file changes"
            );
            self.wake.notify_one();
        }
        Ok(())
    }

    fn fail(&self, err: WatchError) {
        warn!(error = %err, "file watcher failed");
        self.pending.set_error(err);
        self.wake.notify_one();
    }
}

async fn recv_or_pending<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn recv_unbounded_or_pending<T>(rx: &mut Option<mpsc::UnboundedReceiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}
