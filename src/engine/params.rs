// src/engine/params.rs

use std::path::PathBuf;
use std::time::Duration;

/// Debounce delay used when none is configured.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

/// Command overrides and flags forwarded untouched to the push handler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOptions {
    pub build_cmd: Option<String>,
    pub run_cmd: Option<String>,
    pub debug_cmd: Option<String>,
    /// Start the debug command instead of the run command after a sync.
    pub debug: bool,
    pub debug_port: Option<u16>,
    /// Forward container ports on random local ports.
    pub random_ports: bool,
}

/// Configuration for a single watch session. Immutable once the session
/// starts.
#[derive(Debug, Clone)]
pub struct WatchParameters {
    pub component_name: String,
    pub application_name: String,
    /// Root of the component sources.
    pub path: PathBuf,
    /// Ignore globs, relative to `path`.
    pub ignores: Vec<String>,
    /// Quiet period required after the last change before a push. Zero means
    /// push as soon as changes are ingested.
    pub delay: Duration,
    /// When false no source watch is registered; cluster and keyboard
    /// sources stay active.
    pub watch_files: bool,
    /// Component descriptor files. A change to any of them forces a full
    /// update of the component. Only watched when `watch_files` is set.
    pub descriptor_paths: Vec<PathBuf>,
    pub push: PushOptions,
}

impl WatchParameters {
    pub fn new(component_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            component_name: component_name.into(),
            application_name: "app".to_string(),
            path: path.into(),
            ignores: Vec::new(),
            delay: DEFAULT_DELAY,
            watch_files: true,
            descriptor_paths: Vec::new(),
            push: PushOptions::default(),
        }
    }

    pub fn with_ignores(mut self, ignores: Vec<String>) -> Self {
        self.ignores = ignores;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_watch_files(mut self, watch_files: bool) -> Self {
        self.watch_files = watch_files;
        self
    }

    pub fn with_descriptor_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.descriptor_paths = paths;
        self
    }
}
