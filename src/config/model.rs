// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::engine::{PushOptions, WatchParameters};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [component]
/// name = "nodejs"
/// application = "app"
/// path = "."
/// ready_timeout = "1m"
/// descriptors = ["devfile.yaml"]
///
/// [watch]
/// ignore = [".git", "node_modules"]
/// delay = "1s"
/// watch_files = true
///
/// [push]
/// cmd = "rsync -a ./ dev-pod:/projects"
/// run_cmd = "run"
/// debug_port = 5858
/// ```
///
/// Only `component.name` and `push.cmd` are required.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub component: RawComponentSection,

    #[serde(default)]
    pub watch: RawWatchSection,

    pub push: RawPushSection,
}

/// `[component]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawComponentSection {
    pub name: String,

    #[serde(default = "default_application")]
    pub application: String,

    /// Source root; relative paths are resolved against the config file's
    /// directory.
    #[serde(default = "default_path")]
    pub path: PathBuf,

    /// How long to wait for the workload to become ready at startup.
    #[serde(default = "default_ready_timeout")]
    pub ready_timeout: String,

    /// Files describing the component; relative to `path`. Editing one
    /// triggers a full update.
    #[serde(default)]
    pub descriptors: Vec<PathBuf>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawWatchSection {
    /// Ignore globs relative to `component.path`.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,

    /// Debounce delay, e.g. `"500ms"`, `"1s"`. `"0s"` pushes immediately.
    #[serde(default = "default_delay")]
    pub delay: String,

    #[serde(default = "default_true")]
    pub watch_files: bool,
}

impl Default for RawWatchSection {
    fn default() -> Self {
        Self {
            ignore: default_ignore(),
            delay: default_delay(),
            watch_files: true,
        }
    }
}

/// `[push]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPushSection {
    /// Shell command run for every push.
    pub cmd: String,

    #[serde(default)]
    pub build_cmd: Option<String>,

    #[serde(default)]
    pub run_cmd: Option<String>,

    #[serde(default)]
    pub debug_cmd: Option<String>,

    #[serde(default)]
    pub debug: bool,

    #[serde(default)]
    pub debug_port: Option<u16>,

    #[serde(default)]
    pub random_ports: bool,
}

fn default_application() -> String {
    "app".to_string()
}

fn default_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_ready_timeout() -> String {
    "1m".to_string()
}

fn default_ignore() -> Vec<String> {
    vec![".git".to_string()]
}

fn default_delay() -> String {
    "1s".to_string()
}

fn default_true() -> bool {
    true
}

/// Validated configuration. Construct through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub component: ComponentConfig,
    pub watch: WatchConfig,
    pub push: PushConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentConfig {
    pub name: String,
    pub application: String,
    pub path: PathBuf,
    pub ready_timeout: Duration,
    pub descriptors: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub ignore: Vec<String>,
    pub delay: Duration,
    pub watch_files: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushConfig {
    pub cmd: String,
    pub options: PushOptions,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        component: ComponentConfig,
        watch: WatchConfig,
        push: PushConfig,
    ) -> Self {
        Self {
            component,
            watch,
            push,
        }
    }

    /// Parameters for a watch session on this component.
    pub fn watch_parameters(&self) -> WatchParameters {
        let mut params = WatchParameters::new(&self.component.name, &self.component.path)
            .with_ignores(self.watch.ignore.clone())
            .with_delay(self.watch.delay)
            .with_watch_files(self.watch.watch_files)
            .with_descriptor_paths(
                self.component
                    .descriptors
                    .iter()
                    .map(|d| self.component.path.join(d))
                    .collect(),
            );
        params.application_name = self.component.application.clone();
        params.push = self.push.options.clone();
        params
    }
}
