use std::fmt;
use std::str::FromStr;

/// Coarse lifecycle state of the remote dev workload.
///
/// - `WaitDeployment`: the deployment (or its pod) is not available yet, or
///   was replaced. Initial state of every session.
/// - `SyncOutdated`: a sync is in flight; local sources are ahead of the
///   container.
/// - `Ready`: the workload is up and in sync; only here may files be pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentState {
    WaitDeployment,
    SyncOutdated,
    Ready,
}

impl Default for ComponentState {
    fn default() -> Self {
        ComponentState::WaitDeployment
    }
}

impl fmt::Display for ComponentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentState::WaitDeployment => "wait_deployment",
            ComponentState::SyncOutdated => "sync_outdated",
            ComponentState::Ready => "ready",
        };
        f.write_str(s)
    }
}

impl FromStr for ComponentState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wait_deployment" => Ok(ComponentState::WaitDeployment),
            "sync_outdated" => Ok(ComponentState::SyncOutdated),
            "ready" => Ok(ComponentState::Ready),
            other => Err(format!(
                "invalid component state: {other} (expected \"wait_deployment\", \"sync_outdated\" or \"ready\")"
            )),
        }
    }
}

/// A command typed by the user while dev mode is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// `p`: push the sources now, even if nothing changed.
    Sync,
    /// `q` / Ctrl+C: leave dev mode.
    Exit,
}
