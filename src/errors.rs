// src/errors.rs

//! Crate-wide error types.
//!
//! - [`OdoWatchError`] is the application-level error used by config loading
//!   and the `run` entry point.
//! - [`WatchError`] is what a watch session returns. It carries the
//!   user-requested-exit sentinel ([`WatchError::Interrupted`]).
//! - [`PushError`] is returned by push handlers.
//! - [`WaitError`] is returned by the one-shot readiness wait.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OdoWatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Errors that end a watch session.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("error setting up filesystem watcher: {0}")]
    Notify(#[from] notify::Error),

    #[error("unable to walk path {path:?}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("error introspecting path {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] globset::Error),

    #[error("error watching {resource}: {message}")]
    ResourceWatch { resource: String, message: String },

    #[error("fatal push error: {0}")]
    FatalPush(String),

    /// A push failed while no source watch is active, so no later change
    /// would retry it.
    #[error("push failed: {0}")]
    Push(String),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The user asked to leave dev mode (keyboard or cancellation).
    ///
    /// Callers must treat this as a normal termination.
    #[error("Dev mode interrupted by user")]
    Interrupted,
}

impl WatchError {
    pub fn is_user_exit(&self) -> bool {
        matches!(self, WatchError::Interrupted)
    }
}

/// Errors returned by a [`crate::engine::PushHandler`].
#[derive(Error, Debug)]
pub enum PushError {
    /// The push failed but the session may continue; the next change retries.
    #[error("{0}")]
    Failed(String),

    /// The push failed in a way that must stop the session
    /// (e.g. port forwarding could not be set up).
    #[error("{0}")]
    Fatal(String),
}

impl PushError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, PushError::Fatal(_))
    }
}

/// Errors from the one-shot "wait for everything" readiness check.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WaitError {
    #[error("timeout after {0:?} waiting for the component to become ready")]
    Timeout(Duration),

    #[error("pod {pod} entered phase {phase}")]
    PodFailed { pod: String, phase: String },

    #[error("deployment {name} failed: {reason}")]
    DeploymentFailed { name: String, reason: String },

    #[error("{0} watch closed before the resource became ready")]
    StreamClosed(String),

    #[error("unable to watch {resource}: {message}")]
    Watch { resource: String, message: String },

    #[error("readiness checker aborted: {0}")]
    Aborted(String),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, OdoWatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interrupted_is_user_exit() {
        assert!(WatchError::Interrupted.is_user_exit());
        assert!(
            !WatchError::FatalPush("boom".to_string()).is_user_exit()
        );
        assert_eq!(
            WatchError::Interrupted.to_string(),
            "Dev mode interrupted by user"
        );
    }

    #[test]
    fn push_error_fatality() {
        assert!(PushError::Fatal("port".into()).is_fatal());
        assert!(!PushError::Failed("exit 1".into()).is_fatal());
    }
}
