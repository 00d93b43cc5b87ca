// src/engine/push.rs

//! Pluggable push handler abstraction.
//!
//! The event loop never knows how files reach the container. It hands a
//! [`PushParameters`] to a [`PushHandler`]:
//!
//! - [`crate::exec::ShellPushHandler`] runs a configured shell command
//!   (used by the `odo-watch` binary);
//! - tests provide handlers that record calls or fail on demand.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::engine::params::PushOptions;
use crate::engine::status::ComponentStatus;
use crate::errors::PushError;

/// Printed (followed by the error) when a push fails.
pub const PUSH_ERROR_STRING: &str = "Error occurred on Push";

/// Everything a handler needs to sync one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushParameters {
    pub component_name: String,
    pub application_name: String,
    pub path: PathBuf,
    pub changed_files: Vec<PathBuf>,
    pub deleted_files: Vec<PathBuf>,
    pub ignored_files: Vec<String>,
    /// No successful push happened yet on the current workload: the handler
    /// should index the full tree instead of trusting the file lists.
    pub scan_index: bool,
    /// Requested by the user, not by a file change.
    pub forced: bool,
    pub options: PushOptions,
}

pub type PushFuture<'a> = Pin<Box<dyn Future<Output = Result<(), PushError>> + Send + 'a>>;

/// Syncs a batch of changes into the running workload.
///
/// The handler gets the component status mutably so it can move the state
/// itself (e.g. back to `WaitDeployment` when it redeployed the workload).
pub trait PushHandler: Send {
    fn push<'a>(
        &'a mut self,
        params: PushParameters,
        status: &'a mut ComponentStatus,
    ) -> PushFuture<'a>;
}
