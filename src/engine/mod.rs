// src/engine/mod.rs

//! Orchestration engine for a dev-mode watch session.
//!
//! This module ties together:
//! - the pending change accumulator shared with file ingestion
//! - the component state machine gating pushes
//! - the main event loop that reacts to:
//!   - settled file changes
//!   - component descriptor changes
//!   - cluster status events
//!   - keyboard commands
//!   - cancellation
//!
//! The loop itself lives in [`event_loop`]; everything it consults is a
//! plain synchronous type that can be tested on its own.

pub mod backoff;
pub mod descriptor;
pub mod event_loop;
pub mod params;
pub mod pending;
pub mod push;
pub mod status;

pub use backoff::ExpBackoff;
pub use descriptor::DESCRIPTOR_DEBOUNCE;
pub use event_loop::WatchSession;
pub use params::{PushOptions, WatchParameters, DEFAULT_DELAY};
pub use pending::{ChangeBatch, PendingChangeSet};
pub use push::{PushFuture, PushHandler, PushParameters, PUSH_ERROR_STRING};
pub use status::{ComponentStatus, Transition};
