// src/watch/mod.rs

//! Source tree watching and change detection.
//!
//! This module is responsible for:
//! - Compiling ignore globs relative to the component root.
//! - Wiring up a cross-platform filesystem watcher (`notify`) with one
//!   non-recursive watch per non-ignored directory.
//! - Turning batches of raw events into changed / deleted path lists.
//!
//! It does **not** know about pushes, debouncing or cluster state; the
//! engine owns accumulation and timing.

pub mod debatcher;
pub mod detector;
pub mod events;
pub mod path_utils;
pub mod patterns;

pub use debatcher::{evaluate_file_changes, FileChanges};
pub use detector::{SourceStreams, SourceWatcher};
pub use events::{FileEvent, FileOp};
pub use patterns::IgnoreMatcher;
