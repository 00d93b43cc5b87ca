// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs the configured push command with `tokio::process::Command` and maps
//! its exit status onto [`crate::errors::PushError`].

pub mod shell_push;

pub use shell_push::{push_env, ShellPushHandler};
