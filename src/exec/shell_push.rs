// src/exec/shell_push.rs

//! Push handler that runs a shell command.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use crate::engine::{ComponentStatus, PushFuture, PushHandler, PushParameters};
use crate::errors::PushError;

/// Exit codes a shell uses when the command cannot be found or executed.
/// Retrying on the next change cannot help, so these stop the session.
const FATAL_EXIT_CODES: [i32; 2] = [126, 127];

const STDERR_TAIL: usize = 5;

/// Runs the configured command once per push, in the component directory.
///
/// The batch is described through environment variables:
///
/// | variable             | value                                   |
/// |----------------------|-----------------------------------------|
/// | `ODO_COMPONENT`      | component name                          |
/// | `ODO_APPLICATION`    | application name                        |
/// | `ODO_CHANGED_FILES`  | changed paths, newline separated        |
/// | `ODO_DELETED_FILES`  | deleted paths, newline separated        |
/// | `ODO_IGNORES`        | ignore globs, newline separated         |
/// | `ODO_SCAN_INDEX`     | `true` when the whole tree must be sent |
/// | `ODO_FORCED`         | `true` for manual syncs                 |
/// | `ODO_BUILD_CMD`, `ODO_RUN_CMD`, `ODO_DEBUG_CMD` | overrides, when set |
/// | `ODO_DEBUG`, `ODO_DEBUG_PORT`, `ODO_RANDOM_PORTS` | push options |
#[derive(Debug, Clone)]
pub struct ShellPushHandler {
    cmd: String,
}

impl ShellPushHandler {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }

    fn command(&self, params: &PushParameters) -> Command {
        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&self.cmd);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&self.cmd);
            c
        };

        if params.path.is_dir() {
            cmd.current_dir(&params.path);
        }
        for (key, value) in push_env(params) {
            cmd.env(key, value);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    async fn run(&self, params: PushParameters) -> Result<Result<(), PushError>> {
        info!(
            cmd = %self.cmd,
            changed = params.changed_files.len(),
            deleted = params.deleted_files.len(),
            "running push command"
        );

        let mut child = self
            .command(&params)
            .spawn()
            .with_context(|| format!("spawning push command '{}'", self.cmd))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Always consume stdout so buffers don't fill; log at debug.
        let stdout_task = tokio::spawn(async move {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("push stdout: {}", line);
                }
            }
        });
        let stderr_task = tokio::spawn(async move {
            let mut tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL);
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!("push stderr: {}", line);
                    if tail.len() == STDERR_TAIL {
                        tail.pop_front();
                    }
                    tail.push_back(line);
                }
            }
            tail
        });

        let status = child
            .wait()
            .await
            .with_context(|| format!("waiting for push command '{}'", self.cmd))?;
        if let Err(err) = stdout_task.await {
            debug!(error = %err, "push stdout reader ended abnormally");
        }
        let tail: Vec<String> = match stderr_task.await {
            Ok(tail) => tail.into(),
            Err(err) => {
                debug!(error = %err, "push stderr reader ended abnormally");
                Vec::new()
            }
        };

        let code = status.code().unwrap_or(-1);
        info!(exit_code = code, success = status.success(), "push command exited");

        if status.success() {
            return Ok(Ok(()));
        }

        let mut message = format!("push command exited with status {code}");
        if !tail.is_empty() {
            message.push_str(": ");
            message.push_str(&tail.join("; "));
        }
        if FATAL_EXIT_CODES.contains(&code) {
            Ok(Err(PushError::Fatal(message)))
        } else {
            Ok(Err(PushError::Failed(message)))
        }
    }
}

impl PushHandler for ShellPushHandler {
    fn push<'a>(
        &'a mut self,
        params: PushParameters,
        _status: &'a mut ComponentStatus,
    ) -> PushFuture<'a> {
        Box::pin(async move {
            match self.run(params).await {
                Ok(outcome) => outcome,
                Err(err) => Err(PushError::Failed(format!("{err:#}"))),
            }
        })
    }
}

fn join_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.to_string_lossy())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Environment describing one push.
pub fn push_env(params: &PushParameters) -> Vec<(&'static str, String)> {
    let mut env = vec![
        ("ODO_COMPONENT", params.component_name.clone()),
        ("ODO_APPLICATION", params.application_name.clone()),
        ("ODO_PATH", display(&params.path)),
        ("ODO_CHANGED_FILES", join_paths(&params.changed_files)),
        ("ODO_DELETED_FILES", join_paths(&params.deleted_files)),
        ("ODO_IGNORES", params.ignored_files.join("\n")),
        ("ODO_SCAN_INDEX", params.scan_index.to_string()),
        ("ODO_FORCED", params.forced.to_string()),
        ("ODO_DEBUG", params.options.debug.to_string()),
        ("ODO_RANDOM_PORTS", params.options.random_ports.to_string()),
    ];
    let opts = &params.options;
    let optional = [
        ("ODO_BUILD_CMD", opts.build_cmd.clone()),
        ("ODO_RUN_CMD", opts.run_cmd.clone()),
        ("ODO_DEBUG_CMD", opts.debug_cmd.clone()),
        ("ODO_DEBUG_PORT", opts.debug_port.map(|p| p.to_string())),
    ];
    env.extend(
        optional
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v))),
    );
    env
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
