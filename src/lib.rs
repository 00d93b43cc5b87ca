// src/lib.rs

pub mod cli;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod keyboard;
pub mod logging;
pub mod output;
pub mod types;
pub mod watch;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::cluster::labels::{component_labels, component_selector};
use crate::cluster::{wait_for_component, StaticStatusSource, StatusSource};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::config::{duration_field, validate_ignores};
use crate::engine::WatchSession;
use crate::exec::ShellPushHandler;
use crate::keyboard::{spawn_key_watcher, CrosstermTerminal};
use crate::output::Printer;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and CLI overrides
/// - the startup readiness wait
/// - the push handler and status source
/// - the keyboard watcher (when stdin is a terminal)
/// - Ctrl-C handling
/// - the watch session itself
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let mut cfg = load_and_validate(&config_path)?;
    apply_cli_overrides(&mut cfg, &args)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let params = cfg.watch_parameters();
    let selector = component_selector(&params.component_name, &params.application_name);
    let labels: BTreeMap<String, String> =
        component_labels(&params.component_name, &params.application_name)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
    let source: Arc<dyn StatusSource> =
        Arc::new(StaticStatusSource::new(&params.component_name, labels));

    let mut console = Printer::new(Box::new(std::io::stdout()));
    match wait_for_component(source.as_ref(), &selector, cfg.component.ready_timeout).await {
        Ok(()) => console.success(format!("Component {} is ready", params.component_name)),
        Err(err) => {
            warn!(error = %err, "component not ready at startup");
            console.warning(format!("Component is not ready yet: {err}"));
        }
    }

    let cancel = CancellationToken::new();

    // Ctrl-C → graceful shutdown. In raw mode the keyboard watcher reports
    // Ctrl+C instead.
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            cancel.cancel();
        });
    }

    let handler = Box::new(ShellPushHandler::new(cfg.push.cmd.clone()));
    let mut session = WatchSession::new(params, handler, Box::new(std::io::stdout()))
        .with_status_source(source);

    let key_task = if CrosstermTerminal::is_available() {
        let (keys, handle) =
            spawn_key_watcher(Box::new(CrosstermTerminal::new()), cancel.child_token());
        session = session.with_key_commands(keys).with_raw_line_endings(true);
        Some(handle)
    } else {
        debug!("stdin is not a terminal; keyboard commands disabled");
        None
    };

    let result = session.run(cancel.clone()).await;

    // Stop the keyboard watcher and wait for it so the terminal is restored
    // before anything else is printed.
    cancel.cancel();
    if let Some(handle) = key_task {
        if let Err(e) = handle.await {
            debug!(error = %e, "keyboard watcher ended abnormally");
        }
    }

    match result {
        Ok(()) => Ok(()),
        Err(err) if err.is_user_exit() => {
            info!("{err}");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

/// Apply command-line overrides on top of the loaded configuration.
pub fn apply_cli_overrides(cfg: &mut ConfigFile, args: &CliArgs) -> Result<()> {
    if let Some(path) = &args.path {
        cfg.component.path = path.clone();
    }
    if let Some(delay) = &args.delay {
        cfg.watch.delay = duration_field("--delay", delay)?;
    }
    if !args.ignores.is_empty() {
        validate_ignores(&args.ignores)?;
        cfg.watch.ignore.extend(args.ignores.iter().cloned());
    }
    if args.no_watch {
        cfg.watch.watch_files = false;
    }
    Ok(())
}

/// Simple dry-run output: print the effective settings.
fn print_dry_run(cfg: &ConfigFile) {
    println!("odo-watch dry-run");
    println!("  component.name = {}", cfg.component.name);
    println!("  component.application = {}", cfg.component.application);
    println!("  component.path = {}", cfg.component.path.display());
    println!("  component.ready_timeout = {:?}", cfg.component.ready_timeout);
    if !cfg.component.descriptors.is_empty() {
        println!("  component.descriptors = {:?}", cfg.component.descriptors);
    }
    println!(
        "  selector = {}",
        component_selector(&cfg.component.name, &cfg.component.application)
    );
    println!();

    println!("watch:");
    println!("  delay: {:?}", cfg.watch.delay);
    println!("  watch_files: {}", cfg.watch.watch_files);
    if !cfg.watch.ignore.is_empty() {
        println!("  ignore: {:?}", cfg.watch.ignore);
    }
    println!();

    let opts = &cfg.push.options;
    println!("push:");
    println!("  cmd: {}", cfg.push.cmd);
    if let Some(ref s) = opts.build_cmd {
        println!("  build_cmd: {s}");
    }
    if let Some(ref s) = opts.run_cmd {
        println!("  run_cmd: {s}");
    }
    if let Some(ref s) = opts.debug_cmd {
        println!("  debug_cmd: {s}");
    }
    if opts.debug {
        println!("  debug: true");
    }
    if let Some(port) = opts.debug_port {
        println!("  debug_port: {port}");
    }
    if opts.random_ports {
        println!("  random_ports: true");
    }

    debug!("dry-run complete (no execution)");
}
