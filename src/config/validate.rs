// src/config/validate.rs

use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{
    ComponentConfig, ConfigFile, PushConfig, RawConfigFile, RawPushSection, WatchConfig,
};
use crate::engine::PushOptions;
use crate::errors::{OdoWatchError, Result};
use crate::watch::IgnoreMatcher;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = OdoWatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let component = validate_component(&raw)?;
        let watch = validate_watch(&raw)?;
        let push = validate_push(raw.push)?;
        Ok(ConfigFile::new_unchecked(component, watch, push))
    }
}

fn validate_component(raw: &RawConfigFile) -> Result<ComponentConfig> {
    let name = raw.component.name.trim();
    if name.is_empty() {
        return Err(OdoWatchError::ConfigError(
            "[component].name must not be empty".to_string(),
        ));
    }
    let application = match raw.component.application.trim() {
        "" => "app".to_string(),
        app => app.to_string(),
    };
    let ready_timeout = duration_field("[component].ready_timeout", &raw.component.ready_timeout)?;
    if ready_timeout.is_zero() {
        return Err(OdoWatchError::ConfigError(
            "[component].ready_timeout must be greater than zero".to_string(),
        ));
    }

    Ok(ComponentConfig {
        name: name.to_string(),
        application,
        path: raw.component.path.clone(),
        ready_timeout,
        descriptors: raw.component.descriptors.clone(),
    })
}

fn validate_watch(raw: &RawConfigFile) -> Result<WatchConfig> {
    let delay = duration_field("[watch].delay", &raw.watch.delay)?;
    validate_ignores(&raw.watch.ignore)?;
    Ok(WatchConfig {
        ignore: raw.watch.ignore.clone(),
        delay,
        watch_files: raw.watch.watch_files,
    })
}

fn validate_push(raw: RawPushSection) -> Result<PushConfig> {
    if raw.cmd.trim().is_empty() {
        return Err(OdoWatchError::ConfigError(
            "[push].cmd must not be empty".to_string(),
        ));
    }
    if raw.debug_port == Some(0) {
        return Err(OdoWatchError::ConfigError(
            "[push].debug_port must be between 1 and 65535".to_string(),
        ));
    }

    Ok(PushConfig {
        cmd: raw.cmd,
        options: PushOptions {
            build_cmd: raw.build_cmd,
            run_cmd: raw.run_cmd,
            debug_cmd: raw.debug_cmd,
            debug: raw.debug,
            debug_port: raw.debug_port,
            random_ports: raw.random_ports,
        },
    })
}

/// Parse a duration-valued field, naming the field in the error.
pub fn duration_field(field: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| OdoWatchError::ConfigError(format!("{field}: {e}")))
}

/// Check that every ignore pattern compiles.
pub fn validate_ignores(patterns: &[String]) -> Result<()> {
    IgnoreMatcher::new(patterns)
        .map(|_| ())
        .map_err(|e| OdoWatchError::ConfigError(format!("invalid ignore pattern: {e}")))
}
