// tests/config_loading.rs

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use odo_watch::apply_cli_overrides;
use odo_watch::cli::CliArgs;
use odo_watch::config::{load_and_validate, load_from_str};
use odo_watch::errors::OdoWatchError;

type TestResult = Result<(), Box<dyn Error>>;

const FULL: &str = r#"
[component]
name = "nodejs"
application = "shop"
path = "web"
ready_timeout = "30s"
descriptors = ["devfile.yaml"]

[watch]
ignore = [".git", "node_modules"]
delay = "500ms"
watch_files = true

[push]
cmd = "rsync -a ./ dev:/projects"
run_cmd = "devrun"
debug = true
debug_port = 5858
"#;

#[test]
fn full_file_is_loaded_and_path_is_relative_to_the_config() -> TestResult {
    let dir = tempfile::tempdir()?;
    let cfg_path = dir.path().join("odo-watch.toml");
    fs::write(&cfg_path, FULL)?;

    let cfg = load_and_validate(&cfg_path)?;
    assert_eq!(cfg.component.name, "nodejs");
    assert_eq!(cfg.component.application, "shop");
    assert_eq!(cfg.component.path, dir.path().join("web"));
    assert_eq!(cfg.component.ready_timeout, Duration::from_secs(30));
    assert_eq!(cfg.watch.delay, Duration::from_millis(500));
    assert_eq!(cfg.push.options.run_cmd.as_deref(), Some("devrun"));
    assert_eq!(cfg.push.options.debug_port, Some(5858));

    let params = cfg.watch_parameters();
    assert_eq!(params.application_name, "shop");
    assert_eq!(params.ignores, vec![".git".to_string(), "node_modules".to_string()]);
    assert!(params.push.debug);
    assert_eq!(params.descriptor_paths, vec![dir.path().join("web").join("devfile.yaml")]);
    Ok(())
}

#[test]
fn defaults_apply_to_a_minimal_file() -> TestResult {
    let cfg = load_from_str(
        r#"
        [component]
        name = "api"
        [push]
        cmd = "true"
        "#,
    )?;
    assert_eq!(cfg.component.application, "app");
    assert_eq!(cfg.component.path, PathBuf::from("."));
    assert_eq!(cfg.watch.delay, Duration::from_secs(1));
    assert_eq!(cfg.watch.ignore, vec![".git".to_string()]);
    assert!(cfg.watch.watch_files);
    assert!(cfg.watch_parameters().descriptor_paths.is_empty());
    Ok(())
}

#[test]
fn invalid_values_are_config_errors() {
    let cases = [
        (r#"[component]
name = " "
[push]
cmd = "true""#, "[component].name"),
        (r#"[component]
name = "api"
[push]
cmd = """#, "[push].cmd"),
        (r#"[component]
name = "api"
[watch]
delay = "soon"
[push]
cmd = "true""#, "[watch].delay"),
        (r#"[component]
name = "api"
[watch]
ignore = ["src/["]
[push]
cmd = "true""#, "invalid ignore pattern"),
    ];

    for (toml, needle) in cases {
        match load_from_str(toml) {
            Err(OdoWatchError::ConfigError(msg)) => {
                assert!(msg.contains(needle), "{msg:?} should mention {needle:?}")
            }
            other => panic!("expected a config error for {needle}, got {other:?}"),
        }
    }
}

#[test]
fn missing_required_section_is_a_toml_error() {
    let err = load_from_str("[component]\nname = \"api\"\n").unwrap_err();
    assert!(matches!(err, OdoWatchError::TomlError(_)));
}

#[test]
fn cli_flags_override_the_file() -> TestResult {
    let mut cfg = load_from_str(FULL)?;
    let args = CliArgs::parse_from([
        "odo-watch",
        "--path",
        "/srv/app",
        "--delay",
        "0s",
        "--ignore",
        "*.tmp",
        "--no-watch",
    ]);
    apply_cli_overrides(&mut cfg, &args)?;

    assert_eq!(cfg.component.path, PathBuf::from("/srv/app"));
    assert_eq!(cfg.watch.delay, Duration::ZERO);
    assert_eq!(cfg.watch.ignore.last().map(String::as_str), Some("*.tmp"));
    assert!(!cfg.watch.watch_files);

    let bad = CliArgs::parse_from(["odo-watch", "--delay", "fast"]);
    assert!(apply_cli_overrides(&mut cfg, &bad).is_err());
    Ok(())
}
