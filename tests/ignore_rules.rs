// tests/ignore_rules.rs

use std::error::Error;
use std::fs;
use std::path::Path;

use proptest::prelude::*;

use odo_watch::fs::RealFileSystem;
use odo_watch::watch::{evaluate_file_changes, FileEvent, FileOp, IgnoreMatcher, SourceWatcher};

type TestResult = Result<(), Box<dyn Error>>;

fn ignores(patterns: &[&str]) -> IgnoreMatcher {
    let owned: Vec<String> = patterns.iter().map(|s| s.to_string()).collect();
    IgnoreMatcher::new(&owned).unwrap()
}

fn write(root: &Path, rel: &str) {
    let p = root.join(rel);
    fs::create_dir_all(p.parent().unwrap()).unwrap();
    fs::write(p, rel).unwrap();
}

#[tokio::test]
async fn ignored_directories_get_no_watch_and_no_changes() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().canonicalize()?;
    write(&root, "src/main.js");
    write(&root, "src/lib/util.js");
    write(&root, "node_modules/react/index.js");
    write(&root, ".git/HEAD");
    write(&root, "build.log");

    let matcher = ignores(&[".git", "node_modules", "*.log"]);
    let (mut detector, _streams) = SourceWatcher::new(&root, matcher.clone())?;

    assert!(detector.is_watched(&root));
    assert!(detector.is_watched(&root.join("src")));
    assert!(detector.is_watched(&root.join("src/lib")));
    assert!(!detector.is_watched(&root.join("node_modules")));
    assert!(!detector.is_watched(&root.join("node_modules/react")));
    assert!(!detector.is_watched(&root.join(".git")));

    let events = vec![
        FileEvent::new(root.join("node_modules/react/index.js"), FileOp::Write),
        FileEvent::new(root.join(".git/HEAD"), FileOp::Write),
        FileEvent::new(root.join("build.log"), FileOp::Write),
        FileEvent::new(root.join("src/main.js"), FileOp::Write),
    ];
    let changes = evaluate_file_changes(&RealFileSystem, &root, &events, &matcher);
    assert_eq!(changes.changed, vec![root.join("src/main.js")]);
    assert!(changes.deleted.is_empty());

    // A new ignored directory stays unwatched when the tree is re-synced.
    write(&root, "node_modules/vue/index.js");
    detector.add_recursive_watch(&root.join("node_modules/vue"))?;
    assert!(!detector.is_watched(&root.join("node_modules/vue")));

    // A new regular directory is picked up.
    write(&root, "src/views/home.js");
    detector.add_recursive_watch(&root.join("src/views"))?;
    assert!(detector.is_watched(&root.join("src/views")));

    detector.remove_watch(&root.join("src"));
    assert!(!detector.is_watched(&root.join("src/lib")));
    assert!(detector.is_watched(&root));
    Ok(())
}

#[tokio::test]
async fn missing_root_is_not_an_error() -> TestResult {
    let dir = tempfile::tempdir()?;
    let root = dir.path().join("not-created-yet");
    let (detector, _streams) = SourceWatcher::new(&root, IgnoreMatcher::empty())?;
    assert_eq!(detector.watched_paths().count(), 0);
    Ok(())
}

#[test]
fn invalid_pattern_is_rejected() {
    assert!(IgnoreMatcher::new(&["src/[".to_string()]).is_err());
}

proptest! {
    #[test]
    fn anything_below_an_ignored_directory_is_ignored(
        prefix in proptest::collection::vec("[a-z]{1,8}", 0..3),
        suffix in proptest::collection::vec("[a-z]{1,8}", 0..4),
    ) {
        let m = ignores(&["node_modules"]);
        let mut parts = prefix.clone();
        parts.push("node_modules".to_string());
        parts.extend(suffix);
        prop_assert!(m.matches(&parts.join("/")));
    }

    #[test]
    fn unrelated_paths_are_not_ignored(
        parts in proptest::collection::vec("[a-z]{1,8}", 1..5),
    ) {
        let m = ignores(&[".git", "node_modules", "*.log"]);
        prop_assert!(!m.matches(&parts.join("/")));
    }
}
