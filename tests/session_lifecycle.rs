// tests/session_lifecycle.rs

mod common;
use crate::common::{
    init_tracing, params, path, watching_params, with_timeout, Harness, PushBehaviour,
    RecordingPushHandler,
};

use std::error::Error;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;

use odo_watch::engine::PUSH_ERROR_STRING;
use odo_watch::errors::WatchError;
use odo_watch::types::{ComponentState, KeyCommand};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test(start_paused = true)]
async fn failed_push_is_reported_and_the_loop_keeps_going() -> TestResult {
    init_tracing();

    let handler = RecordingPushHandler::new().script([PushBehaviour::Fail]);
    let (h, session) = Harness::new(watching_params(Duration::from_secs(1)), handler);
    let task = h.spawn(session);

    h.touch("a.js");
    with_timeout(h.handler.wait_for(1)).await;
    assert!(h.out.contains(&format!("{PUSH_ERROR_STRING} - sync failed")));
    assert!(
        !h.out.contains("Watching for changes"),
        "no banner before a successful push"
    );

    h.touch("b.js");
    let records = with_timeout(h.handler.wait_for(2)).await;
    assert_eq!(records[1].params.changed_files, vec![path("b.js")]);
    assert!(
        records[1].params.scan_index,
        "nothing was pushed successfully yet"
    );
    assert_eq!(records[1].state, ComponentState::SyncOutdated);
    assert!(!task.is_finished());

    h.cancel.cancel();
    let res = with_timeout(task).await?;
    assert!(matches!(res, Err(WatchError::Interrupted)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn failed_push_without_file_watching_ends_the_session() -> TestResult {
    init_tracing();

    let handler = RecordingPushHandler::new().script([PushBehaviour::Fail]);
    let (h, session) = Harness::new(params(Duration::from_secs(1)), handler);
    let task = h.spawn(session);

    h.touch("a.js");

    match with_timeout(task).await? {
        Err(WatchError::Push(msg)) => assert_eq!(msg, "sync failed"),
        other => panic!("expected the push error to end the session, got {other:?}"),
    }
    assert_eq!(h.handler.count(), 1);
    assert!(!h.out.contains(PUSH_ERROR_STRING));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn watcher_error_ends_the_session() -> TestResult {
    init_tracing();

    let (h, session) = Harness::new(params(Duration::from_secs(1)), RecordingPushHandler::new());
    let task = h.spawn(session);

    sleep(Duration::from_millis(100)).await;
    h.fail_watcher("inotify event queue overflowed");

    let err = with_timeout(task).await?.unwrap_err();
    assert!(!err.is_user_exit(), "watcher failure must not look like an exit");
    match err {
        WatchError::Notify(e) => assert!(e.to_string().contains("inotify event queue overflowed")),
        other => panic!("expected a watcher error, got {other:?}"),
    }
    assert_eq!(h.handler.count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn fatal_push_error_ends_the_session() -> TestResult {
    init_tracing();

    let handler = RecordingPushHandler::new().script([PushBehaviour::Fatal]);
    let (h, session) = Harness::new(params(Duration::from_secs(1)), handler);
    let task = h.spawn(session);

    h.touch("a.js");

    match with_timeout(task).await? {
        Err(WatchError::FatalPush(msg)) => assert_eq!(msg, "port forwarding failed"),
        other => panic!("expected a fatal push error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn cancelling_an_idle_session_is_a_user_exit() -> TestResult {
    init_tracing();

    let (h, session) = Harness::new(params(Duration::from_secs(1)), RecordingPushHandler::new());
    let task = h.spawn(session);

    sleep(Duration::from_secs(3)).await;
    h.cancel.cancel();

    let err = with_timeout(task).await?.unwrap_err();
    assert!(err.is_user_exit());
    assert_eq!(h.handler.count(), 0);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn manual_sync_pushes_without_changes_and_exit_key_stops() -> TestResult {
    init_tracing();

    let (keys_tx, keys_rx) = mpsc::channel(8);
    let (h, session) = Harness::new(params(Duration::from_secs(5)), RecordingPushHandler::new());
    let task = h.spawn(session.with_key_commands(keys_rx));

    keys_tx.send(KeyCommand::Sync).await?;
    let records = with_timeout(h.handler.wait_for(1)).await;
    let push = &records[0];
    assert!(push.params.forced);
    assert!(push.params.changed_files.is_empty());
    assert!(push.params.deleted_files.is_empty());

    let out = h.out.contents();
    assert!(out.contains("Manually syncing files"));
    assert!(out.contains(" Keyboard Commands:"));
    assert!(out.contains("[p]      - Manually sync / push files to the cluster"));

    keys_tx.send(KeyCommand::Exit).await?;
    let res = with_timeout(task).await?;
    assert!(matches!(res, Err(WatchError::Interrupted)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn closed_key_channel_does_not_stop_the_session() -> TestResult {
    init_tracing();

    let (keys_tx, keys_rx) = mpsc::channel::<KeyCommand>(8);
    let (h, session) = Harness::new(params(Duration::from_secs(1)), RecordingPushHandler::new());
    let task = h.spawn(session.with_key_commands(keys_rx));

    drop(keys_tx);
    h.touch("a.js");
    with_timeout(h.handler.wait_for(1)).await;
    assert!(!task.is_finished());

    h.cancel.cancel();
    with_timeout(task).await?.unwrap_err();
    Ok(())
}
