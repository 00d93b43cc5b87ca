// tests/session_cluster.rs

mod common;
use crate::common::{
    init_tracing, params, path, with_timeout, ChannelStatusSource, Harness, RecordingPushHandler,
};

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::time::sleep;

use odo_watch::cluster::{
    DeploymentStatus, PodEvent, PodInfo, PodPhase, WarningEvent, WARNINGS_FORBIDDEN,
};

type TestResult = Result<(), Box<dyn Error>>;

fn pod(name: &str, created_secs: u64, phase: PodPhase) -> PodInfo {
    PodInfo::new(
        name,
        SystemTime::UNIX_EPOCH + Duration::from_secs(created_secs),
        phase,
    )
}

#[tokio::test(start_paused = true)]
async fn pushes_wait_for_the_workload_and_resume_after_replacement() -> TestResult {
    init_tracing();

    let (source, feed) = ChannelStatusSource::new();
    let (h, session) = Harness::new(params(Duration::from_secs(1)), RecordingPushHandler::new());
    let task = h.spawn(session.with_status_source(Arc::new(source)));

    h.touch("a.js");
    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.handler.count(), 0, "no push while waiting for the deployment");

    feed.deployments
        .send(DeploymentStatus::new("nodejs", 1, 1))
        .await?;
    feed.pods
        .send(PodEvent::Applied(pod("nodejs-1", 1, PodPhase::Running)))
        .await?;

    let records = with_timeout(h.handler.wait_for(1)).await;
    assert!(records[0].params.forced, "becoming ready forces a full sync");
    assert!(records[0].params.scan_index);
    assert_eq!(records[0].params.changed_files, vec![path("a.js")]);

    let out = h.out.contents();
    assert!(out.contains("Deployment: Requested Replicas (1) | Available Replicas (1)"));
    assert!(out.contains(" ✓  Pod is Running"));

    // Replacement: old pod goes away, a new one starts later.
    feed.pods
        .send(PodEvent::Deleted(pod("nodejs-1", 1, PodPhase::Running)))
        .await?;
    sleep(Duration::from_millis(100)).await;
    h.touch("b.js");
    sleep(Duration::from_secs(5)).await;
    assert_eq!(h.handler.count(), 1, "no push while the pod is gone");
    assert!(h.out.contains(" ⚠  No pod exists"));

    feed.pods
        .send(PodEvent::Applied(pod("nodejs-2", 2, PodPhase::Running)))
        .await?;
    let records = with_timeout(h.handler.wait_for(2)).await;
    assert!(records[1].params.scan_index, "new workload needs the whole tree");
    assert_eq!(records[1].params.changed_files, vec![path("b.js")]);

    h.cancel.cancel();
    with_timeout(task).await?.unwrap_err();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn deployment_status_lines_are_not_repeated() -> TestResult {
    init_tracing();

    let (source, feed) = ChannelStatusSource::new();
    let (h, session) = Harness::new(params(Duration::from_secs(1)), RecordingPushHandler::new());
    let task = h.spawn(session.with_status_source(Arc::new(source)));

    for _ in 0..3 {
        feed.deployments
            .send(DeploymentStatus::new("nodejs", 1, 0))
            .await?;
    }
    feed.deployments
        .send(DeploymentStatus::new("nodejs", 1, 1))
        .await?;
    sleep(Duration::from_secs(1)).await;

    assert_eq!(
        h.out
            .count("Deployment: Requested Replicas (1) | Available Replicas (0)"),
        1
    );
    assert_eq!(
        h.out
            .count("Deployment: Requested Replicas (1) | Available Replicas (1)"),
        1
    );

    h.cancel.cancel();
    with_timeout(task).await?.unwrap_err();
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn warnings_are_filtered_by_pod_and_forbidden_is_announced_once() -> TestResult {
    init_tracing();

    let (source, feed) = ChannelStatusSource::new();
    let source = source.forbid_warnings().with_matching_pod("nodejs-1");
    let (h, session) = Harness::new(params(Duration::from_secs(1)), RecordingPushHandler::new());
    let task = h.spawn(session.with_status_source(Arc::new(source)));

    feed.warnings
        .send(WarningEvent {
            involved_object: "nodejs-1".into(),
            message: "Back-off pulling image".into(),
        })
        .await?;
    feed.warnings
        .send(WarningEvent {
            involved_object: "other-0".into(),
            message: "unrelated failure".into(),
        })
        .await?;
    sleep(Duration::from_secs(1)).await;

    assert_eq!(h.out.count(WARNINGS_FORBIDDEN), 1);
    assert!(h.out.contains(" ⚠  Back-off pulling image"));
    assert!(!h.out.contains("unrelated failure"));

    h.cancel.cancel();
    with_timeout(task).await?.unwrap_err();
    Ok(())
}
