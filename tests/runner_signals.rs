mod common;
use crate::common::{init_tracing, sh, test_runner, wait_for_path, TestResult};

use std::os::unix::process::ExitStatusExt;
use std::time::{Duration, Instant};

use nix::sys::signal::Signal;
use tokio::time::timeout;

use provisioner::errors::ProvisionError;

const LIMIT: Duration = Duration::from_secs(10);

#[tokio::test]
async fn trapped_signal_within_grace_period_succeeds() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let ready = dir.path().join("ready");
    let (runner, sink, signals) = test_runner(Duration::from_secs(5));

    let spec = sh(&format!(
        "trap 'echo got-term; exit 0' TERM; touch {}; while :; do sleep 0.05; done",
        ready.display()
    ));
    let run = tokio::spawn(async move { runner.run(&spec).await });

    wait_for_path(&ready, LIMIT).await;
    assert!(signals.send(Signal::SIGTERM));

    let report = timeout(LIMIT, run).await??.map_err(|e| format!("run failed: {e}"))?;
    assert_eq!(report.forwarded, Some(Signal::SIGTERM));
    assert!(!report.force_killed);
    assert!(report.status.success());
    assert!(sink.texts().contains(&"got-term".to_string()));
    assert_eq!(signals.live_subscriptions(), 0);
    Ok(())
}

#[tokio::test]
async fn trapped_signal_with_failing_exit_reports_the_code() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let ready = dir.path().join("ready");
    let (runner, _sink, signals) = test_runner(Duration::from_secs(5));

    let spec = sh(&format!(
        "trap 'exit 3' INT; touch {}; while :; do sleep 0.05; done",
        ready.display()
    ));
    let expected = spec.clone();
    let run = tokio::spawn(async move { runner.run(&spec).await });

    wait_for_path(&ready, LIMIT).await;
    assert!(signals.send(Signal::SIGINT));

    let err = timeout(LIMIT, run).await??.unwrap_err();
    match err {
        ProvisionError::Exit { command, status, .. } => {
            assert_eq!(command, expected);
            assert_eq!(status.code(), Some(3));
        }
        other => panic!("expected Exit, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn ignored_signal_escalates_to_group_kill() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let ready = dir.path().join("ready");
    let late = dir.path().join("late");
    let grace = Duration::from_millis(300);
    let (runner, _sink, signals) = test_runner(grace);

    // The background subshell is a second member of the child's group.
    let spec = sh(&format!(
        "trap '' TERM HUP; (sleep 1; touch {}) & touch {}; sleep 30",
        late.display(),
        ready.display()
    ));
    let run = tokio::spawn(async move { runner.run(&spec).await });

    wait_for_path(&ready, LIMIT).await;
    let sent = Instant::now();
    assert!(signals.send(Signal::SIGHUP));

    let err = timeout(LIMIT, run).await??.unwrap_err();
    let elapsed = sent.elapsed();
    match err {
        ProvisionError::Exit { status, .. } => {
            assert_eq!(status.signal(), Some(Signal::SIGKILL as i32));
        }
        other => panic!("expected Exit, got {other:?}"),
    }
    assert!(elapsed >= grace, "killed before grace period: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "kill took {elapsed:?}");

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!late.exists(), "group member survived the kill");
    assert_eq!(signals.live_subscriptions(), 0);
    Ok(())
}

#[tokio::test]
async fn subscription_lives_exactly_as_long_as_the_run() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let ready = dir.path().join("ready");
    let (runner, _sink, signals) = test_runner(Duration::from_secs(5));
    assert_eq!(signals.live_subscriptions(), 0);

    let spec = sh(&format!("touch {}; sleep 0.3", ready.display()));
    let run = tokio::spawn({
        let runner = runner.clone();
        async move { runner.run(&spec).await }
    });

    wait_for_path(&ready, LIMIT).await;
    assert_eq!(signals.live_subscriptions(), 1);

    timeout(LIMIT, run).await??.map_err(|e| format!("run failed: {e}"))?;
    assert_eq!(signals.live_subscriptions(), 0);

    runner.run(&sh("true")).await?;
    assert_eq!(signals.live_subscriptions(), 0);
    assert_eq!(signals.total_subscriptions(), 2);
    Ok(())
}

#[tokio::test]
async fn second_signal_during_grace_period_keeps_the_original_deadline() -> TestResult {
    init_tracing();
    let dir = tempfile::tempdir()?;
    let ready = dir.path().join("ready");
    let grace = Duration::from_millis(400);
    let (runner, _sink, signals) = test_runner(grace);

    let spec = sh(&format!(
        "trap '' TERM INT; touch {}; sleep 30",
        ready.display()
    ));
    let run = tokio::spawn({
        let runner = runner.clone();
        async move { runner.run(&spec).await }
    });

    wait_for_path(&ready, LIMIT).await;
    let sent = Instant::now();
    assert!(signals.send(Signal::SIGTERM));
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(signals.send(Signal::SIGINT));

    let err = timeout(LIMIT, run).await??.unwrap_err();
    let elapsed = sent.elapsed();
    match err {
        ProvisionError::Exit { status, .. } => {
            assert_eq!(status.signal(), Some(Signal::SIGKILL as i32));
        }
        other => panic!("expected Exit, got {other:?}"),
    }
    assert!(elapsed >= grace, "killed before grace period: {elapsed:?}");
    // A restarted deadline would land at 650ms.
    assert!(elapsed < Duration::from_millis(600), "deadline moved: {elapsed:?}");
    assert_eq!(signals.live_subscriptions(), 0);

    // The unread SIGINT must not reach the next run.
    let report = runner.run(&sh("sleep 0.1")).await?;
    assert_eq!(report.forwarded, None);
    assert!(report.status.success());
    Ok(())
}

#[tokio::test]
async fn signal_with_no_run_in_progress_is_not_replayed() -> TestResult {
    init_tracing();
    let (runner, _sink, signals) = test_runner(Duration::from_secs(5));

    assert!(!signals.send(Signal::SIGTERM));

    let report = runner.run(&sh("sleep 0.1; echo done")).await?;
    assert_eq!(report.forwarded, None);
    assert!(!report.force_killed);
    Ok(())
}
