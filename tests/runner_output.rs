mod common;
use crate::common::{init_tracing, sh, test_runner, with_timeout, TestResult};

use std::time::Duration;

use provisioner::errors::ProvisionError;
use provisioner::exec::CommandSpec;

#[tokio::test]
async fn every_line_arrives_once_in_order_tagged_with_pid() -> TestResult {
    init_tracing();
    let (runner, sink, _signals) = test_runner(Duration::from_secs(5));

    let report = with_timeout(runner.run(&sh("i=1; while [ $i -le 200 ]; do echo line-$i; i=$((i+1)); done"))).await?;

    let expected: Vec<String> = (1..=200).map(|i| format!("line-{i}")).collect();
    assert_eq!(sink.texts(), expected);
    assert_eq!(report.lines, 200);
    assert!(report.status.success());
    assert_eq!(report.handle.pid, report.handle.pgid);
    assert!(report.forwarded.is_none());
    assert!(!report.force_killed);

    for line in sink.lines() {
        assert_eq!(line.program, "sh");
        assert_eq!(line.pid, report.handle.pid);
    }
    Ok(())
}

#[tokio::test]
async fn stderr_is_merged_into_the_same_stream() -> TestResult {
    init_tracing();
    let (runner, sink, _signals) = test_runner(Duration::from_secs(5));

    with_timeout(runner.run(&sh("echo out-1; echo err-1 >&2; echo out-2; echo err-2 >&2"))).await?;

    assert_eq!(sink.texts(), vec!["out-1", "err-1", "out-2", "err-2"]);
    Ok(())
}

#[tokio::test]
async fn unterminated_last_line_is_flushed() -> TestResult {
    init_tracing();
    let (runner, sink, _signals) = test_runner(Duration::from_secs(5));

    let report = with_timeout(runner.run(&sh("printf 'a\\nb'"))).await?;

    assert_eq!(sink.texts(), vec!["a", "b"]);
    assert_eq!(report.lines, 2);
    Ok(())
}

#[tokio::test]
async fn env_overrides_are_added_to_inherited_environment() -> TestResult {
    init_tracing();
    let (runner, sink, _signals) = test_runner(Duration::from_secs(5));

    let spec = sh("echo \"$PROVISIONER_TEST_VALUE\"; test -n \"$PATH\" && echo path-kept")
        .env("PROVISIONER_TEST_VALUE", "-F inventory/vagrant.ssh_config");
    with_timeout(runner.run(&spec)).await?;

    assert_eq!(
        sink.texts(),
        vec!["-F inventory/vagrant.ssh_config", "path-kept"]
    );
    Ok(())
}

#[tokio::test]
async fn non_zero_exit_names_the_command() {
    init_tracing();
    let (runner, sink, _signals) = test_runner(Duration::from_secs(5));

    let spec = sh("echo before-failure; exit 7");
    let err = with_timeout(runner.run(&spec)).await.unwrap_err();

    match &err {
        ProvisionError::Exit { command, status, pid } => {
            assert_eq!(command, &spec);
            assert_eq!(status.code(), Some(7));
            assert!(*pid > 0);
        }
        other => panic!("expected Exit, got {other:?}"),
    }
    assert_eq!(err.command(), Some(&spec));
    assert_eq!(sink.texts(), vec!["before-failure"]);
}

#[tokio::test]
async fn missing_program_is_a_spawn_error() {
    init_tracing();
    let (runner, sink, signals) = test_runner(Duration::from_secs(5));

    let spec = CommandSpec::new("provisioner-no-such-program-xyz").arg("--version");
    let err = with_timeout(runner.run(&spec)).await.unwrap_err();

    assert!(
        matches!(&err, ProvisionError::Spawn { command, .. } if command == &spec),
        "expected Spawn, got {err:?}"
    );
    assert!(sink.texts().is_empty());
    assert_eq!(signals.live_subscriptions(), 0);
}

#[tokio::test]
async fn current_dir_is_applied() -> TestResult {
    init_tracing();
    let (runner, sink, _signals) = test_runner(Duration::from_secs(5));
    let dir = tempfile::tempdir()?;

    with_timeout(runner.run(&sh("pwd -P").current_dir(dir.path()))).await?;

    let expected = dir.path().canonicalize()?;
    assert_eq!(sink.texts(), vec![expected.display().to_string()]);
    Ok(())
}

#[tokio::test]
async fn background_child_holding_the_pipe_does_not_block_return() -> TestResult {
    init_tracing();
    let (runner, sink, _signals) = test_runner(Duration::from_secs(5));

    let started = std::time::Instant::now();
    with_timeout(runner.run(&sh("echo parent-done; (sleep 3) &"))).await?;

    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(sink.texts(), vec!["parent-done"]);
    Ok(())
}
