#![allow(dead_code)]
#![allow(unused_imports)]

pub use provisioner_test_utils::builders::{sh, ConfigBuilder};
pub use provisioner_test_utils::{
    init_tracing, wait_for_path, with_timeout, ChannelSignals, CollectingSink, RecordingRunner,
};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use provisioner::exec::SupervisedRunner;

pub type TestResult = Result<(), Box<dyn Error>>;

/// A runner whose output is collected and whose signals come from the test.
pub fn test_runner(grace_period: Duration) -> (SupervisedRunner, CollectingSink, ChannelSignals) {
    let sink = CollectingSink::new();
    let signals = ChannelSignals::new();
    let runner = SupervisedRunner::new()
        .with_grace_period(grace_period)
        .with_sink(Arc::new(sink.clone()))
        .with_signal_source(Arc::new(signals.clone()));
    (runner, sink, signals)
}
