use std::sync::{Arc, Mutex};

use provisioner::exec::{LineSink, OutputLine};

/// Collects every output line in memory.
#[derive(Clone, Default)]
pub struct CollectingSink {
    lines: Arc<Mutex<Vec<OutputLine>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<OutputLine> {
        self.lines.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines().into_iter().map(|l| l.text).collect()
    }
}

impl LineSink for CollectingSink {
    fn emit(&self, line: OutputLine) {
        self.lines.lock().unwrap().push(line);
    }
}
