use std::future::Future;
use std::os::unix::process::ExitStatusExt;
use std::pin::Pin;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};

use provisioner::errors::{ProvisionError, Result};
use provisioner::exec::{CommandRunner, CommandSpec, ProcessHandle, RunReport};

type Hook = Box<dyn Fn(&CommandSpec) + Send + Sync>;

/// A fake runner that:
/// - records every command it was asked to run, in order
/// - fails (exit status 1) any command whose rendering contains one of the
///   configured needles, and succeeds otherwise
/// - optionally runs a hook per command, e.g. to create files a real
///   command would have produced.
pub struct RecordingRunner {
    executed: Arc<Mutex<Vec<CommandSpec>>>,
    fail_on: Vec<String>,
    hook: Option<Hook>,
}

impl RecordingRunner {
    pub fn new() -> Self {
        Self {
            executed: Arc::new(Mutex::new(Vec::new())),
            fail_on: Vec::new(),
            hook: None,
        }
    }

    pub fn failing_on(mut self, needle: &str) -> Self {
        self.fail_on.push(needle.to_string());
        self
    }

    pub fn with_hook(mut self, hook: impl Fn(&CommandSpec) + Send + Sync + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn executed(&self) -> Vec<CommandSpec> {
        self.executed.lock().unwrap().clone()
    }

    /// `Display` renderings of the executed commands.
    pub fn executed_rendered(&self) -> Vec<String> {
        self.executed().iter().map(|c| c.to_string()).collect()
    }
}

impl Default for RecordingRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for RecordingRunner {
    fn execute<'a>(
        &'a self,
        spec: &'a CommandSpec,
    ) -> Pin<Box<dyn Future<Output = Result<RunReport>> + Send + 'a>> {
        Box::pin(async move {
            {
                let mut guard = self.executed.lock().unwrap();
                guard.push(spec.clone());
            }
            if let Some(hook) = &self.hook {
                hook(spec);
            }

            let rendered = spec.to_string();
            if self.fail_on.iter().any(|needle| rendered.contains(needle.as_str())) {
                return Err(ProvisionError::Exit {
                    command: spec.clone(),
                    pid: 0,
                    status: ExitStatus::from_raw(1 << 8),
                });
            }

            Ok(RunReport {
                handle: ProcessHandle { pid: 0, pgid: 0 },
                status: ExitStatus::from_raw(0),
                forwarded: None,
                force_killed: false,
                lines: 0,
            })
        })
    }
}
