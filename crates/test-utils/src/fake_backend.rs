use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use minibuild::engine::LogSink;
use minibuild::errors::{BuildError, Result};
use minibuild::exec::{BuildBackend, BuildRequest};
use tokio::sync::Notify;

/// A backend that never spawns anything.
///
/// - counts how many builds it was asked to run
/// - logs a fixed set of lines
/// - optionally waits on a gate before finishing, so tests can observe the
///   coordinator while a build is "running"
/// - finishes with a fixed exit code, or a fixed error
pub struct FakeBackend {
    started: Arc<AtomicUsize>,
    gate: Option<Arc<Notify>>,
    lines: Vec<String>,
    exit_code: i32,
    fail_with: Option<String>,
}

impl FakeBackend {
    pub fn new(exit_code: i32) -> Self {
        Self {
            started: Arc::new(AtomicUsize::new(0)),
            gate: None,
            lines: Vec::new(),
            exit_code,
            fail_with: None,
        }
    }

    /// Hold each build until the returned `Notify` is signalled.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn with_lines(mut self, lines: &[&str]) -> Self {
        self.lines = lines.iter().map(|l| l.to_string()).collect();
        self
    }

    /// Finish every build with `BuildError::ConfigError(message)`.
    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    /// Shared counter of builds started.
    pub fn starts(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.started)
    }
}

impl BuildBackend for FakeBackend {
    fn execute<'a>(
        &'a self,
        _request: &'a BuildRequest,
        sink: &'a LogSink,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            self.started.fetch_add(1, Ordering::SeqCst);

            for line in &self.lines {
                sink.append_line(line);
            }

            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            match &self.fail_with {
                Some(msg) => Err(BuildError::ConfigError(msg.clone())),
                None => Ok(self.exit_code),
            }
        })
    }
}
