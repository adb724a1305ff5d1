//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use lifecycle_scopes::LifecycleListener;
use std::fmt;
use std::io;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// How a `RecordingListener` callback behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    Succeed,
    Fail,
    Panic,
}

/// Listener that records every callback it receives into a shared journal.
pub struct RecordingListener {
    name: &'static str,
    journal: Arc<Mutex<Vec<String>>>,
    started: Behavior,
    stopped: Behavior,
    start_failed: Behavior,
    finished: Behavior,
}

impl RecordingListener {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            journal: Arc::new(Mutex::new(Vec::new())),
            started: Behavior::Succeed,
            stopped: Behavior::Succeed,
            start_failed: Behavior::Succeed,
            finished: Behavior::Succeed,
        }
    }

    /// Record into `journal` instead of a private one, so several listeners share an order.
    pub fn with_journal(mut self, journal: Arc<Mutex<Vec<String>>>) -> Self {
        self.journal = journal;
        self
    }

    pub fn started(mut self, behavior: Behavior) -> Self {
        self.started = behavior;
        self
    }

    pub fn stopped(mut self, behavior: Behavior) -> Self {
        self.stopped = behavior;
        self
    }

    pub fn start_failed(mut self, behavior: Behavior) -> Self {
        self.start_failed = behavior;
        self
    }

    pub fn finished(mut self, behavior: Behavior) -> Self {
        self.finished = behavior;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn count(&self, callback: &str) -> usize {
        let entry = format!("{}:{}", self.name, callback);
        self.journal
            .lock()
            .unwrap()
            .iter()
            .filter(|c| **c == entry)
            .count()
    }

    fn record(&self, callback: &str, behavior: Behavior) -> anyhow::Result<()> {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, callback));

        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Fail => anyhow::bail!("{} {} failed", self.name, callback),
            Behavior::Panic => panic!("{} {} panicked", self.name, callback),
        }
    }
}

impl fmt::Display for RecordingListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl LifecycleListener for RecordingListener {
    fn on_started(&self) -> anyhow::Result<()> {
        self.record("started", self.started)
    }

    fn on_stopped(&self) -> anyhow::Result<()> {
        self.record("stopped", self.stopped)
    }

    fn on_start_failed(&self, _cause: &anyhow::Error) -> anyhow::Result<()> {
        self.record("start_failed", self.start_failed)
    }

    fn on_finished(&self) -> anyhow::Result<()> {
        self.record("finished", self.finished)
    }
}

// -------------------------------------------------------------------------------------------------
// Log capture
// -------------------------------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with an INFO-level subscriber installed on this thread and return what it logged.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    capture_logs_at(tracing::Level::INFO, f)
}

/// Like [`capture_logs`], but also keeps DEBUG events.
pub fn capture_debug_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    capture_logs_at(tracing::Level::DEBUG, f)
}

fn capture_logs_at<R>(level: tracing::Level, f: impl FnOnce() -> R) -> (R, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(level)
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs.contents())
}

/// Run `f` with the default panic hook silenced, so expected panics do not clutter output.
///
/// The panic hook is process-global: callers must be `#[serial]`.
pub fn quiet_panics<R>(f: impl FnOnce() -> R) -> R {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(|_| {}));
    let result = f();
    std::panic::set_hook(previous);
    result
}
