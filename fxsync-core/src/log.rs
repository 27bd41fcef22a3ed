//! Logging capability passed into every sync component.
//!
//! Components never reach for a global logger: they receive a `&dyn SyncLog`.
//! Production wiring forwards to `tracing`; tests record entries in memory.

use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

pub trait SyncLog: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards to `tracing` under the `fxsync` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl SyncLog for TracingLog {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "fxsync", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "fxsync", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "fxsync", "{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "fxsync", "{message}");
    }
}

/// Keeps every entry; used by tests to assert on what was reported.
#[derive(Debug, Default)]
pub struct MemoryLog {
    entries: Mutex<Vec<(LogLevel, String)>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Messages at exactly `level`.
    pub fn messages(&self, level: LogLevel) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries().iter().any(|(_, m)| m.contains(needle))
    }

    fn record(&self, level: LogLevel, message: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push((level, message.to_string()));
        }
    }
}

impl SyncLog for MemoryLog {
    fn debug(&self, message: &str) {
        self.record(LogLevel::Debug, message);
    }

    fn info(&self, message: &str) {
        self.record(LogLevel::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(LogLevel::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(LogLevel::Error, message);
    }
}
