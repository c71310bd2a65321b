//! Run events and how they are rendered

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Target used for every rendered run event.
pub const EVENT_TARGET: &str = "fleet_loader::events";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        };
        f.write_str(s)
    }
}

/// One textual event emitted by the update pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub level: Level,
    pub message: String,
}

impl Event {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// Consumer of drained events. Runs on the sink task.
pub trait Render: Send + 'static {
    fn render(&mut self, event: &Event);
}

/// Forwards events to the installed `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingRenderer;

impl Render for TracingRenderer {
    fn render(&mut self, event: &Event) {
        match event.level {
            Level::Debug => tracing::debug!(target: EVENT_TARGET, "{}", event.message),
            Level::Info => tracing::info!(target: EVENT_TARGET, "{}", event.message),
            Level::Warn => tracing::warn!(target: EVENT_TARGET, "{}", event.message),
            Level::Error => tracing::error!(target: EVENT_TARGET, "{}", event.message),
        }
    }
}

/// Keeps every rendered event in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Event>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|event| event.message.clone())
            .collect()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.events
            .lock()
            .iter()
            .any(|event| event.message.contains(needle))
    }
}

impl Render for Recorder {
    fn render(&mut self, event: &Event) {
        self.events.lock().push(event.clone());
    }
}
