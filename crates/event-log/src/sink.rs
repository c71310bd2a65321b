//! Event channel and the background sink draining it
//!
//! The pipeline sends through an [`EventLog`]; a dedicated task renders what
//! it receives. Dropping every `EventLog` closes the channel, after which the
//! sink renders whatever is still queued and exits. [`EventSink::finish`]
//! waits for that, so no event emitted during a run is lost.

use crate::event::{Event, Level, Render};
use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// Queue capacity. Large enough that a run never waits on the sink.
pub const DEFAULT_CAPACITY: usize = 64;

/// Sending half handed to the pipeline.
#[derive(Debug, Clone)]
pub struct EventLog {
    tx: mpsc::Sender<Event>,
}

impl EventLog {
    pub async fn emit(&self, level: Level, message: impl Into<String>) {
        if self.tx.send(Event::new(level, message)).await.is_err() {
            warn!("event sink already stopped, dropping event");
        }
    }

    pub async fn debug(&self, message: impl Into<String>) {
        self.emit(Level::Debug, message).await;
    }

    pub async fn info(&self, message: impl Into<String>) {
        self.emit(Level::Info, message).await;
    }

    pub async fn warn(&self, message: impl Into<String>) {
        self.emit(Level::Warn, message).await;
    }

    pub async fn error(&self, message: impl Into<String>) {
        self.emit(Level::Error, message).await;
    }
}

/// Handle on the running sink task.
#[derive(Debug)]
pub struct EventSink {
    handle: JoinHandle<usize>,
}

impl EventSink {
    /// Spawn the sink on the current runtime. Must be called from within a
    /// tokio runtime.
    pub fn start<R: Render>(capacity: usize, mut renderer: R) -> (EventLog, EventSink) {
        let (tx, mut rx) = mpsc::channel::<Event>(capacity.max(1));
        let handle = tokio::spawn(async move {
            let mut rendered = 0usize;
            while let Some(event) = rx.recv().await {
                renderer.render(&event);
                rendered += 1;
            }
            rendered
        });
        (EventLog { tx }, EventSink { handle })
    }

    /// Wait for the sink to drain and stop, returning how many events it
    /// rendered. Every [`EventLog`] clone must have been dropped first.
    pub async fn finish(self) -> usize {
        match self.handle.await {
            Ok(rendered) => rendered,
            Err(e) => {
                warn!("event sink task ended abnormally: {}", e);
                0
            }
        }
    }

    /// Run `body` with a live event log, then flush and join the sink
    /// whatever `body` returned.
    ///
    /// `body` must not leak clones of the log beyond its own future, or the
    /// final join never completes.
    pub async fn scope<R, F, Fut, T>(renderer: R, body: F) -> T
    where
        R: Render,
        F: FnOnce(EventLog) -> Fut,
        Fut: Future<Output = T>,
    {
        let (events, sink) = Self::start(DEFAULT_CAPACITY, renderer);
        let output = body(events).await;
        sink.finish().await;
        output
    }
}
