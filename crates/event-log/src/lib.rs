//! # Event Log
//!
//! Bounded run-event channel drained by a background sink task. The update
//! pipeline never renders log lines itself; it sends [`Event`]s and the
//! sink forwards them to the configured [`Render`] implementation.

mod event;
mod sink;

pub use event::{Event, Level, Recorder, Render, TracingRenderer, EVENT_TARGET};
pub use sink::{EventLog, EventSink, DEFAULT_CAPACITY};
