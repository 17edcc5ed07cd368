//! Progress events emitted while a batch runs.
//!
//! The core never prints. Frontends register `EventHandler`s on an
//! `EventDispatcher` and render whatever they like. Handlers may be called
//! from several worker threads at once when a batch runs in parallel.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::external::encoders::VideoEncoder;
use crate::processing::batch::ConversionResult;

#[derive(Debug, Clone)]
pub enum Event {
    BatchStarted {
        total_files: usize,
        parallelism: usize,
        output_dir: PathBuf,
    },

    FileStarted {
        index: usize,
        total_files: usize,
        input: PathBuf,
    },

    EncoderSelected {
        index: usize,
        encoder: VideoEncoder,
        fell_back: bool,
        /// Expected number of output frames, for progress bars.
        total_frames: u64,
    },

    EncodingProgress {
        index: usize,
        frame: u64,
        total_frames: u64,
        /// Output time position in seconds.
        time_secs: f64,
        fps: f32,
        speed: f32,
    },

    FileFinished {
        index: usize,
        result: ConversionResult,
    },

    BatchFinished {
        succeeded: usize,
        failed: usize,
        skipped: usize,
        elapsed: Duration,
    },
}

pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &Event);
}

#[derive(Clone)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn emit(&self, event: Event) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

/// Handler that stores every event; handy in tests and for post-run reports.
#[derive(Debug, Default)]
pub struct CollectingHandler {
    events: Mutex<Vec<Event>>,
}

impl CollectingHandler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }
}

impl EventHandler for CollectingHandler {
    fn handle(&self, event: &Event) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_reaches_every_handler() {
        let first = Arc::new(CollectingHandler::new());
        let second = Arc::new(CollectingHandler::new());
        let mut dispatcher = EventDispatcher::new();
        dispatcher.add_handler(first.clone());
        dispatcher.add_handler(second.clone());

        dispatcher.emit(Event::BatchFinished {
            succeeded: 1,
            failed: 0,
            skipped: 0,
            elapsed: Duration::from_secs(1),
        });

        assert_eq!(first.events().len(), 1);
        assert_eq!(second.events().len(), 1);
    }
}
