//! Per-thread compilation unit context attached to log events

use std::time::{Duration, Instant};

/// The source currently being compiled on this thread
#[derive(Debug, Clone)]
pub struct UnitContext {
    pub name: String,
    pub source_chars: usize,
    pub start_time: Instant,
}

impl UnitContext {
    pub fn new(name: impl Into<String>, source_chars: usize) -> Self {
        Self {
            name: name.into(),
            source_chars,
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}
