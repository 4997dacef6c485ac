//! Logging service and its backends
//!
//! Every backend writes to stderr; stdout carries the generated program.

use super::codes::Code;
use super::config;
use super::events::{LogEvent, LogLevel};
use std::sync::{Arc, Mutex, MutexGuard};

pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

/// Level filter in front of one backend
pub struct LoggingService {
    logger: Arc<dyn Logger>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self { logger, min_level }
    }

    /// Backend and level chosen from the logging preferences
    pub fn with_config() -> Self {
        let logger: Arc<dyn Logger> = if !config::use_console_logging() {
            Arc::new(NullLogger)
        } else if config::use_structured_logging() {
            Arc::new(StructuredLogger)
        } else {
            Arc::new(ConsoleLogger)
        };
        Self::new(logger, config::get_min_log_level())
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    pub fn should_log(&self, level: LogLevel) -> bool {
        level <= self.min_level
    }

    /// Forward an event that passes the level filter; oversized messages
    /// are cut to the configured length.
    pub fn log_event(&self, mut event: LogEvent) {
        if !self.should_log(event.level) {
            return;
        }
        let max = config::get_max_log_message_length();
        if let Some((cut, _)) = event.message.char_indices().nth(max) {
            event.message.truncate(cut);
            event.message.push_str("...");
        }
        self.logger.log(&event);
    }
}

/// Human-readable lines; errors include their registered help text
/// when debug output is enabled.
pub struct ConsoleLogger;

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        if event.is_error() && config::get_min_log_level() >= LogLevel::Debug {
            eprintln!("{}", event.explain());
        } else {
            eprintln!("{}", event);
        }
    }
}

/// One JSON object per line
pub struct StructuredLogger;

impl Logger for StructuredLogger {
    fn log(&self, event: &LogEvent) {
        match event.format_json() {
            Ok(json) => eprintln!("{}", json),
            Err(_) => eprintln!("{}", event),
        }
    }
}

pub struct NullLogger;

impl Logger for NullLogger {
    fn log(&self, _event: &LogEvent) {}
}

/// Keeps events for inspection in tests; the oldest events are dropped
/// once the configured buffer size is reached.
#[derive(Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<LogEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn count_level(&self, level: LogLevel) -> usize {
        self.lock().iter().filter(|event| event.level == level).count()
    }

    pub fn contains_code(&self, code: Code) -> bool {
        self.lock().iter().any(|event| event.code == code)
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        let mut events = self.lock();
        let capacity = config::get_event_buffer_size().max(1);
        if events.len() >= capacity {
            let excess = events.len() + 1 - capacity;
            events.drain(..excess);
        }
        events.push(event.clone());
    }
}

/// Build the service the CLI uses
pub fn create_configured_service() -> LoggingService {
    LoggingService::with_config()
}
