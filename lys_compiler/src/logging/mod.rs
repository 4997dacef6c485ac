//! Structured logging for the compiler
//!
//! One global [`LoggingService`] is installed by the command line tool.
//! Library callers that never install it get silent logging; the macros
//! in [`macros`] become no-ops.

pub mod codes;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;
pub mod unit;

use std::cell::RefCell;
use std::sync::OnceLock;

pub use codes::Code;
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};
pub use unit::UnitContext;

static GLOBAL_LOGGER: OnceLock<LoggingService> = OnceLock::new();

thread_local! {
    static UNIT_CONTEXT: RefCell<Option<UnitContext>> = const { RefCell::new(None) };
}

/// Codes the compiler reports most often; startup fails when one of them
/// lost its registry entry.
const REQUIRED_CODES: [Code; 4] = [
    codes::system::INTERNAL_ERROR,
    codes::lexical::UNRECOGNIZED_CHARACTER,
    codes::syntax::UNEXPECTED_TOKEN,
    codes::compile::MALFORMED_IR,
];

/// Install the global service configured from the logging preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Invalid logging configuration: {}", e))?;

    if let Some(code) = REQUIRED_CODES.iter().find(|code| code.metadata().is_none()) {
        return Err(format!("No metadata registered for {}", code));
    }

    GLOBAL_LOGGER
        .set(service::create_configured_service())
        .map_err(|_| "Logging is already initialized".to_string())?;

    log_with_context(
        LogEvent::success(
            codes::success::SYSTEM_INITIALIZATION_COMPLETED,
            "Logging initialized",
        ),
        vec![],
    );
    Ok(())
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get()
}

/// Whether debug events would reach the logger
pub fn debug_enabled() -> bool {
    try_get_global_logger().is_some_and(|logger| logger.should_log(LogLevel::Debug))
}

pub fn set_unit_context(name: &str, source_chars: usize) {
    UNIT_CONTEXT.with(|ctx| *ctx.borrow_mut() = Some(UnitContext::new(name, source_chars)));
}

pub fn clear_unit_context() {
    UNIT_CONTEXT.with(|ctx| *ctx.borrow_mut() = None);
}

/// Run `f` with `name` as the unit attached to every event it logs
pub fn with_unit_context<F, R>(name: &str, source_chars: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    set_unit_context(name, source_chars);
    let result = f();
    clear_unit_context();
    result
}

pub fn get_current_unit_context() -> Option<UnitContext> {
    UNIT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

fn attach_unit(event: LogEvent) -> LogEvent {
    if !config::include_unit_context() {
        return event;
    }
    match get_current_unit_context() {
        Some(unit) => event.with_unit(&unit.name),
        None => event,
    }
}

/// Attach context pairs and the unit name, then hand the event to the
/// global logger. Backs the logging macros.
pub fn log_with_context(event: LogEvent, context: Vec<(&str, &str)>) {
    let Some(logger) = try_get_global_logger() else {
        return;
    };
    let event = context
        .into_iter()
        .fold(event, |event, (key, value)| event.with_context(key, value));
    logger.log_event(attach_unit(event));
}

/// Error logging that still reaches stderr when no service is installed
pub fn safe_log_error(code: Code, message: &str) {
    let event = attach_unit(LogEvent::error(code, message));
    match try_get_global_logger() {
        Some(logger) => logger.log_event(event),
        None => eprintln!("{}", event),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_context_management() {
        assert!(get_current_unit_context().is_none());

        set_unit_context("test.lys", 10);
        let context = get_current_unit_context();
        assert_eq!(context.map(|c| c.name), Some("test.lys".to_string()));

        clear_unit_context();
        assert!(get_current_unit_context().is_none());
    }

    #[test]
    fn test_with_unit_context() {
        let result = with_unit_context("<stdin>", 3, || {
            let context = get_current_unit_context();
            assert_eq!(context.map(|c| c.source_chars), Some(3));
            42
        });

        assert_eq!(result, 42);
        assert!(get_current_unit_context().is_none());
    }

    #[test]
    fn test_attach_unit_tags_event() {
        let event = with_unit_context("a.lys", 1, || attach_unit(LogEvent::info("x")));
        if config::include_unit_context() {
            assert_eq!(event.context.get("unit").map(String::as_str), Some("a.lys"));
        }
    }

    #[test]
    fn test_required_codes_are_registered() {
        assert!(REQUIRED_CODES.iter().all(|code| code.metadata().is_some()));
    }

    #[test]
    fn test_safe_logging_without_service() {
        safe_log_error(codes::system::INTERNAL_ERROR, "Test error");
    }
}
