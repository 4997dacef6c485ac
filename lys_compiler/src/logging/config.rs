//! Logging settings
//!
//! Buffer limits come from the build profile; the rest are runtime
//! preferences, installed once by the command line tool or read from the
//! environment on first use.

use crate::config::compile_time::logging::*;
use crate::config::runtime::{LogLevel, LoggingPreferences};
use std::sync::OnceLock;

static RUNTIME_PREFERENCES: OnceLock<LoggingPreferences> = OnceLock::new();

/// Install the preferences used for the rest of the process
pub fn init_runtime_preferences(preferences: LoggingPreferences) -> Result<(), String> {
    validate_preferences(&preferences)?;
    RUNTIME_PREFERENCES
        .set(preferences)
        .map_err(|_| "Logging preferences are already installed".to_string())
}

fn preferences() -> &'static LoggingPreferences {
    RUNTIME_PREFERENCES.get_or_init(LoggingPreferences::default)
}

fn validate_preferences(preferences: &LoggingPreferences) -> Result<(), String> {
    if preferences.use_structured_logging && !preferences.enable_console_logging {
        return Err("Structured logging requires console logging to be enabled".to_string());
    }
    Ok(())
}

/// Most verbose level that reaches the backend. The build profile may
/// force verbosity up to `warning`, never beyond.
pub fn get_min_log_level() -> LogLevel {
    let floor = LogLevel::from_u8(SECURITY_MIN_LOG_LEVEL).min(LogLevel::Warning);
    preferences().min_log_level.max(floor)
}

pub fn use_structured_logging() -> bool {
    preferences().use_structured_logging
}

pub fn use_console_logging() -> bool {
    preferences().enable_console_logging
}

pub fn log_performance_events() -> bool {
    preferences().log_performance_events
}

/// Tag events with the name of the unit being compiled
pub fn include_unit_context() -> bool {
    preferences().include_unit_context
}

pub fn get_event_buffer_size() -> usize {
    LOG_BUFFER_SIZE
}

pub fn get_max_log_message_length() -> usize {
    MAX_LOG_MESSAGE_LENGTH
}

/// Check the build limits and the installed preferences
pub fn validate_config() -> Result<(), String> {
    if !(100..=100_000).contains(&LOG_BUFFER_SIZE) {
        return Err(format!(
            "log_buffer_size must be within 100..=100000, got {}",
            LOG_BUFFER_SIZE
        ));
    }
    if MAX_LOG_MESSAGE_LENGTH < 80 {
        return Err(format!(
            "max_log_message_length must be at least 80, got {}",
            MAX_LOG_MESSAGE_LENGTH
        ));
    }
    validate_preferences(preferences())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        assert!(validate_config().is_ok());
    }

    #[test]
    fn test_errors_always_pass_the_filter() {
        assert!(get_min_log_level() >= LogLevel::Error);
    }

    #[test]
    fn test_structured_without_console_is_rejected() {
        let preferences = LoggingPreferences {
            use_structured_logging: true,
            enable_console_logging: false,
            min_log_level: LogLevel::Info,
            log_performance_events: false,
            include_unit_context: true,
        };
        assert!(validate_preferences(&preferences).is_err());
    }
}
