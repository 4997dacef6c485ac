//! Runtime preferences, read from `LYS_*` environment variables
//!
//! Unlike the build limits these never change what a program compiles to,
//! except for the optional offset annotations.

use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Environment variable names for configuration
pub mod env_vars {
    pub const LEXICAL_LOG_STATISTICS: &str = "LYS_LEXICAL_LOG_STATISTICS";

    pub const SYNTAX_LOG_FUNCTION_HEADERS: &str = "LYS_SYNTAX_LOG_FUNCTION_HEADERS";

    pub const COMPILER_ANNOTATE_OFFSETS: &str = "LYS_COMPILER_ANNOTATE_OFFSETS";
    pub const COMPILER_LOG_FUNCTIONS: &str = "LYS_COMPILER_LOG_FUNCTIONS";

    pub const LOGGING_USE_STRUCTURED: &str = "LYS_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "LYS_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "LYS_LOG_LEVEL";
    pub const LOGGING_LOG_PERFORMANCE: &str = "LYS_LOGGING_LOG_PERFORMANCE";
    pub const LOGGING_INCLUDE_UNIT_CONTEXT: &str = "LYS_LOGGING_INCLUDE_UNIT_CONTEXT";
}

/// Boolean switch; unset or unparsable values fall back to `default`
fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_flag(&value))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalPreferences {
    /// Log token counts per kind once a unit is tokenized
    pub log_token_statistics: bool,
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            log_token_statistics: env_flag(env_vars::LEXICAL_LOG_STATISTICS, false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxPreferences {
    pub log_function_headers: bool,
}

impl Default for SyntaxPreferences {
    fn default() -> Self {
        Self {
            log_function_headers: env_flag(env_vars::SYNTAX_LOG_FUNCTION_HEADERS, false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompilerPreferences {
    /// Precede each generated function with a `// offset N` comment
    pub annotate_source_offsets: bool,
    pub log_function_summaries: bool,
}

impl Default for CompilerPreferences {
    fn default() -> Self {
        Self {
            annotate_source_offsets: env_flag(env_vars::COMPILER_ANNOTATE_OFFSETS, false),
            log_function_summaries: env_flag(env_vars::COMPILER_LOG_FUNCTIONS, false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// JSON lines instead of text
    pub use_structured_logging: bool,
    pub enable_console_logging: bool,
    pub min_log_level: LogLevel,
    pub log_performance_events: bool,
    /// Tag events with the name of the compilation unit
    pub include_unit_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env_flag(env_vars::LOGGING_USE_STRUCTURED, false),
            enable_console_logging: env_flag(env_vars::LOGGING_ENABLE_CONSOLE, true),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(LogLevel::Warning),
            log_performance_events: env_flag(env_vars::LOGGING_LOG_PERFORMANCE, false),
            include_unit_context: env_flag(env_vars::LOGGING_INCLUDE_UNIT_CONTEXT, true),
        }
    }
}

/// Ordered from least to most verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    /// Level for the numeric `security_min_log_level` build setting
    pub fn from_u8(level: u8) -> Self {
        match level {
            0 => LogLevel::Error,
            1 => LogLevel::Warning,
            2 => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }
}

/// Accepts level names or their numeric form: `warn`, `warning`, `1`
impl FromStr for LogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim().to_ascii_lowercase();
        if let Ok(level) = value.parse::<u8>() {
            return match level {
                0..=3 => Ok(LogLevel::from_u8(level)),
                _ => Err(format!("Log level out of range: {}", level)),
            };
        }
        match value.as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            _ => Err(format!("Unknown log level: {}", value)),
        }
    }
}

/// Preferences of every stage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub lexical: LexicalPreferences,
    pub syntax: SyntaxPreferences,
    pub compiler: CompilerPreferences,
    pub logging: LoggingPreferences,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("error".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert_eq!(" WARN ".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("warning".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("2".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("7".parse::<LogLevel>().is_err());
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_flag_spellings() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("off"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_level_ordering_filters_noise() {
        assert!(LogLevel::Error < LogLevel::Warning);
        assert!(LogLevel::Info < LogLevel::Debug);
        assert_eq!(LogLevel::from_u8(9), LogLevel::Debug);
    }

    #[test]
    fn test_config_serializes_by_stage() {
        let config = RuntimeConfig::default();
        let json = serde_json::to_value(&config).unwrap();
        assert!(json["compiler"].get("annotate_source_offsets").is_some());
        assert!(json["logging"].get("min_log_level").is_some());
    }
}
