//! Log events emitted by the compiler stages

use super::codes::{Code, Severity};
use crate::utils::Span;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

pub use crate::config::runtime::LogLevel;

/// Codes for events that carry no diagnostic of their own
pub mod generic {
    use super::Code;

    pub const WARNING: Code = Code::new("W000");
    pub const INFO: Code = Code::new("I000");
    pub const DEBUG: Code = Code::new("D000");
}

#[derive(Debug, Clone)]
pub struct LogEvent {
    pub timestamp: SystemTime,
    pub level: LogLevel,
    pub code: Code,
    pub message: String,
    pub span: Option<Span>,
    pub context: BTreeMap<String, String>,
}

impl LogEvent {
    fn new(level: LogLevel, code: Code, message: &str) -> Self {
        Self {
            timestamp: SystemTime::now(),
            level,
            code,
            message: message.to_string(),
            span: None,
            context: BTreeMap::new(),
        }
    }

    pub fn error(code: Code, message: &str) -> Self {
        Self::new(LogLevel::Error, code, message)
    }

    pub fn warning(message: &str) -> Self {
        Self::new(LogLevel::Warning, generic::WARNING, message)
    }

    pub fn info(message: &str) -> Self {
        Self::new(LogLevel::Info, generic::INFO, message)
    }

    /// Info-level event carrying a success code
    pub fn success(code: Code, message: &str) -> Self {
        Self::new(LogLevel::Info, code, message)
    }

    pub fn debug(message: &str) -> Self {
        Self::new(LogLevel::Debug, generic::DEBUG, message)
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_context(mut self, key: &str, value: &str) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    /// Tag the event with the compilation unit it belongs to
    pub fn with_unit(self, unit: &str) -> Self {
        self.with_context("unit", unit)
    }

    pub fn is_error(&self) -> bool {
        self.level == LogLevel::Error
    }

    pub fn category(&self) -> &'static str {
        self.code.category()
    }

    /// Display form followed by the registered description and action
    pub fn explain(&self) -> String {
        let mut output = self.to_string();
        if let Some(description) = self.code.description() {
            output.push_str(&format!("\n  = {}", description));
        }
        if let Some(action) = self.code.recommended_action() {
            output.push_str(&format!("\n  = help: {}", action));
        }
        output
    }

    /// One JSON object, as written by the structured logger
    pub fn format_json(&self) -> Result<String, serde_json::Error> {
        let record = JsonRecord {
            timestamp: self
                .timestamp
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default(),
            level: self.level.as_str(),
            code: self.code.as_str(),
            category: self.category(),
            severity: self.is_error().then(|| self.code.severity()),
            message: &self.message,
            start: self.span.map(|span| span.start()),
            end: self.span.map(|span| span.end()),
            context: &self.context,
        };
        serde_json::to_string(&record)
    }
}

/// `error[E071]: Could not resolve f (offset 17, unit=<stdin>)`
impl fmt::Display for LogEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{}]: {}",
            self.level.as_str().to_ascii_lowercase(),
            self.code,
            self.message
        )?;

        let mut details: Vec<String> = Vec::new();
        if let Some(span) = &self.span {
            details.push(format!("offset {}", span));
        }
        details.extend(
            self.context
                .iter()
                .map(|(key, value)| format!("{}={}", key, value)),
        );
        if !details.is_empty() {
            write!(f, " ({})", details.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    timestamp: u64,
    level: &'static str,
    code: &'static str,
    category: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    severity: Option<Severity>,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    end: Option<usize>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    context: &'a BTreeMap<String, String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    #[test]
    fn test_error_event_creation() {
        let event = LogEvent::error(codes::lexical::INVALID_NUMBER, "Invalid float");

        assert!(event.is_error());
        assert_eq!(event.code.as_str(), "E022");
        assert_eq!(event.category(), "Lexical");
    }

    #[test]
    fn test_display_includes_span_and_context() {
        let event = LogEvent::error(codes::compile::UNRESOLVED_FUNCTION, "Could not resolve f")
            .with_span(Span::at(17))
            .with_unit("<stdin>");

        assert_eq!(
            event.to_string(),
            "error[E071]: Could not resolve f (offset 17, unit=<stdin>)"
        );
        assert_eq!(LogEvent::info("ready").to_string(), "info[I000]: ready");
    }

    #[test]
    fn test_explain_lists_action() {
        let event = LogEvent::error(codes::syntax::MISSING_DELIMITER, "Expected ';'");
        let explained = event.explain();
        assert!(explained.starts_with("error[E041]: Expected ';'"));
        assert!(explained.contains("\n  = help: "));
    }

    #[test]
    fn test_generic_codes() {
        assert_eq!(LogEvent::warning("w").code, generic::WARNING);
        assert_eq!(LogEvent::debug("d").level, LogLevel::Debug);
        assert!(!LogEvent::success(codes::success::PARSE_COMPLETE, "ok").is_error());
    }

    #[test]
    fn test_json_formatting() {
        let event = LogEvent::error(codes::types::OPERATOR_NOT_DEFINED, "Operator + not defined")
            .with_span(Span::new(3, 5))
            .with_context("left", "bool");

        let json: serde_json::Value = serde_json::from_str(&event.format_json().unwrap()).unwrap();
        assert_eq!(json["level"], "ERROR");
        assert_eq!(json["code"], "E060");
        assert_eq!(json["start"], 3);
        assert_eq!(json["context"]["left"], "bool");

        let info: serde_json::Value =
            serde_json::from_str(&LogEvent::info("x").format_json().unwrap()).unwrap();
        assert!(info.get("severity").is_none());
        assert!(info.get("context").is_none());
    }
}
