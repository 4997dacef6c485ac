//! Logging macros taking `Code` values and `key => value` context pairs.
//!
//! Context values may be any `Display` type. Every macro expands to
//! nothing observable when no global logging service is installed.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_event {
    ($event:expr $(, $key:expr => $value:expr)*) => {{
        let values: Vec<(&str, String)> = vec![$(($key, format!("{}", $value))),*];
        $crate::logging::log_with_context(
            $event,
            values.iter().map(|(key, value)| (*key, value.as_str())).collect(),
        )
    }};
}

/// Log an error event, optionally anchored at `span = ...`
#[macro_export]
macro_rules! log_error {
    ($code:expr, $message:expr, span = $span:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__log_event!(
            $crate::logging::LogEvent::error($code, $message).with_span($span)
            $(, $key => $value)*
        )
    };

    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__log_event!($crate::logging::LogEvent::error($code, $message) $(, $key => $value)*)
    };
}

#[macro_export]
macro_rules! log_success {
    ($code:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__log_event!($crate::logging::LogEvent::success($code, $message) $(, $key => $value)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__log_event!($crate::logging::LogEvent::info($message) $(, $key => $value)*)
    };
}

#[macro_export]
macro_rules! log_warning {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::__log_event!($crate::logging::LogEvent::warning($message) $(, $key => $value)*)
    };
}

/// Context is only formatted when debug output is enabled
#[macro_export]
macro_rules! log_debug {
    ($message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        if $crate::logging::debug_enabled() {
            $crate::__log_event!($crate::logging::LogEvent::debug($message) $(, $key => $value)*)
        }
    };
}

/// Success event with the elapsed time, only when performance logging is on
#[macro_export]
macro_rules! log_performance {
    ($code:expr, $message:expr, duration = $duration:expr $(, $key:expr => $value:expr)* $(,)?) => {
        if $crate::logging::config::log_performance_events() {
            $crate::log_success!($code, $message,
                "duration_ms" => format!("{:.3}", $duration.as_secs_f64() * 1000.0)
                $(, $key => $value)*
            );
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::logging::codes;

    #[test]
    fn test_macros_accept_display_values() {
        let offset: usize = 42;
        let duration = std::time::Duration::from_millis(3);

        log_error!(codes::lexical::UNRECOGNIZED_CHARACTER, "Unrecognized character: @",
            "offset" => offset,
            "char" => '@'
        );
        log_error!(codes::syntax::MISSING_DELIMITER, "Expected ';'",
            span = crate::utils::Span::at(offset)
        );
        log_error!(codes::compile::MALFORMED_IR, "Unbalanced stack");
        log_success!(codes::success::TOKENIZATION_COMPLETE, "Tokenization completed",
            "tokens" => 157,
        );
        log_info!("Compiling unit", "unit" => "<stdin>");
        log_warning!("Unused namespace", "name" => "a::b");
        log_debug!("Scope opened", "depth" => 3);
        log_debug!("Plain");
        log_performance!(codes::success::PIPELINE_COMPLETE, "Pipeline finished",
            duration = duration,
            "bytes" => 1024
        );
    }
}
