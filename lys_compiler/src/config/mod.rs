//! Compiler configuration
//!
//! `compile_time` holds the resource limits baked in by `build.rs` from the
//! selected TOML profile. [`runtime`] holds the preferences read from the
//! environment when the compiler starts.

include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod constants;
pub mod runtime;

/// Which build profile produced the `compile_time` limits
pub mod build_info {
    pub fn profile() -> &'static str {
        option_env!("LYS_BUILD_PROFILE").unwrap_or("development")
    }

    pub fn config_dir() -> &'static str {
        option_env!("LYS_CONFIG_DIR").unwrap_or("config")
    }

    /// `config/development.toml` for a default build
    pub fn profile_file() -> String {
        format!("{}/{}.toml", config_dir(), profile())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_info_names_a_toml_profile() {
        assert!(!build_info::profile().is_empty());
        assert!(build_info::profile_file().ends_with(".toml"));
        assert!(build_info::profile_file().starts_with(build_info::config_dir()));
    }

    #[test]
    fn test_generated_limits_are_sane() {
        assert!(compile_time::lexical::MAX_PUSHBACK_DEPTH >= 2);
        assert!(compile_time::lexical::MAX_TOKEN_COUNT > 0);
        assert!(compile_time::syntax::MAX_EXPRESSION_DEPTH > 0);
        assert!(compile_time::compiler::MAX_STACK_DEPTH > 0);
        assert!(compile_time::logging::SECURITY_MIN_LOG_LEVEL <= 2);
    }
}
