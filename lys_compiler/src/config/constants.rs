//! Fixed language constants.
//!
//! Profile-dependent resource limits live in the generated
//! [`compile_time`](super::compile_time) module; the values here are part of
//! the language definition and the runtime contract and never change per build.

pub use super::compile_time;

pub mod literals {
    /// Smallest accepted `@bits` suffix on integer literals
    pub const MIN_INT_BITS: u32 = 1;

    /// Largest accepted `@bits` suffix on integer literals
    pub const MAX_INT_BITS: u32 = 1024;

    /// Smallest accepted `@bits` suffix on float literals
    pub const MIN_FLOAT_BITS: u32 = 8;

    /// Largest accepted `@bits` suffix on float literals
    pub const MAX_FLOAT_BITS: u32 = 256;

    /// Float widths must be a multiple of this
    pub const FLOAT_BITS_STEP: u32 = 8;

    /// Static type of an integer literal without suffix
    pub const DEFAULT_INT_TYPE: &str = "int32";

    /// Static type of an unsigned integer literal without width suffix
    pub const DEFAULT_UINT_TYPE: &str = "uint32";

    /// Static type of a float literal without suffix
    pub const DEFAULT_FLOAT_TYPE: &str = "float32";
}

/// Names of the hooks the host runtime exposes to generated code.
pub mod runtime_hooks {
    pub const VM: &str = "$vm";
    pub const BUILTIN: &str = "$vm.builtin";
    pub const USER: &str = "$vm.user";
    pub const LED: &str = "$vm.led";
    pub const COPY: &str = "$vm.copy";
    pub const ASYNC: &str = "$vm.async";
    pub const SYNC: &str = "$vm.sync";
    pub const VECTOR: &str = "$vm.Vector";

    /// Reserved root builtin that routes to [`LED`]
    pub const LED_ACCESSOR_NAME: &str = "$";

    /// Prefix for temporaries synthesized by compound property assignment
    pub const TEMP_PREFIX: &str = "tmp$";
}

/// Process exit statuses of the command-line compiler.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const INTERNAL_FAILURE: i32 = 1;
    pub const SYNTAX_ERROR: i32 = 0x101;
    pub const COMPILE_ERROR: i32 = 0x102;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_bounds_are_aligned() {
        assert_eq!(literals::MIN_FLOAT_BITS % literals::FLOAT_BITS_STEP, 0);
        assert_eq!(literals::MAX_FLOAT_BITS % literals::FLOAT_BITS_STEP, 0);
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        assert_ne!(exit_codes::SYNTAX_ERROR, exit_codes::COMPILE_ERROR);
        assert_ne!(exit_codes::SYNTAX_ERROR, exit_codes::INTERNAL_FAILURE);
    }
}
