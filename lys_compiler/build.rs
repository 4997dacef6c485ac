// Bakes the resource limits of a TOML build profile into `compile_time` constants.
use serde::Deserialize;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Profile {
    lexical: LexicalLimits,
    syntax: SyntaxLimits,
    compiler: CompilerLimits,
    logging: LoggingLimits,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LexicalLimits {
    max_source_size: usize,
    max_token_count: usize,
    max_string_length: usize,
    max_name_length: usize,
    max_pushback_depth: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct SyntaxLimits {
    max_expression_depth: usize,
    max_statement_depth: usize,
    max_namespace_depth: usize,
    max_function_parameters: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CompilerLimits {
    max_scope_depth: usize,
    max_stack_depth: usize,
    max_output_size: usize,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_message_length: usize,
    security_min_log_level: u8,
}

const HARD_MAX_SOURCE_SIZE: usize = 256 * 1024 * 1024;
const HARD_MAX_OUTPUT_SIZE: usize = 1024 * 1024 * 1024;
const HARD_MAX_DEPTH: usize = 4096;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=LYS_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=LYS_CONFIG_DIR");

    let profile_name = env::var("LYS_BUILD_PROFILE").unwrap_or_else(|_| "development".into());
    let path = profile_path(&profile_name);
    println!("cargo:rerun-if-changed={}", path.display());

    let text = fs::read_to_string(&path).unwrap_or_else(|e| {
        panic!("Cannot read build profile {}: {}", path.display(), e)
    });
    let profile: Profile = toml::from_str(&text)
        .unwrap_or_else(|e| panic!("Invalid build profile {}: {}", path.display(), e));

    check_ceilings(&profile, &profile_name);

    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    let output = Path::new(&out_dir).join("constants.rs");
    fs::write(&output, render(&profile, &profile_name))
        .unwrap_or_else(|e| panic!("Cannot write {}: {}", output.display(), e));
}

/// `config/<profile>.toml` at the workspace root; the directory may be
/// overridden with `LYS_CONFIG_DIR`, relative to the workspace root.
fn profile_path(profile: &str) -> PathBuf {
    let manifest_dir =
        env::var("CARGO_MANIFEST_DIR").expect("cargo sets CARGO_MANIFEST_DIR for build scripts");
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("the compiler crate lives inside the workspace");
    let config_dir = env::var("LYS_CONFIG_DIR").unwrap_or_else(|_| "config".into());
    workspace_root.join(config_dir).join(format!("{}.toml", profile))
}

fn check_ceilings(profile: &Profile, name: &str) {
    let depths = [
        ("max_expression_depth", profile.syntax.max_expression_depth),
        ("max_statement_depth", profile.syntax.max_statement_depth),
        ("max_namespace_depth", profile.syntax.max_namespace_depth),
        ("max_scope_depth", profile.compiler.max_scope_depth),
    ];
    for (key, value) in depths {
        if value == 0 || value > HARD_MAX_DEPTH {
            panic!("SECURITY: {} must be within 1..={}", key, HARD_MAX_DEPTH);
        }
    }
    if profile.lexical.max_source_size > HARD_MAX_SOURCE_SIZE {
        panic!("SECURITY: max_source_size exceeds {}", HARD_MAX_SOURCE_SIZE);
    }
    if profile.compiler.max_output_size > HARD_MAX_OUTPUT_SIZE {
        panic!("SECURITY: max_output_size exceeds {}", HARD_MAX_OUTPUT_SIZE);
    }
    // The numeric-literal probe pushes back two characters
    if profile.lexical.max_pushback_depth < 2 {
        panic!("SECURITY: max_pushback_depth must be at least 2");
    }
    if profile.logging.security_min_log_level > 2 {
        panic!("SECURITY: security_min_log_level must be at most 2");
    }

    if name == "production" {
        if profile.lexical.max_source_size > 16 * 1024 * 1024 {
            panic!("SECURITY: production max_source_size must not exceed 16 MiB");
        }
        if profile.syntax.max_expression_depth > 512 {
            panic!("SECURITY: production max_expression_depth must not exceed 512");
        }
    }
}

fn render(profile: &Profile, name: &str) -> String {
    let sections: [(&str, Vec<(&str, &str, String)>); 4] = [
        (
            "lexical",
            vec![
                ("MAX_SOURCE_SIZE", "usize", profile.lexical.max_source_size.to_string()),
                ("MAX_TOKEN_COUNT", "usize", profile.lexical.max_token_count.to_string()),
                ("MAX_STRING_LENGTH", "usize", profile.lexical.max_string_length.to_string()),
                ("MAX_NAME_LENGTH", "usize", profile.lexical.max_name_length.to_string()),
                ("MAX_PUSHBACK_DEPTH", "usize", profile.lexical.max_pushback_depth.to_string()),
            ],
        ),
        (
            "syntax",
            vec![
                ("MAX_EXPRESSION_DEPTH", "usize", profile.syntax.max_expression_depth.to_string()),
                ("MAX_STATEMENT_DEPTH", "usize", profile.syntax.max_statement_depth.to_string()),
                ("MAX_NAMESPACE_DEPTH", "usize", profile.syntax.max_namespace_depth.to_string()),
                (
                    "MAX_FUNCTION_PARAMETERS",
                    "usize",
                    profile.syntax.max_function_parameters.to_string(),
                ),
            ],
        ),
        (
            "compiler",
            vec![
                ("MAX_SCOPE_DEPTH", "usize", profile.compiler.max_scope_depth.to_string()),
                ("MAX_STACK_DEPTH", "usize", profile.compiler.max_stack_depth.to_string()),
                ("MAX_OUTPUT_SIZE", "usize", profile.compiler.max_output_size.to_string()),
            ],
        ),
        (
            "logging",
            vec![
                ("LOG_BUFFER_SIZE", "usize", profile.logging.log_buffer_size.to_string()),
                (
                    "MAX_LOG_MESSAGE_LENGTH",
                    "usize",
                    profile.logging.max_log_message_length.to_string(),
                ),
                (
                    "SECURITY_MIN_LOG_LEVEL",
                    "u8",
                    profile.logging.security_min_log_level.to_string(),
                ),
            ],
        ),
    ];

    let mut code = format!("// Generated by build.rs from the `{}` build profile\n", name);
    code.push_str("pub mod compile_time {\n");
    for (section, constants) in sections {
        let _ = writeln!(code, "    pub mod {} {{", section);
        for (constant, ty, value) in constants {
            let _ = writeln!(code, "        pub const {}: {} = {};", constant, ty, value);
        }
        code.push_str("    }\n");
    }
    code.push_str("}\n");
    code
}
