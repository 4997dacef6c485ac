use lys_compiler::config::runtime::RuntimeConfig;
use lys_compiler::logging::{self, codes};
use lys_compiler::{pipeline, PipelineError};
use std::env;
use std::fs;
use std::io::{self, Read, Write};
use std::process;

/// What the invocation asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Compile,
    Tokens,
    Operations,
}

#[derive(Debug, PartialEq, Eq)]
struct Invocation {
    mode: Mode,
    input: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Version,
    Run(Invocation),
}

fn main() {
    let config = RuntimeConfig::default();
    let logging_ready = logging::config::init_runtime_preferences(config.logging.clone())
        .and_then(|_| logging::init_global_logging());
    if let Err(error) = logging_ready {
        logging::safe_log_error(codes::system::INITIALIZATION_FAILURE, &error);
    }

    let args: Vec<String> = env::args().collect();
    let program_name = args.first().map(String::as_str).unwrap_or("lysc");

    let command = match parse_args(&args[1.min(args.len())..]) {
        Ok(command) => command,
        Err(message) => {
            eprintln!("Error: {}", message);
            eprintln!("       {} --help", program_name);
            process::exit(1);
        }
    };

    let invocation = match command {
        Command::Help => {
            print_help(program_name);
            return;
        }
        Command::Version => {
            println!(
                "lysc {} ({} limits)",
                env!("CARGO_PKG_VERSION"),
                lys_compiler::config::build_info::profile_file()
            );
            return;
        }
        Command::Run(invocation) => invocation,
    };

    match run(&invocation, &config) {
        Ok(output) => {
            let mut stdout = io::stdout().lock();
            if let Err(error) = stdout.write_all(output.as_bytes()).and_then(|_| stdout.flush()) {
                eprintln!("Error: cannot write output: {}", error);
                process::exit(1);
            }
        }
        Err(error) => {
            eprintln!("{}", error);
            process::exit(error.exit_code());
        }
    }
}

fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut mode = Mode::Compile;
    let mut input = None;

    for arg in args {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--tokens" => mode = Mode::Tokens,
            "--ir" => mode = Mode::Operations,
            option if option.starts_with("--") => {
                return Err(format!("Unknown option '{}'", option));
            }
            path => {
                if input.is_some() {
                    return Err(format!("Unexpected argument '{}'", path));
                }
                input = Some(path.to_string());
            }
        }
    }

    Ok(Command::Run(Invocation { mode, input }))
}

fn run(invocation: &Invocation, config: &RuntimeConfig) -> Result<String, PipelineError> {
    if invocation.mode == Mode::Compile && invocation.input.is_none() {
        return pipeline::compile_reader("<stdin>", io::stdin().lock(), config);
    }

    let source = read_input(invocation.input.as_deref())?;
    match invocation.mode {
        Mode::Compile => {
            let name = invocation.input.as_deref().unwrap_or("<stdin>");
            pipeline::compile_unit(name, &source, config)
        }
        Mode::Tokens => pipeline::dump_tokens(&source, config),
        Mode::Operations => pipeline::dump_operations(&source, config),
    }
}

fn read_input(path: Option<&str>) -> Result<String, PipelineError> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|error| PipelineError::io(path, error)),
        None => {
            let mut source = String::new();
            io::stdin()
                .read_to_string(&mut source)
                .map_err(|error| PipelineError::io("<stdin>", error))?;
            Ok(source)
        }
    }
}

fn print_help(program_name: &str) {
    println!("Lys Compiler v{}", env!("CARGO_PKG_VERSION"));
    println!("Compiles a Lys script into a JavaScript object literal");
    println!();
    println!("USAGE:");
    println!("    {} [options] [input.lys]", program_name);
    println!("    {} [options] < input.lys", program_name);
    println!();
    println!("OPTIONS:");
    println!("    --help        Show this help message");
    println!("    --version     Show the compiler version");
    println!("    --tokens      Print the token stream instead of compiling");
    println!("    --ir          Print the operations of every function instead of compiling");
    println!();
    println!("EXIT STATUS:");
    println!("    0       Success");
    println!("    1       I/O or internal failure");
    println!("    257     Syntax error (0x101)");
    println!("    258     Compile error (0x102)");
    println!();
    println!("ENVIRONMENT:");
    println!("    LYS_LOG_LEVEL                   Minimum level of diagnostics on stderr");
    println!("    LYS_COMPILER_ANNOTATE_OFFSETS   Precede each function with its source offset");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_parse_args_defaults_to_stdin_compile() {
        assert_eq!(
            parse_args(&[]),
            Ok(Command::Run(Invocation {
                mode: Mode::Compile,
                input: None
            }))
        );
    }

    #[test]
    fn test_parse_args_modes_and_input() {
        assert_eq!(
            parse_args(&args(&["--ir", "main.lys"])),
            Ok(Command::Run(Invocation {
                mode: Mode::Operations,
                input: Some("main.lys".to_string())
            }))
        );
        assert_eq!(parse_args(&args(&["--tokens", "--help"])), Ok(Command::Help));
        assert_eq!(parse_args(&args(&["--version"])), Ok(Command::Version));
    }

    #[test]
    fn test_parse_args_rejects_unknown_input() {
        assert!(parse_args(&args(&["--threads"])).is_err());
        assert!(parse_args(&args(&["a.lys", "b.lys"])).is_err());
    }

    #[test]
    fn test_run_reports_missing_file() {
        let invocation = Invocation {
            mode: Mode::Tokens,
            input: Some("/nonexistent/input.lys".to_string()),
        };
        let error = run(&invocation, &RuntimeConfig::default()).unwrap_err();
        assert_eq!(error.exit_code(), 1);
    }
}
