use itl::{
    find_itl_toml, format_template, lex, read_itl_toml, render_diagnostics, CompileOptions,
    Dialect, ItlError,
};
use std::env;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const SOURCE_NAME: &str = "<input>";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(ItlError::Diagnostics) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ItlError> {
    let mut args = env::args().skip(1);
    let Some(command) = args.next() else {
        print_help();
        return Ok(());
    };
    let rest: Vec<String> = args.collect();

    match command.as_str() {
        "-h" | "--help" => {
            print_help();
            Ok(())
        }
        "parse" => {
            let args = parse_command_args(&rest)?;
            let compilation = args.options.compile(&args.text);
            let output = serde_json::to_string_pretty(&compilation)
                .map_err(|err| ItlError::Io(io::Error::other(err)))?;
            println!("{output}");
            if !compilation.diagnostics.is_empty() {
                let rendered = render_diagnostics(
                    SOURCE_NAME,
                    &args.text,
                    compilation.diagnostics.as_slice(),
                );
                eprintln!("{rendered}");
            }
            if compilation.has_errors() {
                return Err(ItlError::Diagnostics);
            }
            Ok(())
        }
        "check" => {
            let args = parse_command_args(&rest)?;
            let compilation = args.options.compile(&args.text);
            if compilation.diagnostics.is_empty() {
                return Ok(());
            }
            let rendered = render_diagnostics(
                SOURCE_NAME,
                &args.text,
                compilation.diagnostics.as_slice(),
            );
            eprintln!("{rendered}");
            if compilation.has_errors() {
                return Err(ItlError::Diagnostics);
            }
            Ok(())
        }
        "fmt" => {
            let args = parse_command_args(&rest)?;
            match format_template(args.options.dialect, &args.text) {
                Ok(formatted) => {
                    println!("{formatted}");
                    Ok(())
                }
                Err(diagnostics) => {
                    let rendered =
                        render_diagnostics(SOURCE_NAME, &args.text, diagnostics.as_slice());
                    eprintln!("{rendered}");
                    Err(ItlError::Diagnostics)
                }
            }
        }
        "tokens" => {
            let args = parse_command_args(&rest)?;
            let lexed = lex(args.options.dialect, &args.text);
            let output = serde_json::to_string_pretty(&lexed)
                .map_err(|err| ItlError::Io(io::Error::other(err)))?;
            println!("{output}");
            Ok(())
        }
        other => Err(ItlError::InvalidArgument(format!("unknown command {other}"))),
    }
}

fn print_help() {
    println!(
        "itl\n\nUSAGE:\n  itl <COMMAND> [OPTIONS] <text|->\n\nCOMMANDS:\n  parse   print the syntax tree and diagnostics as JSON\n  check   report diagnostics only\n  fmt     print the template in canonical form\n  tokens  print the scanned tokens as JSON\n\nOPTIONS:\n  --dialect <standard|inline|single-function>\n  --allow-unterminated\n  --config <path>   (default: nearest itl.toml)\n  --debug-trace\n\n  -h, --help\n\nLOGGING:\n  ITL_LOG=<filter>  overrides the log filter (default: itl=warn)"
    );
}

struct CommandArgs {
    options: CompileOptions,
    text: String,
}

fn parse_command_args(args: &[String]) -> Result<CommandArgs, ItlError> {
    let mut dialect = None;
    let mut allow_unterminated = false;
    let mut config_path = None;
    let mut debug_trace = false;
    let mut text = None;

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--dialect" => {
                let Some(value) = iter.next() else {
                    return Err(ItlError::InvalidArgument(
                        "--dialect expects a value".to_string(),
                    ));
                };
                let parsed: Dialect = value
                    .parse()
                    .map_err(|err: itl::DialectParseError| {
                        ItlError::InvalidArgument(err.to_string())
                    })?;
                dialect = Some(parsed);
            }
            "--allow-unterminated" => allow_unterminated = true,
            "--config" => {
                let Some(value) = iter.next() else {
                    return Err(ItlError::InvalidArgument(
                        "--config expects a value".to_string(),
                    ));
                };
                config_path = Some(PathBuf::from(value));
            }
            "--debug-trace" => debug_trace = true,
            "-" => {
                if text.is_some() {
                    return Err(ItlError::InvalidArgument(
                        "unexpected argument -".to_string(),
                    ));
                }
                text = Some(read_stdin()?);
            }
            _ if arg.starts_with("--") => {
                return Err(ItlError::InvalidArgument(format!("unknown flag {arg}")));
            }
            _ => {
                if text.is_some() {
                    return Err(ItlError::InvalidArgument(format!(
                        "unexpected argument {arg}"
                    )));
                }
                text = Some(arg.clone());
            }
        }
    }

    init_tracing(debug_trace);

    let Some(text) = text else {
        return Err(ItlError::InvalidArgument(
            "missing template text (pass it as the last argument, or - for stdin)".to_string(),
        ));
    };

    let config_path = match config_path {
        Some(path) => Some(path),
        None => find_itl_toml(&env::current_dir()?),
    };
    let mut options = match &config_path {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            read_itl_toml(path)?.compile
        }
        None => CompileOptions::default(),
    };
    if let Some(dialect) = dialect {
        options.dialect = dialect;
    }
    if allow_unterminated {
        options.allow_unterminated_function_calls = true;
    }

    Ok(CommandArgs { options, text })
}

fn read_stdin() -> Result<String, ItlError> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text)?;
    // Templates are single-line; drop the newline a shell pipe appends.
    let trimmed = text.trim_end_matches(['\n', '\r']).len();
    text.truncate(trimmed);
    Ok(text)
}

fn init_tracing(debug_trace: bool) {
    let default_directive = if debug_trace { "itl=debug" } else { "itl=warn" };
    let filter =
        EnvFilter::try_from_env("ITL_LOG").unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
