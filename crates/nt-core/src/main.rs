//! nt-core - error notice developer tool
//!
//! - `render`: build a notice from a JSON input document and print the payload
//! - `check`: resolve and validate notifier settings

use clap::{Args, Parser, Subcommand};
use nt_config::{ConfigPath, NotifierSettings};
use nt_core::exit_codes::ExitCode;
use nt_core::input::InputDocument;
use nt_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use nt_core::{render, Configuration, PayloadFormat};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Build, filter and render error notices
#[derive(Parser)]
#[command(name = "nt-core")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to notifier.json
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a notice from an input document and print the payload
    Render(RenderArgs),

    /// Resolve and validate notifier settings
    Check,
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input document (JSON); `-` reads stdin
    #[arg(long, short = 'i')]
    input: PathBuf,

    /// Payload format
    #[arg(long, short = 'f', default_value = "xml")]
    format: PayloadFormat,
}

fn main() {
    let cli = Cli::parse();

    let log_config = LogConfig::from_env(cli.global.log_level, cli.global.log_format);
    init_logging(&log_config);

    let exit_code = match cli.command {
        Commands::Render(args) => run_render(&cli.global, &args),
        Commands::Check => run_check(&cli.global),
    };

    std::process::exit(exit_code.as_i32());
}

fn load_configuration(config_path: Option<&Path>) -> Result<(Configuration, ConfigPath), ExitCode> {
    let (settings, resolved) = NotifierSettings::load(config_path).map_err(|e| {
        eprintln!("nt-core: config error [{}]: {}", e.code(), e);
        ExitCode::ConfigError
    })?;
    let config = Configuration::from_settings(&settings).map_err(|e| {
        eprintln!("nt-core: config error [{}]: {}", e.code(), e);
        ExitCode::ConfigError
    })?;
    Ok((config, resolved))
}

fn run_render(global: &GlobalOpts, args: &RenderArgs) -> ExitCode {
    let (config, _) = match load_configuration(global.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let document = match InputDocument::read(&args.input) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("nt-core render: cannot read {}: {}", args.input.display(), e);
            return ExitCode::InputError;
        }
    };

    let notice = match document.build(&config) {
        Ok(notice) => notice,
        Err(e) => {
            eprintln!("nt-core render: {}", e);
            return ExitCode::from(&e);
        }
    };

    for diagnostic in notice.diagnostics() {
        eprintln!("nt-core render: warning: {}", diagnostic);
    }

    match notice.is_ignored() {
        Ok(true) => {
            tracing::info!(error_class = ?notice.error_class(), "Notice ignored");
            return ExitCode::Ignored;
        }
        Ok(false) => {}
        Err(e) => {
            eprintln!("nt-core render: {}", e);
            return ExitCode::from(&e);
        }
    }

    let payload = match render(&notice, args.format) {
        Ok(payload) => payload,
        Err(e) => {
            eprintln!("nt-core render: {}", e);
            return ExitCode::SerializationError;
        }
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = writeln!(stdout, "{}", payload.body) {
        eprintln!("nt-core render: failed to write payload: {}", e);
        return ExitCode::IoError;
    }
    ExitCode::Clean
}

fn run_check(global: &GlobalOpts) -> ExitCode {
    let (config, resolved) = match load_configuration(global.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(code) => return code,
    };

    let report = serde_json::json!({
        "valid": true,
        "source": resolved.source.to_string(),
        "path": resolved.path.as_ref().map(|p| p.display().to_string()),
        "environment_name": config.environment_name,
        "public": config.is_public(),
        "api_key_set": config.api_key.is_some(),
        "params_filters": config.params_filters.len(),
        "params_whitelist_filters": config.params_whitelist_filters.len(),
        "ignore": config.ignore.len(),
        "backtrace_filters": config.backtrace_filters.len(),
    });

    match serde_json::to_string_pretty(&report) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::Clean
        }
        Err(e) => {
            eprintln!("nt-core check: {}", e);
            ExitCode::InternalError
        }
    }
}
