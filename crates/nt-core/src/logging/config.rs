//! Logging configuration.
//!
//! Precedence, highest first: CLI flags (`--log-level`, `--log-format`),
//! `NOTICE_LOG` / `NOTICE_LOG_FORMAT`, then `RUST_LOG` directives.

/// Environment variable holding the log level.
pub const ENV_LOG_LEVEL: &str = "NOTICE_LOG";

/// Environment variable holding the log format.
pub const ENV_LOG_FORMAT: &str = "NOTICE_LOG_FORMAT";

/// Fallback filter directives, used only when no level is given.
pub const ENV_RUST_LOG: &str = "RUST_LOG";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    /// Warnings and errors (default).
    #[default]
    Warn,
    Error,
    Off,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" | "quiet" => Ok(LogLevel::Off),
            _ => Err(format!("unknown log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}

/// Which events are shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogFilter {
    /// One level for every crate of the workspace.
    Level(LogLevel),
    /// Raw `RUST_LOG` directives.
    Directives(String),
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    pub filter: LogFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            format: LogFormat::Human,
            filter: LogFilter::Level(LogLevel::default()),
        }
    }
}

impl LogConfig {
    /// Create config from environment and CLI overrides.
    pub fn from_env(cli_level: Option<LogLevel>, cli_format: Option<LogFormat>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), cli_level, cli_format)
    }

    /// Same as [`LogConfig::from_env`] with an explicit variable lookup.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        cli_level: Option<LogLevel>,
        cli_format: Option<LogFormat>,
    ) -> Self {
        let env_level = lookup(ENV_LOG_LEVEL).and_then(|val| val.parse::<LogLevel>().ok());
        let filter = match cli_level.or(env_level) {
            Some(level) => LogFilter::Level(level),
            None => match lookup(ENV_RUST_LOG).filter(|val| !val.trim().is_empty()) {
                Some(directives) => LogFilter::Directives(directives),
                None => LogFilter::Level(LogLevel::default()),
            },
        };

        let env_format = lookup(ENV_LOG_FORMAT).and_then(|val| val.parse::<LogFormat>().ok());
        let format = cli_format.or(env_format).unwrap_or_default();

        LogConfig { format, filter }
    }
}
