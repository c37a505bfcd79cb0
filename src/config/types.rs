//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DB_PATH, DEFAULT_BIND_ADDR, DEFAULT_LINK_CHECK_WORKERS, DEFAULT_LINK_TIMEOUT_SECS,
    DEFAULT_PAGE_TIMEOUT_SECS, DEFAULT_QUEUE_CAPACITY, DEFAULT_USER_AGENT, DEFAULT_WORKER_COUNT,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Service configuration.
///
/// Parsed from the command line (with environment variable fallbacks), or
/// constructed programmatically for library and test usage.
///
/// # Examples
///
/// ```no_run
/// use page_analyzer::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     db_path: PathBuf::from("analyses.db"),
///     workers: 5,
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "page_analyzer",
    version,
    about = "Crawls submitted URLs, extracts page metrics and checks every discovered link"
)]
pub struct Config {
    /// Database path (SQLite file)
    #[arg(long, env = "PAGE_ANALYZER_DB_PATH", default_value = DB_PATH)]
    pub db_path: PathBuf,

    /// Address the HTTP API listens on
    #[arg(long, env = "PAGE_ANALYZER_BIND", default_value = DEFAULT_BIND_ADDR)]
    pub bind: String,

    /// Number of job workers
    #[arg(long, env = "PAGE_ANALYZER_WORKERS", default_value_t = DEFAULT_WORKER_COUNT)]
    pub workers: usize,

    /// Capacity of the job queue
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Number of concurrent link probes per job
    #[arg(long, default_value_t = DEFAULT_LINK_CHECK_WORKERS)]
    pub link_check_workers: usize,

    /// Page fetch timeout in seconds
    #[arg(long, default_value_t = DEFAULT_PAGE_TIMEOUT_SECS)]
    pub page_timeout_secs: u64,

    /// Per-link probe timeout in seconds
    #[arg(long, default_value_t = DEFAULT_LINK_TIMEOUT_SECS)]
    pub link_timeout_secs: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Log level
    #[arg(long, value_enum, env = "PAGE_ANALYZER_LOG_LEVEL", default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,
}

impl Config {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn link_timeout(&self) -> Duration {
        Duration::from_secs(self.link_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DB_PATH),
            bind: DEFAULT_BIND_ADDR.to_string(),
            workers: DEFAULT_WORKER_COUNT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            link_check_workers: DEFAULT_LINK_CHECK_WORKERS,
            page_timeout_secs: DEFAULT_PAGE_TIMEOUT_SECS,
            link_timeout_secs: DEFAULT_LINK_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
        }
    }
}
