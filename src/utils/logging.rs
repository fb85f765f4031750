use clap::ValueEnum;
use std::io;
use tracing::Level;

/// Log levels accepted by `--loglevel`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum LogLevel {
    Debug,
    Info,
    #[default]
    Warning,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
        }
    }
}

/// Install the text subscriber on stderr with full timestamps.
///
/// Returns `false` when a subscriber was already installed (repeated
/// dispatches in one process keep the first one).
pub fn init_logging(level: LogLevel) -> bool {
    tracing_subscriber::fmt()
        .with_max_level(Level::from(level))
        .with_target(false)
        .with_writer(io::stderr)
        .try_init()
        .is_ok()
}
