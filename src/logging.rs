use std::fs::File;
use std::io;
use std::path::PathBuf;

use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use thiserror::Error;

/// Where log records go and how verbose each destination is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub terminal_level: LevelFilter,
    pub log_file: Option<PathBuf>,
    pub file_level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            terminal_level: LevelFilter::Warn,
            log_file: None,
            file_level: LevelFilter::Debug,
        }
    }
}

impl LogConfig {
    /// Raises the terminal level by one step per `-v`.
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.terminal_level = match verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        self
    }

    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("cannot create log file {path}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("a logger is already installed")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

/// Installs the global logger: warnings and above on the terminal, plus an
/// optional file receiving everything down to `file_level`.
pub fn init_logging(config: &LogConfig) -> Result<(), LoggingError> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        config.terminal_level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = &config.log_file {
        let file = File::create(path).map_err(|source| LoggingError::LogFile { path: path.clone(), source })?;
        loggers.push(WriteLogger::new(config.file_level, Config::default(), file));
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}
