use crate::destination::SharedDestination;
use crate::discard::Discard;
use crate::env::{
    env_opt, env_or, parse_flag, LOG_ADD_SOURCE_ENV, LOG_CONSOLE_ENV, LOG_CONSOLE_FORMAT_ENV,
    LOG_FILE_ENV, LOG_FILE_FORMAT_ENV, LOG_LEVEL_ENV,
};
use crate::fanout::FanOut;
use crate::layer::DestinationLayer;
use crate::level::{Level, ParseLevelError};
use crate::logger::Logger;
use crate::output::{make_destination, FormatError, HandlerOptions, OutputFormat};
use crate::writer::SharedWriter;
use serde::Deserialize;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Logger configuration.
///
/// Every field has a default, so partial configs deserialize fine:
///
/// **Fields**
/// - `level`: minimum level for every output. Defaults to `Info`.
/// - `console_output`: log to stdout. `None` means `true`.
/// - `file_output`: log to `file_path`. Defaults to `false`.
/// - `file_path`: required when `file_output` is set.
/// - `file_format`: encoding of the file output. Defaults to JSON.
/// - `console_format`: encoding of the console output. Defaults to text.
/// - `add_source`: render the call site (file:line) of each record.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub level: Level,
    pub console_output: Option<bool>,
    pub file_output: bool,
    pub file_path: Option<PathBuf>,
    pub file_format: Option<OutputFormat>,
    pub console_format: Option<OutputFormat>,
    pub add_source: bool,
}

impl Config {
    /// Build a config from the `LOG_*` variables in [`crate::env`].
    ///
    /// Unset variables keep their defaults; `LOG_FILE` also turns file
    /// output on.
    pub fn from_env() -> Result<Config, InitError> {
        let mut config = Config {
            level: env_or(LOG_LEVEL_ENV, "info").parse()?,
            ..Config::default()
        };
        if let Some(value) = env_opt(LOG_CONSOLE_ENV) {
            config.console_output = Some(read_flag(LOG_CONSOLE_ENV, &value)?);
        }
        if let Some(value) = env_opt(LOG_CONSOLE_FORMAT_ENV) {
            config.console_format = Some(value.parse()?);
        }
        if let Some(path) = env_opt(LOG_FILE_ENV) {
            config.file_output = true;
            config.file_path = Some(PathBuf::from(path));
        }
        if let Some(value) = env_opt(LOG_FILE_FORMAT_ENV) {
            config.file_format = Some(value.parse()?);
        }
        if let Some(value) = env_opt(LOG_ADD_SOURCE_ENV) {
            config.add_source = read_flag(LOG_ADD_SOURCE_ENV, &value)?;
        }
        Ok(config)
    }
}

fn read_flag(key: &'static str, value: &str) -> Result<bool, InitError> {
    parse_flag(value).ok_or_else(|| InitError::InvalidFlag { key, value: value.to_string() })
}

/// Keeps the log file open; returned from [`init`].
///
/// Call [`LogGuard::close`] on shutdown to flush and release the file.
/// Without file output this is a no-op.
#[derive(Clone, Debug)]
pub struct LogGuard {
    file: Option<SharedWriter>,
}

impl LogGuard {
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// Flush and close the log file. Records emitted to the file
    /// afterwards fail with [`EmitError::Closed`](crate::destination::EmitError::Closed).
    pub fn close(&self) -> io::Result<()> {
        match &self.file {
            Some(writer) => writer.close(),
            None => Ok(()),
        }
    }
}

/// Error type returned when initializing the logger.
#[derive(thiserror::Error, Debug)]
pub enum InitError {
    #[error("file_path is required when file_output is enabled")]
    MissingFilePath,

    #[error("failed to create log directory {path:?}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to open log file {path:?}: {source}")]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    InvalidLevel(#[from] ParseLevelError),

    #[error(transparent)]
    InvalidFormat(#[from] FormatError),

    #[error("invalid value {value:?} for {key}")]
    InvalidFlag { key: &'static str, value: String },

    #[error("a global tracing subscriber is already installed")]
    GlobalDefault(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Build a [`Logger`] from `config`, writing console output to stdout.
///
/// **Returns**
/// - the logger, wrapping zero, one or a [`FanOut`] of several destinations;
/// - a [`LogGuard`] owning the log file, if any.
///
/// Nothing global is touched; see [`install`] for that.
pub fn init(config: Config) -> Result<(Logger, LogGuard), InitError> {
    init_with_writer(config, SharedWriter::stdout())
}

/// Same as [`init`] with console output sent to `console` instead of stdout.
pub fn init_with_writer(
    config: Config,
    console: SharedWriter,
) -> Result<(Logger, LogGuard), InitError> {
    let options = HandlerOptions { level: config.level, add_source: config.add_source };
    let mut destinations: Vec<SharedDestination> = Vec::new();
    let mut guard = LogGuard { file: None };

    if config.console_output.unwrap_or(true) {
        let format = config.console_format.unwrap_or(OutputFormat::Text);
        destinations.push(make_destination(format, console, options.clone()));
        debug!(level = %config.level, %format, add_source = config.add_source, "console logging enabled");
    }

    if config.file_output {
        let path = config
            .file_path
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(InitError::MissingFilePath)?;
        let writer = SharedWriter::file(open_log_file(path)?);
        guard.file = Some(writer.clone());

        let format = config.file_format.unwrap_or(OutputFormat::Json);
        destinations.push(make_destination(format, writer, options));
        debug!(path = %path.display(), level = %config.level, %format, add_source = config.add_source, "file logging enabled");
    }

    let handler: SharedDestination = match destinations.len() {
        0 => {
            warn!("no log outputs configured, logs will be discarded");
            Arc::new(Discard)
        }
        1 => destinations.remove(0),
        _ => Arc::new(FanOut::new(&destinations)),
    };

    let logger = Logger::new(handler);
    logger.info("logger initialized", []);
    Ok((logger, guard))
}

/// Install a global `tracing` subscriber that forwards every event to
/// `logger`.
///
/// The process-wide default can be set only once: the first caller wins
/// and later calls fail with [`InitError::GlobalDefault`]. Call it from
/// `main` before spawning threads that log.
pub fn install(logger: &Logger) -> Result<(), InitError> {
    let subscriber = Registry::default().with(DestinationLayer::new(logger));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// [`init`] followed by [`install`].
pub fn init_global(config: Config) -> Result<(Logger, LogGuard), InitError> {
    let (logger, guard) = init(config)?;
    install(&logger)?;
    Ok((logger, guard))
}

fn open_log_file(path: &Path) -> Result<File, InitError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() && dir != Path::new(".") && dir != Path::new("/") {
            create_log_dir(dir)
                .map_err(|source| InitError::CreateDir { path: dir.to_path_buf(), source })?;
        }
    }

    let mut options = OpenOptions::new();
    options.append(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o640);
    }
    options
        .open(path)
        .map_err(|source| InitError::OpenFile { path: path.to_path_buf(), source })
}

fn create_log_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o750);
    }
    builder.create(dir)
}
