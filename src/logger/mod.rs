//! Logger built on `tracing-subscriber`.
//!
//! - Console output, coloured only on a terminal
//! - Optional file output in full, compact or JSON format
//! - A reloadable level filter exposed through [`LogLevelHandle`]

pub mod config;
pub mod error;
pub(crate) mod writer;


pub use config::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig, VALID_LEVELS, parse_level};
pub use error::LoggerError;

use std::io::IsTerminal;

use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, fmt,
    layer::{Layered, SubscriberExt},
    reload,
    util::SubscriberInitExt,
};
use writer::LogFileWriter;

type FilteredRegistry = Layered<reload::Layer<EnvFilter, Registry>, Registry>;
type BoxedLayer = Box<dyn Layer<FilteredRegistry> + Send + Sync + 'static>;

/// Changes the active level filter of an installed logger.
#[derive(Clone)]
pub struct LogLevelHandle {
    inner: reload::Handle<EnvFilter, Registry>,
}

impl LogLevelHandle {
    /// Replaces the filter with `level`, which must be one of [`VALID_LEVELS`].
    pub fn set_level(&self, level: &str) -> Result<(), LoggerError> {
        parse_level(level)?;
        let filter = EnvFilter::try_new(level.trim().to_lowercase())
            .map_err(|e| LoggerError::config(e.to_string()))?;
        self.inner
            .reload(filter)
            .map_err(|e| LoggerError::subscriber(e.to_string()))
    }

    /// Directive string of the active filter.
    pub fn current_level(&self) -> Result<String, LoggerError> {
        self.inner
            .with_current(|filter| filter.to_string())
            .map_err(|e| LoggerError::subscriber(e.to_string()))
    }
}

impl std::fmt::Debug for LogLevelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogLevelHandle").finish_non_exhaustive()
    }
}

/// Installs the global subscriber.
pub fn init_logger(config: LoggerConfig) -> Result<LogLevelHandle, LoggerError> {
    let (subscriber, handle) = build_subscriber(&config)?;
    subscriber
        .try_init()
        .map_err(|e| LoggerError::subscriber(e.to_string()))?;
    Ok(handle)
}

/// Builds the subscriber without installing it.
pub(crate) fn build_subscriber(
    config: &LoggerConfig,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogLevelHandle), LoggerError> {
    config.validate()?;

    let filter = EnvFilter::try_new(config.level.trim().to_lowercase())
        .map_err(|e| LoggerError::config(e.to_string()))?;
    let (filter, inner) = reload::Layer::new(filter);

    // File layer goes first so ANSI escapes from the console layer do not
    // leak into formatted span fields in the file.
    let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);
    if config.file.enabled {
        layers.push(file_layer(&config.file)?);
    }
    if config.console.enabled {
        layers.push(console_layer(&config.console));
    }

    let subscriber = tracing_subscriber::registry().with(filter).with(layers);
    Ok((subscriber, LogLevelHandle { inner }))
}

fn console_layer(config: &ConsoleConfig) -> BoxedLayer {
    let use_ansi = config.colored && std::io::stdout().is_terminal();
    fmt::layer()
        .with_ansi(use_ansi)
        .with_target(true)
        .with_level(true)
        .boxed()
}

fn file_layer(config: &FileConfig) -> Result<BoxedLayer, LoggerError> {
    let writer = LogFileWriter::new(config)?;
    let layer = match config.format {
        LogFormat::Full => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .with_ansi(false)
            .with_target(true)
            .compact()
            .with_writer(writer)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_ansi(false)
            .json()
            .with_writer(writer)
            .boxed(),
    };
    Ok(layer)
}
