use crate::attr::Attr;
use crate::destination::{EmitError, SharedDestination};
use crate::level::Level;
use crate::record::{Record, Source};
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Owned logging handle over a single (possibly fan-out) destination.
///
/// Cloning is cheap and clones share the destination. `with` and
/// `with_group` return new loggers; the receiver keeps logging exactly as
/// before.
#[derive(Clone)]
pub struct Logger {
    handler: SharedDestination,
}

impl Logger {
    pub fn new(handler: SharedDestination) -> Self {
        Logger { handler }
    }

    pub fn handler(&self) -> &SharedDestination {
        &self.handler
    }

    pub fn enabled(&self, level: Level) -> bool {
        self.handler.enabled(level)
    }

    /// Build and emit a record at `level` unless no destination wants it.
    ///
    /// The caller's file and line are attached as the record source.
    #[track_caller]
    pub fn log(
        &self,
        level: Level,
        message: impl Into<String>,
        attrs: impl IntoIterator<Item = Attr>,
    ) -> Result<(), EmitError> {
        if !self.handler.enabled(level) {
            return Ok(());
        }
        let record = Record::new(level, message)
            .with_attrs(attrs)
            .with_source(Source::from(Location::caller()));
        self.handler.emit(&record)
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        let _ = self.log(Level::Debug, message, attrs);
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        let _ = self.log(Level::Info, message, attrs);
    }

    #[track_caller]
    pub fn warn(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        let _ = self.log(Level::Warn, message, attrs);
    }

    #[track_caller]
    pub fn error(&self, message: impl Into<String>, attrs: impl IntoIterator<Item = Attr>) {
        let _ = self.log(Level::Error, message, attrs);
    }

    /// Logger whose records all carry `attrs`.
    pub fn with(&self, attrs: impl IntoIterator<Item = Attr>) -> Logger {
        let attrs: Vec<Attr> = attrs.into_iter().collect();
        Logger { handler: Arc::clone(&self.handler).with_attrs(&attrs) }
    }

    /// Logger nesting all further attributes under `name`.
    pub fn with_group(&self, name: &str) -> Logger {
        Logger { handler: Arc::clone(&self.handler).with_group(name) }
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").finish_non_exhaustive()
    }
}
