use crate::attr::Attr;
use crate::level::Level;
use chrono::{DateTime, Utc};
use std::panic::Location;

/// Source position that produced a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub file: String,
    pub line: u32,
}

impl From<&Location<'_>> for Source {
    fn from(location: &Location<'_>) -> Self {
        Source { file: location.file().to_string(), line: location.line() }
    }
}

/// One structured log event.
///
/// Records are immutable once built; destinations only ever see `&Record`,
/// so no destination can alter what another destination receives.
#[derive(Debug, Clone)]
pub struct Record {
    time: DateTime<Utc>,
    level: Level,
    message: String,
    attrs: Vec<Attr>,
    source: Option<Source>,
}

impl Record {
    /// New record stamped with the current time and no attributes.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Record {
            time: Utc::now(),
            level,
            message: message.into(),
            attrs: Vec::new(),
            source: None,
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    pub fn with_attrs(mut self, attrs: impl IntoIterator<Item = Attr>) -> Self {
        self.attrs.extend(attrs);
        self
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn time(&self) -> DateTime<Utc> {
        self.time
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn source(&self) -> Option<&Source> {
        self.source.as_ref()
    }
}
