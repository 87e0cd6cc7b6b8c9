use crate::destination::SharedDestination;
use crate::json::JsonDestination;
use crate::level::Level;
use crate::text::TextDestination;
use crate::writer::SharedWriter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Options shared by the encoding destinations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandlerOptions {
    /// Minimum level written; records below it are rejected by `enabled`.
    pub level: Level,
    /// Render the `source` (file:line) of records that carry one.
    pub add_source: bool,
}

/// Line encoding of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type returned when parsing an output format name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown output format {0:?}, expected \"text\" or \"json\"")]
pub struct FormatError(pub String);

impl FromStr for OutputFormat {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(FormatError(s.to_string())),
        }
    }
}

impl TryFrom<String> for OutputFormat {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputFormat> for String {
    fn from(format: OutputFormat) -> Self {
        format.as_str().to_string()
    }
}

/// Create the concrete destination for `format` writing to `writer`.
///
/// This is the single place where an encoding is chosen; everything
/// downstream only sees a [`SharedDestination`].
pub fn make_destination(
    format: OutputFormat,
    writer: SharedWriter,
    options: HandlerOptions,
) -> SharedDestination {
    match format {
        OutputFormat::Text => Arc::new(TextDestination::new(writer, options)),
        OutputFormat::Json => Arc::new(JsonDestination::new(writer, options)),
    }
}
