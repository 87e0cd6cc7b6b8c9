use crate::attr::Attr;
use crate::level::Level;
use crate::record::Record;
use std::sync::Arc;

/// Shared handle to any destination.
pub type SharedDestination = Arc<dyn Destination>;

/// Independently configured sink for [`Record`]s.
///
/// Implementations decide on their own which levels they accept and how
/// accumulated attributes and groups are rendered. The derivation methods
/// take `self: Arc<Self>` so that a destination can hand itself back
/// unchanged instead of copying its state.
pub trait Destination: Send + Sync {
    /// Whether a record at `level` would be written.
    ///
    /// Pure query with no side effects; callers use it to skip building
    /// records nobody wants.
    fn enabled(&self, level: Level) -> bool;

    /// Write a single record.
    ///
    /// **Returns**
    /// - `Ok(())` once the record has been handed to the underlying writer.
    /// - `Err(..)` on encoding or write failure.
    ///
    /// Implementations must not keep the borrow past the call.
    fn emit(&self, record: &Record) -> Result<(), EmitError>;

    /// Destination that additionally renders `attrs` on every record.
    ///
    /// The receiver is left untouched.
    fn with_attrs(self: Arc<Self>, attrs: &[Attr]) -> SharedDestination;

    /// Destination that nests subsequent attributes under `name`.
    ///
    /// By convention an empty `name` returns the receiver itself.
    fn with_group(self: Arc<Self>, name: &str) -> SharedDestination;
}

/// Error returned by [`Destination::emit`].
#[derive(thiserror::Error, Debug)]
pub enum EmitError {
    #[error("failed to write log record: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode log record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("log writer is closed")]
    Closed,

    #[error("log writer lock poisoned")]
    Poisoned,

    #[error("{0}")]
    Custom(String),
}
