use crate::attr::Attr;
use crate::destination::{Destination, EmitError, SharedDestination};
use crate::level::Level;
use crate::record::Record;
use std::sync::Arc;

/// A destination that drops all records.
///
/// Installed when no output is configured, and handy in tests that only
/// care about the logging call path.
#[derive(Clone, Copy, Default, Debug)]
pub struct Discard;

impl Destination for Discard {
    fn enabled(&self, _level: Level) -> bool {
        false
    }

    fn emit(&self, _record: &Record) -> Result<(), EmitError> {
        Ok(())
    }

    fn with_attrs(self: Arc<Self>, _attrs: &[Attr]) -> SharedDestination {
        self
    }

    fn with_group(self: Arc<Self>, _name: &str) -> SharedDestination {
        self
    }
}
