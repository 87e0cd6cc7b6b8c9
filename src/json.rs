use crate::attr::{Attr, Value};
use crate::destination::{Destination, EmitError, SharedDestination};
use crate::level::Level;
use crate::output::HandlerOptions;
use crate::record::{Record, Source};
use crate::scope::Scope;
use crate::writer::SharedWriter;
use chrono::SecondsFormat;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::sync::Arc;

/// Destination writing newline-delimited JSON, one object per record.
///
/// Field order is `time`, `level`, optional `source`, `msg`, then the
/// attributes. Groups become nested objects and durations are written
/// as integer nanoseconds.
#[derive(Clone)]
pub struct JsonDestination {
    writer: SharedWriter,
    options: HandlerOptions,
    scope: Scope,
}

impl JsonDestination {
    pub fn new(writer: SharedWriter, options: HandlerOptions) -> Self {
        JsonDestination { writer, options, scope: Scope::default() }
    }

    fn encode(&self, record: &Record) -> Result<Vec<u8>, EmitError> {
        let attrs = self.scope.resolve(record.attrs());
        let entry = Entry { record, attrs: &attrs, add_source: self.options.add_source };
        let mut line = serde_json::to_vec(&entry)?;
        line.push(b'\n');
        Ok(line)
    }
}

/// One output object. Serialized entry by entry so that repeated
/// attribute keys are all written, in order.
struct Entry<'a> {
    record: &'a Record,
    attrs: &'a [Attr],
    add_source: bool,
}

impl Serialize for Entry<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("time", &self.record.time().to_rfc3339_opts(SecondsFormat::Millis, true))?;
        map.serialize_entry("level", self.record.level().as_str())?;
        if self.add_source {
            if let Some(source) = self.record.source() {
                map.serialize_entry("source", &SourceFields(source))?;
            }
        }
        map.serialize_entry("msg", self.record.message())?;
        for attr in self.attrs {
            map.serialize_entry(&attr.key, &JsonValue(&attr.value))?;
        }
        map.end()
    }
}

struct SourceFields<'a>(&'a Source);

impl Serialize for SourceFields<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("file", &self.0.file)?;
        map.serialize_entry("line", &self.0.line)?;
        map.end()
    }
}

struct JsonValue<'a>(&'a Value);

impl Serialize for JsonValue<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Value::String(s) => serializer.serialize_str(s),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Duration(d) => {
                serializer.serialize_u64(u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
            }
            Value::Group(members) => {
                let mut map = serializer.serialize_map(Some(members.len()))?;
                for member in members {
                    map.serialize_entry(&member.key, &JsonValue(&member.value))?;
                }
                map.end()
            }
        }
    }
}

impl Destination for JsonDestination {
    fn enabled(&self, level: Level) -> bool {
        level >= self.options.level
    }

    fn emit(&self, record: &Record) -> Result<(), EmitError> {
        let line = self.encode(record)?;
        self.writer.write_line(&line)
    }

    fn with_attrs(self: Arc<Self>, attrs: &[Attr]) -> SharedDestination {
        if attrs.is_empty() {
            return self;
        }
        Arc::new(JsonDestination {
            writer: self.writer.clone(),
            options: self.options.clone(),
            scope: self.scope.with_attrs(attrs),
        })
    }

    fn with_group(self: Arc<Self>, name: &str) -> SharedDestination {
        if name.is_empty() {
            return self;
        }
        Arc::new(JsonDestination {
            writer: self.writer.clone(),
            options: self.options.clone(),
            scope: self.scope.with_group(name),
        })
    }
}
