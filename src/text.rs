use crate::attr::{Attr, Value};
use crate::destination::{Destination, EmitError, SharedDestination};
use crate::level::Level;
use crate::output::HandlerOptions;
use crate::record::Record;
use crate::scope::Scope;
use crate::writer::SharedWriter;
use chrono::SecondsFormat;
use std::fmt::Write as _;
use std::sync::Arc;

/// Destination writing one `key=value` line per record:
///
/// ```text
/// time=2024-05-01T10:00:00.000Z level=INFO msg="user logged in" user=42 req.id=7
/// ```
///
/// Attributes nested in groups are flattened with dotted keys. Values that
/// are empty or contain spaces, `=`, `"` or control characters are quoted.
#[derive(Clone)]
pub struct TextDestination {
    writer: SharedWriter,
    options: HandlerOptions,
    scope: Scope,
}

impl TextDestination {
    pub fn new(writer: SharedWriter, options: HandlerOptions) -> Self {
        TextDestination { writer, options, scope: Scope::default() }
    }

    fn encode(&self, record: &Record) -> String {
        let mut line = String::with_capacity(128);
        let time = record.time().to_rfc3339_opts(SecondsFormat::Millis, true);
        push_pair(&mut line, "time", &time);
        push_pair(&mut line, "level", record.level().as_str());
        if self.options.add_source {
            if let Some(source) = record.source() {
                push_pair(&mut line, "source", &format!("{}:{}", source.file, source.line));
            }
        }
        push_pair(&mut line, "msg", record.message());
        for attr in self.scope.resolve(record.attrs()) {
            push_attr(&mut line, "", &attr);
        }
        line.push('\n');
        line
    }
}

fn push_attr(line: &mut String, prefix: &str, attr: &Attr) {
    let key = if prefix.is_empty() {
        attr.key.clone()
    } else {
        format!("{prefix}.{}", attr.key)
    };
    match &attr.value {
        Value::Group(members) => {
            for member in members {
                push_attr(line, &key, member);
            }
        }
        value => push_pair(line, &key, &value.to_string()),
    }
}

fn push_pair(line: &mut String, key: &str, value: &str) {
    if !line.is_empty() {
        line.push(' ');
    }
    push_quoted(line, key);
    line.push('=');
    push_quoted(line, value);
}

fn push_quoted(line: &mut String, s: &str) {
    if needs_quoting(s) {
        let _ = write!(line, "{s:?}");
    } else {
        line.push_str(s);
    }
}

fn needs_quoting(s: &str) -> bool {
    s.is_empty() || s.chars().any(|c| c.is_whitespace() || c.is_control() || c == '=' || c == '"')
}

impl Destination for TextDestination {
    fn enabled(&self, level: Level) -> bool {
        level >= self.options.level
    }

    fn emit(&self, record: &Record) -> Result<(), EmitError> {
        self.writer.write_line(self.encode(record).as_bytes())
    }

    fn with_attrs(self: Arc<Self>, attrs: &[Attr]) -> SharedDestination {
        if attrs.is_empty() {
            return self;
        }
        Arc::new(TextDestination {
            writer: self.writer.clone(),
            options: self.options.clone(),
            scope: self.scope.with_attrs(attrs),
        })
    }

    fn with_group(self: Arc<Self>, name: &str) -> SharedDestination {
        if name.is_empty() {
            return self;
        }
        Arc::new(TextDestination {
            writer: self.writer.clone(),
            options: self.options.clone(),
            scope: self.scope.with_group(name),
        })
    }
}
