use crate::attr::Attr;
use crate::destination::SharedDestination;
use crate::level::Level;
use crate::logger::Logger;
use crate::record::{Record, Source};
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Id, Record as SpanValues};
use tracing::{Event, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

/// `tracing_subscriber` layer that turns `tracing` events into
/// [`Record`]s and emits them through a [`Logger`]'s destination.
///
/// Every span gets its own derived destination: the parent's destination
/// with a group named after the span, carrying the span's fields. Events
/// are emitted through the destination of the span they occur in.
pub struct DestinationLayer {
    root: SharedDestination,
}

/// Derived destination stored in a span's extensions.
struct SpanDestination(SharedDestination);

impl DestinationLayer {
    pub fn new(logger: &Logger) -> Self {
        DestinationLayer { root: Arc::clone(logger.handler()) }
    }

    fn destination_for<S>(&self, id: Option<&Id>, ctx: &Context<'_, S>) -> SharedDestination
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        if let Some(span) = id.and_then(|id| ctx.span(id)) {
            let extensions = span.extensions();
            if let Some(derived) = extensions.get::<SpanDestination>() {
                return Arc::clone(&derived.0);
            }
        }
        Arc::clone(&self.root)
    }
}

impl<S> Layer<S> for DestinationLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: Context<'_, S>) -> bool {
        self.root.enabled(Level::from(metadata.level()))
    }

    fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let parent = span.parent().map(|p| p.id());
        let base = self.destination_for(parent.as_ref(), &ctx);

        let mut fields = Vec::new();
        let mut message = None;
        attrs.record(&mut FieldVisitor { fields: &mut fields, message: &mut message });
        if let Some(message) = message {
            fields.push(Attr::string("message", message));
        }

        let derived = base.with_group(span.name()).with_attrs(&fields);
        span.extensions_mut().insert(SpanDestination(derived));
    }

    fn on_record(&self, id: &Id, values: &SpanValues<'_>, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else { return };
        let mut fields = Vec::new();
        let mut message = None;
        values.record(&mut FieldVisitor { fields: &mut fields, message: &mut message });
        if fields.is_empty() {
            return;
        }

        let mut extensions = span.extensions_mut();
        if let Some(current) = extensions.get_mut::<SpanDestination>() {
            current.0 = Arc::clone(&current.0).with_attrs(&fields);
        }
    }

    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = Level::from(meta.level());

        let scope = ctx.event_span(event).map(|span| span.id());
        let destination = self.destination_for(scope.as_ref(), &ctx);
        if !destination.enabled(level) {
            return;
        }

        let mut fields = Vec::new();
        let mut message: Option<String> = None;
        event.record(&mut FieldVisitor { fields: &mut fields, message: &mut message });

        let mut record = Record::new(level, message.unwrap_or_default()).with_attrs(fields);
        if let (Some(file), Some(line)) = (meta.file(), meta.line()) {
            record = record.with_source(Source { file: file.to_string(), line });
        }

        if let Err(e) = destination.emit(&record) {
            eprintln!("log destination failed: {}", e);
        }
    }
}

/// Collects `tracing` fields as [`Attr`]s, pulling out `message`.
///
/// There is no float [`Value`](crate::attr::Value), so `f64` fields are
/// kept as their `Display` string.
pub struct FieldVisitor<'a> {
    pub fields: &'a mut Vec<Attr>,
    pub message: &'a mut Option<String>,
}

impl<'a> Visit for FieldVisitor<'a> {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            *self.message = Some(value.to_string());
        } else {
            self.fields.push(Attr::string(field.name(), value));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.push(Attr::int(field.name(), value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match i64::try_from(value) {
            Ok(v) => self.fields.push(Attr::int(field.name(), v)),
            Err(_) => self.fields.push(Attr::string(field.name(), value.to_string())),
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.push(Attr::string(field.name(), value.to_string()));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.push(Attr::bool(field.name(), value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = Some(format!("{:?}", value));
        } else {
            self.fields.push(Attr::string(field.name(), format!("{:?}", value)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fanout::FanOut;
    use crate::output::{make_destination, HandlerOptions, OutputFormat};
    use crate::writer::{MemoryWriter, SharedWriter};
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::Registry;

    fn capture(format: OutputFormat, level: Level) -> (SharedDestination, MemoryWriter) {
        let memory = MemoryWriter::new();
        let options = HandlerOptions { level, add_source: false };
        (make_destination(format, SharedWriter::new(memory.clone()), options), memory)
    }

    #[test]
    fn events_reach_every_destination() {
        let (text, text_out) = capture(OutputFormat::Text, Level::Debug);
        let (json, json_out) = capture(OutputFormat::Json, Level::Warn);
        let logger = Logger::new(Arc::new(FanOut::new(&[text, json])));
        let subscriber = Registry::default().with(DestinationLayer::new(&logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(user = 42, "signed in");
            tracing::warn!(retries = 3u64, "slow upstream");
        });

        let text_lines = text_out.lines();
        assert_eq!(text_lines.len(), 2);
        assert!(text_lines[0].contains("msg=\"signed in\" user=42"), "{}", text_lines[0]);

        let json_lines = json_out.lines();
        assert_eq!(json_lines.len(), 1);
        let obj: serde_json::Value = serde_json::from_str(&json_lines[0]).unwrap();
        assert_eq!(obj["msg"], "slow upstream");
        assert_eq!(obj["retries"], 3);
    }

    #[test]
    fn float_fields_keep_display_form() {
        let (json, out) = capture(OutputFormat::Json, Level::Debug);
        let logger = Logger::new(json);
        let subscriber = Registry::default().with(DestinationLayer::new(&logger));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(ratio = 0.25f64, "sampled");
        });

        let obj: serde_json::Value = serde_json::from_str(&out.contents()).unwrap();
        assert_eq!(obj["ratio"], "0.25");
    }

    #[test]
    fn spans_become_groups() {
        let (json, out) = capture(OutputFormat::Json, Level::Debug);
        let logger = Logger::new(json);
        let subscriber = Registry::default().with(DestinationLayer::new(&logger));

        tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("request", id = 7, status = tracing::field::Empty);
            let _guard = span.enter();
            span.record("status", 200);
            tracing::info!(path = "/health", "handled");
        });

        let obj: serde_json::Value = serde_json::from_str(&out.contents()).unwrap();
        assert_eq!(obj["msg"], "handled");
        assert_eq!(obj["request"]["id"], 7);
        assert_eq!(obj["request"]["status"], 200);
        assert_eq!(obj["request"]["path"], "/health");
    }
}
