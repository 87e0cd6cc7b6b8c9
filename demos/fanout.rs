use std::sync::Arc;

use tracing_log_fanout::output::{make_destination, HandlerOptions, OutputFormat};
use tracing_log_fanout::writer::SharedWriter;
use tracing_log_fanout::{Attr, Destination, EmitError, FanOut, Level, Logger, Record, SharedDestination};

/// Example of plugging a completely custom destination in next to the
/// built-in encoders. Imagine this forwards to some in-house alerting
/// system; here it just prints the record.
struct AlertDestination {
    context: Vec<Attr>,
}

impl Destination for AlertDestination {
    fn enabled(&self, level: Level) -> bool {
        level >= Level::Error
    }

    fn emit(&self, record: &Record) -> Result<(), EmitError> {
        println!("[alert] {} {:?} {:?}", record.message(), self.context, record.attrs());
        Ok(())
    }

    fn with_attrs(self: Arc<Self>, attrs: &[Attr]) -> SharedDestination {
        let mut context = self.context.clone();
        context.extend_from_slice(attrs);
        Arc::new(AlertDestination { context })
    }

    fn with_group(self: Arc<Self>, _name: &str) -> SharedDestination {
        self
    }
}

fn main() {
    let console = make_destination(
        OutputFormat::Text,
        SharedWriter::stdout(),
        HandlerOptions { level: Level::Debug, add_source: false },
    );
    let json = make_destination(
        OutputFormat::Json,
        SharedWriter::stdout(),
        HandlerOptions { level: Level::Warn, add_source: true },
    );
    let alerts: SharedDestination = Arc::new(AlertDestination { context: Vec::new() });

    let logger = Logger::new(Arc::new(FanOut::new(&[console, json, alerts])));
    let logger = logger.with([Attr::string("service", "billing")]);

    logger.debug("cache warmed", [Attr::int("entries", 1024)]);
    logger.warn("payment slow", [Attr::duration("took", std::time::Duration::from_millis(820))]);
    logger
        .with_group("payment")
        .error("charge failed", [Attr::string("customer", "c-17"), Attr::bool("retry", true)]);
}
