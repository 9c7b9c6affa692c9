use super::{ErrorReporter, ErrorReporting, LogRecord, ReportLevel};
use crate::logs::{parse_context, CONTEXT_FIELD, LOGGER_FIELD};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Visitor collecting the message, error and fields of an event.
struct EventVisitor<'a> {
    record: &'a mut LogRecord,
}

impl EventVisitor<'_> {
    fn store(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.record.message = Some(value),
            "error" | "err" => self.record.error = Some(value),
            name => {
                self.record.fields.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for EventVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.store(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.store(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.store(field, format!("{value:?}"));
    }
}

/// A `tracing_subscriber` layer sending warnings and errors to an
/// [`ErrorReporter`].
///
/// Events written by a [`TracingLogger`](crate::logs::TracingLogger) have
/// their `context` field split into the logger's own fields. Fields of the
/// event itself win over logger fields with the same name.
///
/// ```
/// use o11y_sdk::error_reporting::{ErrorReportingLayer, InMemoryErrorReporter};
/// use std::sync::Arc;
/// use tracing_subscriber::prelude::*;
///
/// let reporter = InMemoryErrorReporter::default();
/// let subscriber = tracing_subscriber::registry()
///     .with(ErrorReportingLayer::new(Arc::new(reporter.clone())));
///
/// tracing::subscriber::with_default(subscriber, || {
///     tracing::info!("not reported");
///     tracing::error!(error = "connection reset", "upstream failed");
/// });
///
/// assert_eq!(reporter.exceptions().len(), 1);
/// assert!(reporter.messages().is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct ErrorReportingLayer {
    reporting: ErrorReporting,
    min_level: Level,
}

impl ErrorReportingLayer {
    /// A layer reporting `WARN` and `ERROR` events to `reporter`.
    pub fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        ErrorReportingLayer {
            reporting: ErrorReporting::new(reporter),
            min_level: Level::WARN,
        }
    }

    /// Fields added to every report.
    pub fn with_static_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.reporting = self.reporting.with_static_fields(fields);
        self
    }

    /// The least severe level that is reported.
    pub fn with_min_level(mut self, min_level: Level) -> Self {
        self.min_level = min_level;
        self
    }
}

impl<S> Layer<S> for ErrorReportingLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        // `Level` orders more verbose levels as greater.
        if *meta.level() > self.min_level {
            return;
        }

        let mut record = LogRecord::default();
        event.record(&mut EventVisitor {
            record: &mut record,
        });
        if record.fields.contains_key(LOGGER_FIELD) {
            if let Some(context) = record.fields.remove(CONTEXT_FIELD) {
                for (key, value) in parse_context(&context) {
                    record.fields.entry(key).or_insert(value);
                }
            }
        }
        record
            .fields
            .entry("target".to_string())
            .or_insert_with(|| meta.target().to_string());

        self.reporting
            .write(ReportLevel::from_level(meta.level()), record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_reporting::InMemoryErrorReporter;
    use crate::logs::TracingLogger;
    use o11y::logs::Logger;
    use tracing_subscriber::prelude::*;

    fn capture(layer: ErrorReportingLayer, f: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, f);
    }

    fn layer() -> (ErrorReportingLayer, InMemoryErrorReporter) {
        let reporter = InMemoryErrorReporter::default();
        let layer = ErrorReportingLayer::new(Arc::new(reporter.clone())).with_static_fields(
            BTreeMap::from([
                ("environment".to_string(), "test-env".to_string()),
                ("region".to_string(), "test-region".to_string()),
            ]),
        );
        (layer, reporter)
    }

    #[test]
    fn error_with_error_field_is_an_exception() {
        let (layer, reporter) = layer();
        capture(layer, || {
            tracing::error!(log_type = "uncaughtException", error = "test err", "test");
        });

        let exceptions = reporter.exceptions();
        assert_eq!(exceptions.len(), 1);
        let report = &exceptions[0];
        assert_eq!(report.level, ReportLevel::Error);
        assert_eq!(report.message.as_deref(), Some("test"));
        assert_eq!(report.error.as_deref(), Some("test err"));
        assert_eq!(
            report.tags,
            BTreeMap::from([
                ("environment".to_string(), "test-env".to_string()),
                ("log_type".to_string(), "uncaughtException".to_string()),
                ("region".to_string(), "test-region".to_string()),
            ])
        );
    }

    #[test]
    fn error_without_error_field_is_a_message() {
        let (layer, reporter) = layer();
        capture(layer, || {
            tracing::error!(log_type = "not really an error", user_id = 42, "test");
        });

        assert!(reporter.exceptions().is_empty());
        let report = &reporter.messages()[0];
        assert_eq!(report.tags["log_type"], "not really an error");
        assert_eq!(report.extra["user_id"], "42");
    }

    #[test]
    fn warnings_are_reported_as_warnings() {
        let (layer, reporter) = layer();
        capture(layer, || {
            tracing::warn!(err = "slow", "degraded");
        });

        let exceptions = reporter.exceptions();
        assert_eq!(exceptions[0].level, ReportLevel::Warning);
        assert_eq!(exceptions[0].error.as_deref(), Some("slow"));
    }

    #[test]
    fn logger_fields_become_extra_and_tags() {
        let (layer, reporter) = layer();
        let logger = TracingLogger::new("test")
            .child([("child", "child"), ("feature", "billing")])
            .child([("child", "grandchild"), ("note", "two words")]);
        capture(layer, || logger.error("test"));

        let report = &reporter.messages()[0];
        assert_eq!(report.extra.get("child").map(String::as_str), Some("grandchild"));
        assert_eq!(report.extra["note"], "two words");
        assert_eq!(report.extra["logger"], "test");
        assert!(!report.extra.contains_key("context"));
        assert_eq!(report.tags["feature"], "billing");
        assert_eq!(report.tags["environment"], "test-env");
    }

    #[test]
    fn plain_context_fields_are_kept() {
        let (layer, reporter) = layer();
        capture(layer, || {
            tracing::error!(context = "startup", "test");
        });

        assert_eq!(reporter.messages()[0].extra["context"], "startup");
    }

    #[test]
    fn less_severe_events_are_ignored() {
        let (layer, reporter) = layer();
        capture(layer, || {
            tracing::info!(error = "ignored", "info");
            tracing::debug!("debug");
        });

        assert!(reporter.captured().is_empty());
    }

    #[test]
    fn min_level_can_be_lowered() {
        let (layer, reporter) = layer();
        capture(layer.with_min_level(Level::INFO), || {
            tracing::info!(error = "minor", "info");
        });

        let messages = reporter.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].level, ReportLevel::Info);
    }
}
