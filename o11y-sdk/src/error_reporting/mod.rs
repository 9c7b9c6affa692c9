//! # Error reporting
//!
//! Forwards warnings and errors to an error tracking service through an
//! [`ErrorReporter`]. Records carrying an error are sent as exceptions,
//! everything else as messages.
//!
//! Every report is enriched with static fields (see
//! [`Config::static_fields`](crate::Config::static_fields)). A fixed set of
//! fields, [`TAGS_WHITELIST`], is copied into the report's tags so the
//! tracking service can index them; all fields are sent as extra data.
//!
//! The usual entry point is [`ErrorReportingLayer`], which feeds `tracing`
//! events into an [`ErrorReporting`] pipeline.
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

mod layer;

pub use layer::ErrorReportingLayer;

/// Fields copied into a report's tags.
pub const TAGS_WHITELIST: [&str; 5] = ["log_type", "region", "environment", "channel", "feature"];

/// The severity label understood by the tracking service.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReportLevel {
    /// An error.
    Error,
    /// A warning.
    Warning,
    /// Anything less severe.
    Info,
}

impl ReportLevel {
    /// Maps a `tracing` level: `ERROR` is an error, `WARN` a warning and
    /// everything else info.
    pub fn from_level(level: &tracing::Level) -> Self {
        if *level == tracing::Level::ERROR {
            ReportLevel::Error
        } else if *level == tracing::Level::WARN {
            ReportLevel::Warning
        } else {
            ReportLevel::Info
        }
    }

    /// The label sent to the tracking service.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ReportLevel::Error => "error",
            ReportLevel::Warning => "warning",
            ReportLevel::Info => "info",
        }
    }
}

impl fmt::Display for ReportLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A log record as seen by the reporting pipeline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogRecord {
    /// The formatted message, if any.
    pub message: Option<String>,
    /// The rendered error, if the record carries one.
    pub error: Option<String>,
    /// All other fields.
    pub fields: BTreeMap<String, String>,
}

/// What is sent to the tracking service.
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    /// The log message.
    pub message: Option<String>,
    /// The rendered error.
    pub error: Option<String>,
    /// The report level.
    pub level: ReportLevel,
    /// Indexed tags.
    pub tags: BTreeMap<String, String>,
    /// Additional data.
    pub extra: BTreeMap<String, String>,
}

/// A client for an error tracking service.
pub trait ErrorReporter: fmt::Debug + Send + Sync {
    /// Reports a record carrying an error.
    fn capture_exception(&self, report: Report);

    /// Reports a record without an error.
    fn capture_message(&self, report: Report);
}

/// An [`ErrorReporter`] that drops every report.
#[derive(Clone, Debug, Default)]
pub struct NoopErrorReporter {
    _private: (),
}

impl NoopErrorReporter {
    /// Create a new no-op error reporter
    pub fn new() -> Self {
        NoopErrorReporter { _private: () }
    }
}

impl ErrorReporter for NoopErrorReporter {
    fn capture_exception(&self, _report: Report) {}

    fn capture_message(&self, _report: Report) {}
}

/// How a report was delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureKind {
    /// Through [`ErrorReporter::capture_exception`].
    Exception,
    /// Through [`ErrorReporter::capture_message`].
    Message,
}

/// An [`ErrorReporter`] that keeps reports in memory. Clones share storage.
#[derive(Clone, Debug, Default)]
pub struct InMemoryErrorReporter {
    captured: Arc<Mutex<Vec<(CaptureKind, Report)>>>,
}

impl InMemoryErrorReporter {
    /// Every report so far, in order.
    pub fn captured(&self) -> Vec<(CaptureKind, Report)> {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Reports delivered as exceptions.
    pub fn exceptions(&self) -> Vec<Report> {
        self.of_kind(CaptureKind::Exception)
    }

    /// Reports delivered as messages.
    pub fn messages(&self) -> Vec<Report> {
        self.of_kind(CaptureKind::Message)
    }

    /// Forgets all reports.
    pub fn reset(&self) {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn of_kind(&self, kind: CaptureKind) -> Vec<Report> {
        self.captured()
            .into_iter()
            .filter(|(captured, _)| *captured == kind)
            .map(|(_, report)| report)
            .collect()
    }

    fn push(&self, kind: CaptureKind, report: Report) {
        self.captured
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((kind, report));
    }
}

impl ErrorReporter for InMemoryErrorReporter {
    fn capture_exception(&self, report: Report) {
        self.push(CaptureKind::Exception, report)
    }

    fn capture_message(&self, report: Report) {
        self.push(CaptureKind::Message, report)
    }
}

/// Turns log records into reports.
#[derive(Clone, Debug)]
pub struct ErrorReporting {
    reporter: Arc<dyn ErrorReporter>,
    static_fields: BTreeMap<String, String>,
}

impl ErrorReporting {
    /// A pipeline delivering to `reporter`.
    pub fn new(reporter: Arc<dyn ErrorReporter>) -> Self {
        ErrorReporting {
            reporter,
            static_fields: BTreeMap::new(),
        }
    }

    /// Fields added to every record. Fields of the record itself win.
    pub fn with_static_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.static_fields = fields;
        self
    }

    /// The reporter receiving the reports.
    pub fn reporter(&self) -> &Arc<dyn ErrorReporter> {
        &self.reporter
    }

    /// Reports `record` at `level`.
    pub fn write(&self, level: ReportLevel, record: LogRecord) {
        let mut extra = self.static_fields.clone();
        extra.extend(record.fields);

        let tags = TAGS_WHITELIST
            .iter()
            .filter_map(|tag| {
                extra
                    .get(*tag)
                    .filter(|value| !value.is_empty())
                    .map(|value| (tag.to_string(), value.clone()))
            })
            .collect();

        let report = Report {
            message: record.message,
            error: record.error,
            level,
            tags,
            extra,
        };

        if report.error.is_some() && level != ReportLevel::Info {
            self.reporter.capture_exception(report);
        } else {
            self.reporter.capture_message(report);
        }
    }
}
