//! The logging seam.
//!
//! Components that need to report a problem without failing (for example a
//! switchable tracer whose enable check errors) receive a [`Logger`]. The
//! SDK provides an implementation backed by the `tracing` crate; this module
//! only defines the contract and a logger that discards everything.
use std::fmt;

/// Severity of a log message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Fine grained diagnostics.
    Debug,
    /// Normal operation.
    Info,
    /// Something unexpected that was recovered from.
    Warn,
    /// A failure.
    Error,
}

impl Severity {
    /// The lower case name of the severity.
    pub const fn name(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A sink for log messages.
///
/// Implementations must not panic: loggers are called on error paths that
/// are expected to recover.
pub trait Logger: fmt::Debug + Send + Sync {
    /// Records `message` at `severity`.
    fn log(&self, severity: Severity, message: &str);

    /// Records an error message.
    fn error(&self, message: &str) {
        self.log(Severity::Error, message)
    }

    /// Records a warning.
    fn warn(&self, message: &str) {
        self.log(Severity::Warn, message)
    }

    /// Records an informational message.
    fn info(&self, message: &str) {
        self.log(Severity::Info, message)
    }

    /// Records a debug message.
    fn debug(&self, message: &str) {
        self.log(Severity::Debug, message)
    }
}

/// A logger that discards every message.
#[derive(Clone, Debug, Default)]
pub struct NoopLogger {
    _private: (),
}

impl NoopLogger {
    /// Create a new no-op logger
    pub fn new() -> Self {
        NoopLogger { _private: () }
    }
}

impl Logger for NoopLogger {
    fn log(&self, _severity: Severity, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Collect(Mutex<Vec<(Severity, String)>>);

    impl Logger for Collect {
        fn log(&self, severity: Severity, message: &str) {
            self.0.lock().unwrap().push((severity, message.to_string()));
        }
    }

    #[test]
    fn helpers_forward_with_their_severity() {
        let logger = Collect::default();
        logger.error("e");
        logger.warn("w");
        logger.info("i");
        logger.debug("d");

        let severities: Vec<Severity> = logger.0.lock().unwrap().iter().map(|(s, _)| *s).collect();
        assert_eq!(
            severities,
            vec![Severity::Error, Severity::Warn, Severity::Info, Severity::Debug]
        );
    }

    #[test]
    fn severities_are_ordered() {
        assert!(Severity::Error > Severity::Warn);
        assert!(Severity::Debug < Severity::Info);
        assert_eq!(Severity::Warn.to_string(), "warn");
    }
}
