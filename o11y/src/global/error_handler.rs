use crate::metrics::MetricError;
use crate::trace::TraceError;
use std::sync::{OnceLock, RwLock};

/// The global error handler.
static GLOBAL_ERROR_HANDLER: OnceLock<RwLock<Option<ErrorHandler>>> = OnceLock::new();

#[inline]
fn global_error_handler() -> &'static RwLock<Option<ErrorHandler>> {
    GLOBAL_ERROR_HANDLER.get_or_init(|| RwLock::new(None))
}

/// Wrapper for error from tracing, metrics and logging.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to trace a request.
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// Failed to emit a metric.
    #[error(transparent)]
    Metric(#[from] MetricError),

    /// Other types of failures not covered by the variants above.
    #[error("{0}")]
    Other(String),
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Error::Other(err.to_string())
    }
}

struct ErrorHandler(Box<dyn Fn(Error) + Send + Sync>);

/// Handle error using the globally configured error handler.
///
/// Logs through the internal logging macros if unset.
pub fn handle_error<T: Into<Error>>(err: T) {
    if let Ok(handler) = global_error_handler().read() {
        if let Some(handler) = handler.as_ref() {
            (handler.0)(err.into());
            return;
        }
    }

    match err.into() {
        Error::Trace(err) => {
            crate::o11y_error!(name: "trace_error", error = format!("{err}"));
        }
        Error::Metric(err) => {
            crate::o11y_error!(name: "metric_error", error = format!("{err}"));
        }
        Error::Other(err_msg) => {
            crate::o11y_error!(name: "other_error", error = err_msg.as_str());
        }
    }
}

/// Set global error handler.
pub fn set_error_handler<F>(f: F) -> std::result::Result<(), Error>
where
    F: Fn(Error) + Send + Sync + 'static,
{
    global_error_handler()
        .write()
        .map(|mut handler| *handler = Some(ErrorHandler(Box::new(f))))
        .map_err(Into::into)
}
