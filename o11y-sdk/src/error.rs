//! Errors returned while assembling the instrumentation.

/// Wrapper for the errors the SDK returns to its caller. Failures on the
/// emission paths are never returned; they go to
/// [`o11y::global::handle_error`].
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// `LOG_LEVEL` is not a valid filter directive.
    #[error("invalid log level {directive:?}: {message}")]
    InvalidLogLevel {
        /// The rejected directive.
        directive: String,
        /// Why it was rejected.
        message: String,
    },
}
