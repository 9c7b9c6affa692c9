//! The `trace` module includes types for tracking the progression of a single
//! request while it is handled by services that make up an application. A trace
//! is a tree of [`Span`]s which are objects that represent the work being done
//! by individual services or components involved in a request as it flows
//! through a system.
//!
//! ## Overview
//!
//! Every tracer in this project, concrete or decorating, implements the same
//! three-operation [`Tracer`] capability:
//!
//! * [`Tracer::start_span`] creates a [`Span`], optionally as the child of
//!   another span (see [`SpanOptions`]).
//! * [`Tracer::inject`] writes a span's identity and baggage into a carrier.
//! * [`Tracer::extract`] rebuilds a span from a carrier.
//!
//! Because the capability is object safe, tracers compose: a switchable
//! tracer routes calls between a real backend and a stub, and a multi tracer
//! fans them out to observers. Both hold their delegates as
//! [`SharedTracer`]s and are themselves usable wherever a tracer is
//! expected.
//!
//! ```
//! use o11y::trace::{NoopTracer, SpanOptions, Tracer};
//!
//! # fn main() -> o11y::trace::TraceResult<()> {
//! let tracer = NoopTracer::new();
//! let parent = tracer.start("parent")?;
//! let child = tracer.start_span("child", SpanOptions::child_of(&parent))?;
//!
//! parent.set_baggage_item("user", "42");
//! assert_eq!(child.baggage_item("user"), Some("42".to_string()));
//! # Ok(())
//! # }
//! ```
use thiserror::Error;

mod noop;
mod span;
mod tracer;

pub use self::{
    noop::NoopTracer,
    span::{Origin, Reference, ReferenceType, Span, SpanBuilder},
    tracer::{SharedTracer, SpanOptions, Tracer},
};

/// Describe the result of operations in tracing API.
pub type TraceResult<T> = Result<T, TraceError>;

/// Errors returned by the trace API.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    /// A tracer backend failed to perform the requested operation.
    #[error("tracer {tracer} failed: {message}")]
    Backend {
        /// Name of the failing tracer.
        tracer: String,
        /// Description of the failure.
        message: String,
    },

    /// Other errors propagated from tracer implementations that weren't covered above
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl TraceError {
    /// Creates a [`TraceError::Backend`] for the tracer named `tracer`.
    pub fn backend(tracer: impl Into<String>, message: impl Into<String>) -> Self {
        TraceError::Backend {
            tracer: tracer.into(),
            message: message.into(),
        }
    }
}

impl From<String> for TraceError {
    fn from(err_msg: String) -> Self {
        TraceError::Other(Box::new(Custom(err_msg)))
    }
}

impl From<&'static str> for TraceError {
    fn from(err_msg: &'static str) -> Self {
        TraceError::Other(Box::new(Custom(err_msg.into())))
    }
}

/// Wrap type for string
#[derive(Error, Debug)]
#[error("{0}")]
struct Custom(String);
