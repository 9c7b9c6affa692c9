//! Utilities for working with global telemetry primitives
//!
//! ## Global Tracer
//!
//! The global tracer **provides applications access to their configured
//! [`Tracer`] from anywhere in the codebase** without passing it through
//! every call. Until an application installs one with [`set_tracer`], a
//! [`NoopTracer`] is returned.
//!
//! ```
//! use o11y::global;
//! use o11y::trace::{NoopTracer, Tracer};
//! use std::sync::Arc;
//!
//! fn init_tracer() {
//!     // Swap this no-op tracer for the tracer built by the SDK
//!     let _ = global::set_tracer(Arc::new(NoopTracer::new()));
//! }
//!
//! fn do_something_tracked() {
//!     let tracer = global::tracer();
//!     if let Ok(span) = tracer.start("doing_work") {
//!         span.finish();
//!     }
//! }
//!
//! init_tracer();
//! do_something_tracked();
//! ```
//!
//! ## Global Error Handler
//!
//! Failures that tracing, metrics and logging recover from on their own are
//! still reported through [`handle_error`]. The default handler logs them
//! through the crate's internal logging; applications can route them
//! elsewhere with [`set_error_handler`].
//!
//! [`Tracer`]: crate::trace::Tracer
//! [`NoopTracer`]: crate::trace::NoopTracer

mod error_handler;
mod internal_logging;
mod trace;

pub use error_handler::{handle_error, set_error_handler, Error};
pub use trace::{set_tracer, tracer};
