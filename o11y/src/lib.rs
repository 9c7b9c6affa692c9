//! Stable observability interfaces for application code.
//!
//! This crate is the facade half of the `o11y` project: it defines the
//! capabilities application code programs against, and keeps the concrete
//! backends (tracing agents, StatsD-style metric sinks, error reporting
//! services) behind small traits so they can be swapped without touching
//! call sites. The reference implementations live in the
//! [o11y_sdk](https://docs.rs/o11y_sdk) crate.
//!
//! ## What does this crate contain?
//!
//! - **[Tracing](trace):** the three-operation [`Tracer`] capability
//!   (`start_span`, `inject`, `extract`), the [`Span`] handle with its
//!   trace-scoped baggage, and a no-op stub tracer.
//! - **[Propagation](propagation):** carrier traits used to move a span's
//!   identity and baggage across a process boundary.
//! - **[Baggage](baggage):** the key/value map shared by every span of a
//!   trace.
//! - **[Tags](tags):** a pure conversion from arbitrary values into flat
//!   string tags for annotation backends.
//! - **[Metrics](metrics) and [Logs](logs):** the seams metric and log
//!   backends plug into.
//! - **[Global](global):** the process-wide tracer and error handler.
//!
//! # Getting Started
//!
//! ```
//! use o11y::{global, trace::Tracer};
//!
//! fn do_something() -> o11y::trace::TraceResult<()> {
//!     let tracer = global::tracer();
//!     let span = tracer.start("my_span")?;
//!     span.set_tag("component", "getting-started");
//!     // do work tracked by the span
//!     span.finish();
//!     Ok(())
//! }
//! # do_something().unwrap();
//! ```
//!
//! ## Tags
//!
//! ```
//! use o11y::{tags::map_to_tags, Value};
//!
//! let tags = map_to_tags([("number", Value::from(22)), ("null", Value::Null)]);
//! assert_eq!(tags["number"], "22");
//! assert_eq!(tags["null"], "null");
//! ```
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![cfg_attr(
    docsrs,
    feature(doc_cfg, doc_auto_cfg),
    deny(rustdoc::broken_intra_doc_links)
)]

pub mod global;

pub mod baggage;

mod common;

#[cfg(any(feature = "testing", test))]
#[doc(hidden)]
pub mod testing;

pub use common::{BoxError, Value};

pub mod logs;

pub mod metrics;

pub mod propagation;

pub mod tags;

pub mod trace;

pub use global::Error;

#[doc(hidden)]
pub mod _private {
    #[cfg(feature = "internal-logs")]
    pub use tracing::{debug, error, info, warn}; // Re-export for the internal logging macros
}
