//! # o11y SDK
//!
//! Reference implementations of the [o11y](https://docs.rs/o11y) facade:
//!
//! - **[Tracers](trace):** an in-memory mock tracer, a switchable tracer that
//!   toggles between a real and a stub tracer on every call, a multi tracer
//!   that lets observers such as the SLI tracer watch the span lifecycle,
//!   and the factory that assembles them from configuration.
//! - **[Metrics](metrics):** a client with default tags, timers and
//!   bucketed counters on top of any [`MetricsBackend`].
//! - **[Error reporting](error_reporting):** a `tracing_subscriber` layer
//!   forwarding warnings and errors to an error tracking service.
//! - **[Logging](logs):** a `tracing` backed [`Logger`] and the subscriber
//!   setup.
//! - **[`Instrumentation`]:** the composition root tying everything to a
//!   [`Config`] read from the environment.
//!
//! ## Getting started
//!
//! ```no_run
//! use o11y::trace::Tracer;
//! use o11y_sdk::{Config, Instrumentation};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let instrumentation = Instrumentation::builder(Config::default())
//!     .with_tracer_enabled(|| Ok(std::env::var("TRACING_ON").is_ok()))
//!     .build();
//! instrumentation.init_subscriber()?;
//! instrumentation.install_global();
//!
//! let span = o11y::global::tracer().start("startup")?;
//! span.finish();
//! # Ok(())
//! # }
//! ```
//!
//! [`MetricsBackend`]: o11y::metrics::MetricsBackend
//! [`Logger`]: o11y::logs::Logger
#![warn(
    future_incompatible,
    missing_debug_implementations,
    missing_docs,
    nonstandard_style,
    rust_2018_idioms,
    unreachable_pub,
    unused
)]
#![allow(clippy::needless_doctest_main)]
#![cfg_attr(docsrs, feature(doc_cfg), deny(rustdoc::broken_intra_doc_links))]

mod config;
mod error;
pub mod error_reporting;
mod instrumentation;
pub mod logs;
pub mod metrics;
pub mod trace;

pub use config::{Config, ConfigBuilder, TraceBackend};
pub use error::Error;
pub use instrumentation::{Instrumentation, InstrumentationBuilder};
