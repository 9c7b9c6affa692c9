//! # Tracers
//!
//! Concrete and decorating implementations of [`o11y::trace::Tracer`]:
//!
//! * [`MockTracer`] keeps spans in memory and propagates them with plain
//!   `ot-mock-*` carrier keys.
//! * [`SwitchableTracer`] routes each call to a real or a stub tracer,
//!   deciding per call.
//! * [`MultiTracer`] fans span starts out to observing tracers such as the
//!   [`SliTracer`].
//! * [`TracerFactory`] assembles these from a [`Config`](crate::Config).
mod factory;
mod mock;
mod multi;
mod sli;
mod switchable;

pub use factory::{AgentConstructor, FactoryTracer, TracerFactory};
pub use mock::{MockTracer, BAGGAGE_PREFIX, OPERATION_KEY, SPAN_ID_KEY};
pub use multi::MultiTracer;
pub use sli::{SliConfig, SliOperation, SliTracer, SPAN_STARTED_METRIC};
pub use switchable::{EnabledPredicate, SwitchableTracer, SwitchableTracerBuilder};
