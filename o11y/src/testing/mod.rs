//! Test doubles for code written against the tracer capability.
pub mod trace;
