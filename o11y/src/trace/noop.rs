//! No-op trace impls
//!
//! This implementation is returned as the global tracer if no tracer has
//! been installed, and is the stub a switchable tracer falls back to while
//! tracing is disabled. It is intended to have minimal resource utilization
//! and runtime impact.
use crate::propagation::{Extractor, Format, Injector};
use crate::trace::{Origin, Span, SpanOptions, TraceResult, Tracer};

/// A no-op instance of a [`Tracer`].
///
/// Spans it creates are tagged [`Origin::Stub`]. They still honor the
/// child-of relation for baggage, so code reading baggage behaves the same
/// whether tracing is enabled or not, but they are never exported and never
/// propagated.
#[derive(Clone, Debug, Default)]
pub struct NoopTracer {
    _private: (),
}

impl NoopTracer {
    /// Create a new no-op tracer
    pub fn new() -> Self {
        NoopTracer { _private: () }
    }
}

impl Tracer for NoopTracer {
    /// Starts a new stub span.
    fn start_span(&self, name: &str, options: SpanOptions) -> TraceResult<Span> {
        Ok(options
            .apply(Span::builder(name))
            .with_origin(Origin::Stub)
            .build())
    }

    /// Ignores all injections.
    fn inject(&self, _span: &Span, _format: Format, _carrier: &mut dyn Injector) -> TraceResult<()> {
        Ok(())
    }

    /// Never extracts a span.
    fn extract(&self, _format: Format, _carrier: &dyn Extractor) -> TraceResult<Option<Span>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn noop_spans_are_stub_spans() {
        let span = NoopTracer::new().start("foo").unwrap();
        assert_eq!(span.origin(), Origin::Stub);
        assert_eq!(span.operation_name(), "foo");
    }

    #[test]
    fn noop_tracer_keeps_baggage_on_children() {
        let tracer = NoopTracer::new();
        let parent = tracer.start("parent").unwrap();
        let child = tracer
            .start_span("child", SpanOptions::child_of(&parent))
            .unwrap();

        child.set_baggage_item("a", "b");
        assert_eq!(parent.baggage_item("a"), Some("b".to_string()));
    }

    #[test]
    fn noop_tracer_does_not_propagate() {
        let tracer = NoopTracer::new();
        let span = tracer.start("foo").unwrap();
        span.set_baggage_item("a", "b");

        let mut carrier: HashMap<String, String> = HashMap::new();
        tracer.inject(&span, Format::TextMap, &mut carrier).unwrap();
        assert!(carrier.is_empty());

        carrier.insert("ot-mock-tracer".to_string(), "id".to_string());
        assert!(tracer.extract(Format::TextMap, &carrier).unwrap().is_none());
    }
}
