//! Fan-out of span lifecycle events to several tracers.
use o11y::global;
use o11y::propagation::{Extractor, Format, Injector};
use o11y::trace::{SharedTracer, Span, SpanOptions, TraceResult, Tracer};

/// A tracer that forwards `start_span` to a primary tracer and to every
/// additional tracer.
///
/// The primary is authoritative: its span is the one returned and its
/// error, if any, is the one the caller sees. Additional tracers only
/// observe the span lifecycle. Their failures are reported to
/// [`global::handle_error`] and never reach the caller, and they take no
/// part in propagation.
#[derive(Clone, Debug)]
pub struct MultiTracer {
    primary: SharedTracer,
    additional: Vec<SharedTracer>,
}

impl MultiTracer {
    /// Creates a multi tracer with no additional tracers.
    pub fn new(primary: SharedTracer) -> Self {
        MultiTracer {
            primary,
            additional: Vec::new(),
        }
    }

    /// Adds an observing tracer.
    pub fn with_additional_tracer(mut self, tracer: SharedTracer) -> Self {
        self.additional.push(tracer);
        self
    }

    /// The authoritative tracer.
    pub fn primary(&self) -> &SharedTracer {
        &self.primary
    }

    /// The observing tracers, in call order.
    pub fn additional_tracers(&self) -> &[SharedTracer] {
        &self.additional
    }
}

impl Tracer for MultiTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> TraceResult<Span> {
        let span = self.primary.start_span(name, options.clone())?;

        for tracer in &self.additional {
            if let Err(err) = tracer.start_span(name, options.clone()) {
                global::handle_error(err);
            }
        }

        Ok(span)
    }

    fn inject(&self, span: &Span, format: Format, carrier: &mut dyn Injector) -> TraceResult<()> {
        self.primary.inject(span, format, carrier)
    }

    fn extract(&self, format: Format, carrier: &dyn Extractor) -> TraceResult<Option<Span>> {
        self.primary.extract(format, carrier)
    }
}
