//! An in-process tracer for tests and for running without a tracing agent.
//!
//! [`MockTracer`] keeps every span it creates and implements text-map
//! propagation with a small, human readable set of carrier keys:
//!
//! | key | meaning |
//! |---|---|
//! | `ot-mock-tracer` | span identifier |
//! | `ot-mock-operation` | operation name |
//! | `ot-mock-baggage-<key>` | one entry per baggage item, `<key>` verbatim |
use o11y::propagation::{Extractor, Format, Injector};
use o11y::trace::{Span, SpanOptions, TraceResult, Tracer};
use std::sync::{Arc, Mutex, PoisonError};

/// Carrier key holding the span identifier.
pub const SPAN_ID_KEY: &str = "ot-mock-tracer";
/// Carrier key holding the operation name.
pub const OPERATION_KEY: &str = "ot-mock-operation";
/// Prefix of the carrier keys holding baggage items.
pub const BAGGAGE_PREFIX: &str = "ot-mock-baggage-";

/// An in-memory [`Tracer`].
///
/// Children started with a child-of parent share the parent's baggage, so
/// baggage behaves as trace scoped, the way a real tracer propagates it.
/// Clones share the list of recorded spans.
///
/// ```
/// use o11y::propagation::Format;
/// use o11y::trace::Tracer;
/// use o11y_sdk::trace::MockTracer;
/// use std::collections::HashMap;
///
/// # fn main() -> o11y::trace::TraceResult<()> {
/// let tracer = MockTracer::new();
/// let span = tracer.start("myOperation")?;
/// span.set_baggage_item("a", "b");
///
/// let mut carrier: HashMap<String, String> = HashMap::new();
/// tracer.inject(&span, Format::TextMap, &mut carrier)?;
/// assert_eq!(carrier["ot-mock-operation"], "myOperation");
/// assert_eq!(carrier["ot-mock-baggage-a"], "b");
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockTracer {
    spans: Arc<Mutex<Vec<Span>>>,
}

impl MockTracer {
    /// Creates a tracer with no recorded spans.
    pub fn new() -> Self {
        MockTracer::default()
    }

    /// Every span created so far, including extracted ones, in creation order.
    pub fn spans(&self) -> Vec<Span> {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The spans that have been finished.
    pub fn finished_spans(&self) -> Vec<Span> {
        self.spans()
            .into_iter()
            .filter(|span| span.finish_time().is_some())
            .collect()
    }

    /// Forgets all recorded spans.
    pub fn clear(&self) {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn record(&self, span: Span) -> Span {
        self.spans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(span.clone());
        span
    }
}

impl Tracer for MockTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> TraceResult<Span> {
        Ok(self.record(options.apply(Span::builder(name)).build()))
    }

    fn inject(&self, span: &Span, format: Format, carrier: &mut dyn Injector) -> TraceResult<()> {
        if !format.is_text_map() {
            return Ok(());
        }

        carrier.set(SPAN_ID_KEY, span.span_id().to_string());
        carrier.set(OPERATION_KEY, span.operation_name());
        for (key, value) in &span.baggage_items() {
            carrier.set(&format!("{BAGGAGE_PREFIX}{key}"), value.to_string());
        }
        Ok(())
    }

    fn extract(&self, format: Format, carrier: &dyn Extractor) -> TraceResult<Option<Span>> {
        if !format.is_text_map() {
            return Ok(None);
        }

        let span_id = carrier.get(SPAN_ID_KEY).unwrap_or_default();
        let operation_name = carrier.get(OPERATION_KEY).unwrap_or_default();
        let span = Span::builder(operation_name.into_owned())
            .with_span_id(span_id.into_owned())
            .build();

        for key in carrier.keys() {
            if let Some(baggage_key) = key.strip_prefix(BAGGAGE_PREFIX) {
                if let Some(value) = carrier.get(&key) {
                    span.set_baggage_item(baggage_key, value.into_owned());
                }
            }
        }

        Ok(Some(self.record(span)))
    }
}
