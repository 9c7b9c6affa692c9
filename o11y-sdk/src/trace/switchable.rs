//! A tracer that can be switched on and off while the process runs.
use o11y::logs::{Logger, NoopLogger};
use o11y::propagation::{Extractor, Format, Injector};
use o11y::trace::{NoopTracer, Origin, SharedTracer, Span, SpanOptions, TraceResult, Tracer};
use o11y::BoxError;
use std::fmt;
use std::sync::Arc;

/// Decides, on every call, whether the real tracer should be used.
///
/// An `Err` is treated as "disabled".
pub type EnabledPredicate = Arc<dyn Fn() -> Result<bool, BoxError> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Route {
    Real,
    Stub,
}

/// Routes every call to either a real tracer or a stub tracer.
///
/// The enable predicate is evaluated on each `start_span`, `inject` and
/// `extract` and its result is never cached, so tracing can be toggled live,
/// for example from a feature flag.
///
/// Spans obtained through the stub are tagged [`Origin::Stub`] and spans
/// obtained through the real tracer [`Origin::Real`]. That tag is used to
/// keep the two span graphs apart:
///
/// * a parent or reference from the other side is dropped before the
///   options reach the delegate,
/// * a stub span is always injected by the stub, whatever the current
///   decision is.
///
/// ```
/// use o11y::trace::{NoopTracer, Origin, Tracer};
/// use o11y_sdk::trace::{MockTracer, SwitchableTracer};
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::sync::Arc;
///
/// # fn main() -> o11y::trace::TraceResult<()> {
/// let enabled = Arc::new(AtomicBool::new(false));
/// let flag = enabled.clone();
/// let tracer = SwitchableTracer::builder(Arc::new(MockTracer::new()))
///     .with_enabled(move || Ok(flag.load(Ordering::SeqCst)))
///     .build();
///
/// assert_eq!(tracer.start("off")?.origin(), Origin::Stub);
/// enabled.store(true, Ordering::SeqCst);
/// assert_eq!(tracer.start("on")?.origin(), Origin::Real);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SwitchableTracer {
    real: SharedTracer,
    stub: SharedTracer,
    is_enabled: EnabledPredicate,
    logger: Arc<dyn Logger>,
}

impl fmt::Debug for SwitchableTracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchableTracer")
            .field("real", &self.real)
            .field("stub", &self.stub)
            .field("logger", &self.logger)
            .finish()
    }
}

impl SwitchableTracer {
    /// Starts building a switchable tracer around `real`.
    pub fn builder(real: SharedTracer) -> SwitchableTracerBuilder {
        SwitchableTracerBuilder {
            real,
            stub: None,
            is_enabled: None,
            logger: None,
        }
    }

    /// The tracer used while enabled.
    pub fn real(&self) -> &SharedTracer {
        &self.real
    }

    /// The tracer used while disabled.
    pub fn stub(&self) -> &SharedTracer {
        &self.stub
    }

    fn route(&self) -> Route {
        match (self.is_enabled)() {
            Ok(true) => Route::Real,
            Ok(false) => Route::Stub,
            Err(err) => {
                self.logger.error(&format!(
                    "failed to check whether tracing is enabled, using the stub tracer: {err}"
                ));
                Route::Stub
            }
        }
    }

    fn tracer_for(&self, route: Route) -> &SharedTracer {
        match route {
            Route::Real => &self.real,
            Route::Stub => &self.stub,
        }
    }
}

fn origin_of(route: Route) -> Origin {
    match route {
        Route::Real => Origin::Real,
        Route::Stub => Origin::Stub,
    }
}

impl Tracer for SwitchableTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> TraceResult<Span> {
        let route = self.route();
        let options = match route {
            Route::Real => options.without_parents_from(Origin::Stub),
            Route::Stub => options.only_parents_from(Origin::Stub),
        };
        o11y::o11y_debug!(name: "switchable_tracer.start_span", route = format!("{route:?}"));

        let span = self.tracer_for(route).start_span(name, options)?;
        Ok(span.with_origin(origin_of(route)))
    }

    fn inject(&self, span: &Span, format: Format, carrier: &mut dyn Injector) -> TraceResult<()> {
        if span.origin() == Origin::Stub {
            return self.stub.inject(span, format, carrier);
        }
        self.tracer_for(self.route()).inject(span, format, carrier)
    }

    fn extract(&self, format: Format, carrier: &dyn Extractor) -> TraceResult<Option<Span>> {
        let route = self.route();
        let span = self.tracer_for(route).extract(format, carrier)?;
        Ok(span.map(|span| span.with_origin(origin_of(route))))
    }
}

/// Builder for [`SwitchableTracer`].
pub struct SwitchableTracerBuilder {
    real: SharedTracer,
    stub: Option<SharedTracer>,
    is_enabled: Option<EnabledPredicate>,
    logger: Option<Arc<dyn Logger>>,
}

impl fmt::Debug for SwitchableTracerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwitchableTracerBuilder")
            .field("real", &self.real)
            .field("stub", &self.stub)
            .field("logger", &self.logger)
            .finish()
    }
}

impl SwitchableTracerBuilder {
    /// The tracer used while disabled. Defaults to a [`NoopTracer`].
    pub fn with_stub(mut self, stub: SharedTracer) -> Self {
        self.stub = Some(stub);
        self
    }

    /// The enable predicate. Defaults to always enabled.
    pub fn with_enabled<F>(mut self, is_enabled: F) -> Self
    where
        F: Fn() -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.is_enabled = Some(Arc::new(is_enabled));
        self
    }

    /// Same as [`with_enabled`](Self::with_enabled) for an already shared
    /// predicate.
    pub fn with_shared_enabled(mut self, is_enabled: EnabledPredicate) -> Self {
        self.is_enabled = Some(is_enabled);
        self
    }

    /// The logger that receives predicate failures. Defaults to a
    /// [`NoopLogger`].
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Create a new switchable tracer.
    pub fn build(self) -> SwitchableTracer {
        SwitchableTracer {
            real: self.real,
            stub: self.stub.unwrap_or_else(|| Arc::new(NoopTracer::new())),
            is_enabled: self
                .is_enabled
                .unwrap_or_else(|| Arc::new(|| -> Result<bool, BoxError> { Ok(true) })),
            logger: self.logger.unwrap_or_else(|| Arc::new(NoopLogger::new())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use o11y::logs::Severity;
    use o11y::testing::trace::RecordingTracer;
    use o11y::trace::Reference;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct CollectingLogger(Mutex<Vec<(Severity, String)>>);

    impl CollectingLogger {
        fn errors(&self) -> usize {
            self.0
                .lock()
                .unwrap()
                .iter()
                .filter(|(severity, _)| *severity == Severity::Error)
                .count()
        }
    }

    impl Logger for CollectingLogger {
        fn log(&self, severity: Severity, message: &str) {
            self.0.lock().unwrap().push((severity, message.to_string()));
        }
    }

    struct Fixture {
        real: RecordingTracer,
        stub: RecordingTracer,
        logger: Arc<CollectingLogger>,
        enabled: Arc<AtomicBool>,
        tracer: SwitchableTracer,
    }

    fn fixture(enabled: bool) -> Fixture {
        let real = RecordingTracer::new("real");
        let stub = RecordingTracer::new("stub");
        let logger = Arc::new(CollectingLogger::default());
        let flag = Arc::new(AtomicBool::new(enabled));
        let is_enabled = flag.clone();
        let tracer = SwitchableTracer::builder(Arc::new(real.clone()))
            .with_stub(Arc::new(stub.clone()))
            .with_enabled(move || Ok(is_enabled.load(Ordering::SeqCst)))
            .with_logger(logger.clone())
            .build();

        Fixture {
            real,
            stub,
            logger,
            enabled: flag,
            tracer,
        }
    }

    fn exercise(tracer: &SwitchableTracer) {
        let span = Span::builder("outside").build();
        let mut carrier: HashMap<String, String> = HashMap::new();

        tracer.start("op").unwrap();
        tracer.inject(&span, Format::TextMap, &mut carrier).unwrap();
        tracer.extract(Format::TextMap, &carrier).unwrap();
    }

    #[test]
    fn disabled_routes_everything_to_the_stub() {
        let f = fixture(false);
        exercise(&f.tracer);

        assert_eq!(f.stub.start_span_calls().len(), 1);
        assert_eq!(f.stub.inject_calls().len(), 1);
        assert_eq!(f.stub.extract_calls().len(), 1);
        assert_eq!(f.real.call_count(), 0);
        assert_eq!(f.logger.errors(), 0);
    }

    #[test]
    fn enabled_routes_everything_to_the_real_tracer() {
        let f = fixture(true);
        exercise(&f.tracer);

        assert_eq!(f.real.start_span_calls().len(), 1);
        assert_eq!(f.real.inject_calls().len(), 1);
        assert_eq!(f.real.extract_calls().len(), 1);
        assert_eq!(f.stub.call_count(), 0);
    }

    #[test]
    fn failing_predicate_routes_to_the_stub_and_logs() {
        let real = RecordingTracer::new("real");
        let stub = RecordingTracer::new("stub");
        let logger = Arc::new(CollectingLogger::default());
        let tracer = SwitchableTracer::builder(Arc::new(real.clone()))
            .with_stub(Arc::new(stub.clone()))
            .with_enabled(|| Err("flag service unavailable".into()))
            .with_logger(logger.clone())
            .build();

        exercise(&tracer);

        assert_eq!(stub.start_span_calls().len(), 1);
        assert_eq!(stub.inject_calls().len(), 1);
        assert_eq!(stub.extract_calls().len(), 1);
        assert_eq!(real.call_count(), 0);
        assert!(logger.errors() >= 1);
        assert!(logger.0.lock().unwrap()[0]
            .1
            .contains("flag service unavailable"));
    }

    #[test]
    fn strips_real_parents_when_disabled() {
        let f = fixture(false);
        let real_parent = Span::builder("parent").build();

        f.tracer
            .start_span("x", SpanOptions::child_of(&real_parent))
            .unwrap();

        let calls = f.stub.start_span_calls();
        assert_eq!(calls[0].name, "x");
        assert_eq!(calls[0].options, SpanOptions::default());
    }

    #[test]
    fn strips_stub_parents_when_enabled() {
        let f = fixture(false);
        let stub_parent = f.tracer.start("parent").unwrap();
        assert_eq!(stub_parent.origin(), Origin::Stub);

        f.enabled.store(true, Ordering::SeqCst);
        f.tracer
            .start_span("x", SpanOptions::child_of(&stub_parent))
            .unwrap();

        let calls = f.real.start_span_calls();
        assert_eq!(calls[0].name, "x");
        assert_eq!(calls[0].options, SpanOptions::default());
    }

    #[test]
    fn keeps_parents_from_the_same_side() {
        let f = fixture(false);
        let stub_parent = f.tracer.start("parent").unwrap();
        let real_parent = Span::builder("real").build();

        let options = SpanOptions::child_of(&stub_parent)
            .with_reference(Reference::follows_from(&real_parent));
        f.tracer.start_span("x", options).unwrap();

        let received = &f.stub.start_span_calls()[1].options;
        assert_eq!(received.child_of.as_ref(), Some(&stub_parent));
        assert!(received.references.is_empty());
    }

    #[test]
    fn stub_spans_are_always_injected_by_the_stub() {
        let f = fixture(false);
        let stub_span = f.tracer.start("op").unwrap();

        f.enabled.store(true, Ordering::SeqCst);
        let mut carrier: HashMap<String, String> = HashMap::new();
        f.tracer
            .inject(&stub_span, Format::HttpHeaders, &mut carrier)
            .unwrap();

        assert_eq!(f.stub.inject_calls().len(), 1);
        assert!(f.real.inject_calls().is_empty());
        assert_eq!(carrier[RecordingTracer::CARRIER_KEY], "stub");
    }

    #[test]
    fn extracted_spans_carry_the_route_origin() {
        let f = fixture(false);
        let carrier: HashMap<String, String> = HashMap::new();

        let stub_span = f.tracer.extract(Format::TextMap, &carrier).unwrap().unwrap();
        assert_eq!(stub_span.origin(), Origin::Stub);

        f.enabled.store(true, Ordering::SeqCst);
        let real_span = f.tracer.extract(Format::TextMap, &carrier).unwrap().unwrap();
        assert_eq!(real_span.origin(), Origin::Real);
    }

    #[test]
    fn predicate_is_evaluated_on_every_call() {
        let evaluations = Arc::new(AtomicUsize::new(0));
        let counter = evaluations.clone();
        let tracer = SwitchableTracer::builder(Arc::new(RecordingTracer::new("real")))
            .with_enabled(move || Ok(counter.fetch_add(1, Ordering::SeqCst) % 2 == 0))
            .build();

        let first = tracer.start("a").unwrap();
        let second = tracer.start("b").unwrap();
        let third = tracer.start("c").unwrap();

        assert_eq!(evaluations.load(Ordering::SeqCst), 3);
        assert_eq!(first.origin(), Origin::Real);
        assert_eq!(second.origin(), Origin::Stub);
        assert_eq!(third.origin(), Origin::Real);
    }

    #[test]
    fn defaults_to_enabled_with_a_noop_stub() {
        let real = RecordingTracer::new("real");
        let tracer = SwitchableTracer::builder(Arc::new(real.clone())).build();

        tracer.start("op").unwrap();
        assert_eq!(real.start_span_calls().len(), 1);
    }
}
