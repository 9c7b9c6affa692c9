//! A tracer that records every call it receives.
use crate::propagation::{Extractor, Format, Injector};
use crate::trace::{Span, SpanOptions, TraceError, TraceResult, Tracer};
use std::sync::{Arc, Mutex, PoisonError};

/// One `start_span` call.
#[derive(Clone, Debug, PartialEq)]
pub struct StartSpanCall {
    /// The requested operation name.
    pub name: String,
    /// The options as received.
    pub options: SpanOptions,
}

/// One `inject` call.
#[derive(Clone, Debug, PartialEq)]
pub struct InjectCall {
    /// The span handle as received.
    pub span: Span,
    /// The requested format.
    pub format: Format,
}

/// One `extract` call.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractCall {
    /// The requested format.
    pub format: Format,
    /// The carrier keys visible at the time of the call, sorted.
    pub carrier_keys: Vec<String>,
}

#[derive(Debug, Default)]
struct Calls {
    start_span: Vec<StartSpanCall>,
    inject: Vec<InjectCall>,
    extract: Vec<ExtractCall>,
}

/// Records `start_span`, `inject` and `extract` calls.
///
/// Clones share their records. `inject` writes
/// [`RecordingTracer::CARRIER_KEY`] with the tracer's label into the
/// carrier so tests can tell which tracer serialized a span.
#[derive(Clone, Debug)]
pub struct RecordingTracer {
    label: &'static str,
    failure: Option<&'static str>,
    calls: Arc<Mutex<Calls>>,
}

impl RecordingTracer {
    /// Carrier key written by `inject`.
    pub const CARRIER_KEY: &'static str = "recording-tracer";

    /// A recording tracer named `label`.
    pub fn new(label: &'static str) -> Self {
        RecordingTracer {
            label,
            failure: None,
            calls: Arc::new(Mutex::new(Calls::default())),
        }
    }

    /// A recording tracer whose every operation fails with `message` after
    /// being recorded.
    pub fn failing(label: &'static str, message: &'static str) -> Self {
        RecordingTracer {
            failure: Some(message),
            ..RecordingTracer::new(label)
        }
    }

    /// Recorded `start_span` calls.
    pub fn start_span_calls(&self) -> Vec<StartSpanCall> {
        self.calls().start_span.clone()
    }

    /// Recorded `inject` calls.
    pub fn inject_calls(&self) -> Vec<InjectCall> {
        self.calls().inject.clone()
    }

    /// Recorded `extract` calls.
    pub fn extract_calls(&self) -> Vec<ExtractCall> {
        self.calls().extract.clone()
    }

    /// Total number of recorded calls.
    pub fn call_count(&self) -> usize {
        let calls = self.calls();
        calls.start_span.len() + calls.inject.len() + calls.extract.len()
    }

    fn calls(&self) -> std::sync::MutexGuard<'_, Calls> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn outcome(&self) -> TraceResult<()> {
        match self.failure {
            Some(message) => Err(TraceError::backend(self.label, message)),
            None => Ok(()),
        }
    }
}

impl Tracer for RecordingTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> TraceResult<Span> {
        self.calls().start_span.push(StartSpanCall {
            name: name.to_string(),
            options: options.clone(),
        });
        self.outcome()?;
        Ok(options.apply(Span::builder(name)).build())
    }

    fn inject(&self, span: &Span, format: Format, carrier: &mut dyn Injector) -> TraceResult<()> {
        self.calls().inject.push(InjectCall {
            span: span.clone(),
            format,
        });
        self.outcome()?;
        carrier.set(Self::CARRIER_KEY, self.label.to_string());
        Ok(())
    }

    fn extract(&self, format: Format, carrier: &dyn Extractor) -> TraceResult<Option<Span>> {
        let mut carrier_keys: Vec<String> =
            carrier.keys().into_iter().map(|key| key.into_owned()).collect();
        carrier_keys.sort();
        self.calls().extract.push(ExtractCall {
            format,
            carrier_keys,
        });
        self.outcome()?;
        Ok(Some(Span::builder(self.label).build()))
    }
}
