//! Service level indicator tracking from span lifecycle events.
use crate::metrics::Metrics;
use o11y::metrics::Tags;
use o11y::propagation::{Extractor, Format, Injector};
use o11y::trace::{Origin, Span, SpanOptions, TraceResult, Tracer};
use std::collections::BTreeMap;

/// Counter incremented for every tracked span start.
pub const SPAN_STARTED_METRIC: &str = "sli.span.started";

/// Tracking settings for one operation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SliOperation {
    tags: Tags,
}

impl SliOperation {
    /// An operation tracked with no extra tags.
    pub fn new() -> Self {
        SliOperation::default()
    }

    /// Adds tags emitted with every sample of this operation.
    pub fn with_tags(mut self, tags: impl Into<Tags>) -> Self {
        self.tags = self.tags.merged(&tags.into());
        self
    }

    /// The extra tags.
    pub fn tags(&self) -> &Tags {
        &self.tags
    }
}

/// Which operations an [`SliTracer`] tracks.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SliConfig {
    operations_to_track: BTreeMap<String, SliOperation>,
}

impl SliConfig {
    /// A configuration tracking nothing.
    pub fn new() -> Self {
        SliConfig::default()
    }

    /// Tracks `operation`.
    pub fn track(mut self, operation: impl Into<String>, settings: SliOperation) -> Self {
        self.operations_to_track.insert(operation.into(), settings);
        self
    }

    /// The tracked operations by name.
    pub fn operations_to_track(&self) -> &BTreeMap<String, SliOperation> {
        &self.operations_to_track
    }

    /// Returns `true` if nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.operations_to_track.is_empty()
    }
}

/// A tracer that turns span starts of tracked operations into metrics.
///
/// It is meant to run as an additional tracer of a
/// [`MultiTracer`](crate::trace::MultiTracer): the spans it returns are
/// throwaway stubs and it never takes part in propagation.
#[derive(Clone, Debug)]
pub struct SliTracer {
    config: SliConfig,
    metrics: Metrics,
}

impl SliTracer {
    /// A tracer emitting through `metrics`.
    pub fn new(config: SliConfig, metrics: Metrics) -> Self {
        SliTracer { config, metrics }
    }

    /// The tracking configuration.
    pub fn config(&self) -> &SliConfig {
        &self.config
    }
}

impl Tracer for SliTracer {
    fn start_span(&self, name: &str, _options: SpanOptions) -> TraceResult<Span> {
        if let Some(operation) = self.config.operations_to_track.get(name) {
            let mut tags = Tags::new();
            tags.push("operation", name);
            self.metrics
                .increment_one(SPAN_STARTED_METRIC, tags.merged(operation.tags()));
        }
        Ok(Span::builder(name).with_origin(Origin::Stub).build())
    }

    fn inject(&self, _span: &Span, _format: Format, _carrier: &mut dyn Injector) -> TraceResult<()> {
        Ok(())
    }

    fn extract(&self, _format: Format, _carrier: &dyn Extractor) -> TraceResult<Option<Span>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{InMemoryMetricsBackend, MetricKind};
    use std::collections::HashMap;
    use std::sync::Arc;

    fn sli_tracer(config: SliConfig) -> (SliTracer, InMemoryMetricsBackend) {
        let backend = InMemoryMetricsBackend::default();
        let metrics = Metrics::new(Arc::new(backend.clone()));
        (SliTracer::new(config, metrics), backend)
    }

    #[test]
    fn counts_tracked_operations() {
        let config = SliConfig::new().track(
            "my_operation",
            SliOperation::new().with_tags(Tags::from(vec!["tier:gold"])),
        );
        let (tracer, backend) = sli_tracer(config);

        tracer.start("my_operation").unwrap();

        let emissions = backend.get_emissions().unwrap();
        assert_eq!(emissions.len(), 1);
        assert_eq!(emissions[0].kind, MetricKind::Increment);
        assert_eq!(emissions[0].name, SPAN_STARTED_METRIC);
        assert_eq!(
            emissions[0].tags.as_slice(),
            ["operation:my_operation", "tier:gold"]
        );
    }

    #[test]
    fn ignores_untracked_operations() {
        let (tracer, backend) = sli_tracer(SliConfig::new().track("tracked", SliOperation::new()));

        let span = tracer.start("other").unwrap();

        assert!(backend.get_emissions().unwrap().is_empty());
        assert_eq!(span.origin(), Origin::Stub);
    }

    #[test]
    fn never_propagates() {
        let (tracer, _) = sli_tracer(SliConfig::new());
        let span = Span::builder("op").build();
        let mut carrier: HashMap<String, String> = HashMap::new();

        tracer.inject(&span, Format::TextMap, &mut carrier).unwrap();
        assert!(carrier.is_empty());

        carrier.insert("ot-mock-tracer".into(), "id".into());
        assert!(tracer.extract(Format::TextMap, &carrier).unwrap().is_none());
    }
}
