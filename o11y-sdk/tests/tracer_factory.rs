use o11y::propagation::Format;
use o11y::trace::Tracer;
use o11y_sdk::metrics::{InMemoryMetricsBackend, Metrics};
use o11y_sdk::trace::{SliConfig, SliOperation, TracerFactory, OPERATION_KEY, SPAN_ID_KEY};
use o11y_sdk::{Config, TraceBackend};
use std::collections::HashMap;
use std::sync::Arc;

fn mock_config() -> Config {
    Config::builder()
        .with_trace_backend(TraceBackend::Mock)
        .build()
}

#[test]
fn mock_tracer_from_the_environment() {
    temp_env::with_var("TRACE_AGENT_CLIENT", Some("mock"), || {
        let config = Config::default();
        assert_eq!(config.trace_backend, TraceBackend::Mock);
        assert!(TracerFactory::new().create(&config, None).as_mock().is_some());
    });
}

#[test]
fn mock_tracer_injects_and_extracts() {
    let tracer = TracerFactory::new().create(&mock_config(), None);

    let span = tracer.start("my_operation").unwrap();
    span.set_baggage_item("tenant", "acme");
    let mut carrier: HashMap<String, String> = HashMap::new();
    tracer
        .inject(&span, Format::HttpHeaders, &mut carrier)
        .unwrap();

    assert_eq!(carrier[SPAN_ID_KEY], span.span_id());
    assert_eq!(carrier[OPERATION_KEY], "my_operation");

    let extracted = tracer
        .extract(Format::HttpHeaders, &carrier)
        .unwrap()
        .unwrap();
    assert_eq!(extracted.span_id(), span.span_id());
    assert_eq!(extracted.operation_name(), "my_operation");
    assert_eq!(extracted.baggage_item("tenant").as_deref(), Some("acme"));
}

#[test]
fn sli_tracking_counts_tracked_operations_only() {
    let backend = InMemoryMetricsBackend::default();
    let slis = SliConfig::new()
        .track("checkout", SliOperation::new().with_tags(vec!["team:payments"]))
        .track("login", SliOperation::new());
    let tracer = TracerFactory::new()
        .with_metrics(Metrics::new(Arc::new(backend.clone())))
        .create(&mock_config(), Some(&slis));

    tracer.start("checkout").unwrap();
    tracer.start("healthcheck").unwrap();
    tracer.start("login").unwrap();

    let tags: Vec<Vec<String>> = backend
        .get_emissions()
        .unwrap()
        .into_iter()
        .map(|emission| emission.tags.as_slice().to_vec())
        .collect();
    assert_eq!(
        tags,
        [
            vec!["operation:checkout".to_string(), "team:payments".to_string()],
            vec!["operation:login".to_string()],
        ]
    );

    let multi = tracer.as_multi().unwrap();
    let mut carrier: HashMap<String, String> = HashMap::new();
    let span = multi.primary().start("checkout").unwrap();
    tracer.inject(&span, Format::TextMap, &mut carrier).unwrap();
    assert_eq!(carrier[OPERATION_KEY], "checkout");
}
