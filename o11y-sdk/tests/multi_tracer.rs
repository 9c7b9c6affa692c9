use o11y::global;
use o11y::testing::trace::RecordingTracer;
use o11y::trace::Tracer;
use o11y_sdk::trace::{MockTracer, MultiTracer};
use std::sync::{Arc, Mutex};

// The error handler is process wide, so this binary installs it once.
#[test]
fn observer_failures_reach_the_global_error_handler() {
    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    global::set_error_handler(move |err| sink.lock().unwrap().push(err.to_string())).unwrap();

    let primary = MockTracer::new();
    let healthy = RecordingTracer::new("healthy");
    let tracer = MultiTracer::new(Arc::new(primary.clone()))
        .with_additional_tracer(Arc::new(RecordingTracer::failing("flaky", "agent unreachable")))
        .with_additional_tracer(Arc::new(healthy.clone()));

    let span = tracer.start("checkout").unwrap();

    assert_eq!(primary.spans(), vec![span]);
    assert_eq!(healthy.start_span_calls().len(), 1);
    let reported = reported.lock().unwrap();
    assert_eq!(reported.len(), 1);
    assert!(reported[0].contains("agent unreachable"));
}

#[test]
fn primary_failures_reach_the_caller() {
    let observer = RecordingTracer::new("observer");
    let tracer = MultiTracer::new(Arc::new(RecordingTracer::failing("primary", "boom")))
        .with_additional_tracer(Arc::new(observer.clone()));

    assert!(tracer.start("checkout").is_err());
    assert_eq!(observer.call_count(), 0);
}
