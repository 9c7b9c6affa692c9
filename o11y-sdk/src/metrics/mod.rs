//! # Metrics client
//!
//! [`Metrics`] is the handle application code emits metrics through. It
//! resolves tags (defaults first, then the call's own tags), keeps timers
//! and forwards the result to a [`MetricsBackend`].
//!
//! A client without a backend is *inactive*: every call is accepted and
//! dropped. Backend failures are reported to
//! [`o11y::global::handle_error`] and never reach the caller.
//!
//! ```
//! use o11y::metrics::Tags;
//! use o11y_sdk::metrics::{InMemoryMetricsBackend, Metrics};
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! let backend = InMemoryMetricsBackend::default();
//! let metrics = Metrics::new(Arc::new(backend.clone()));
//! metrics.set_default_tags(BTreeMap::from([("color", "red"), ("region", "west")]));
//!
//! metrics.gauge("queue.depth", 14.0, Tags::from(vec!["queue:emails"]));
//!
//! let emission = &backend.get_emissions().unwrap()[0];
//! assert_eq!(emission.tags.as_slice(), ["color:red", "region:west", "queue:emails"]);
//! ```
use o11y::global;
use o11y::metrics::{MetricResult, MetricsBackend, Tags};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

mod in_memory;

pub use in_memory::{Emission, InMemoryMetricsBackend, MetricKind};

/// Running timers kept per client. Starting one more drops the oldest.
pub const MAX_PENDING_TIMERS: usize = 10_000;

/// Identifies a running timer started with [`Metrics::time`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}

#[derive(Debug)]
struct Timer {
    name: String,
    tags: Tags,
    started: Instant,
}

#[derive(Debug, Default)]
struct Inner {
    backend: Option<Arc<dyn MetricsBackend>>,
    prefix: Option<String>,
    default_tags: RwLock<Tags>,
    timers: Mutex<BTreeMap<TimerId, Timer>>,
    next_timer: AtomicU64,
}

/// A metrics client. Clones share default tags and timers.
#[derive(Clone, Debug, Default)]
pub struct Metrics {
    inner: Arc<Inner>,
}

impl Metrics {
    /// A client emitting to `backend`.
    pub fn new(backend: Arc<dyn MetricsBackend>) -> Self {
        Metrics {
            inner: Arc::new(Inner {
                backend: Some(backend),
                ..Default::default()
            }),
        }
    }

    /// A client emitting to `backend` with every metric name prefixed by
    /// `prefix` and a dot. An empty prefix is ignored.
    pub fn with_prefix(backend: Arc<dyn MetricsBackend>, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Metrics {
            inner: Arc::new(Inner {
                backend: Some(backend),
                prefix: Some(prefix).filter(|prefix| !prefix.is_empty()),
                ..Default::default()
            }),
        }
    }

    /// A client that drops everything.
    pub fn inactive() -> Self {
        Metrics::default()
    }

    /// Returns `true` if a backend is configured.
    pub fn is_active(&self) -> bool {
        self.inner.backend.is_some()
    }

    /// Replaces the tags added in front of every emission's tags.
    pub fn set_default_tags(&self, tags: impl Into<Tags>) {
        *self
            .inner
            .default_tags
            .write()
            .unwrap_or_else(PoisonError::into_inner) = tags.into();
    }

    /// The current default tags.
    pub fn default_tags(&self) -> Tags {
        self.inner
            .default_tags
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Records the current value of a gauge.
    pub fn gauge(&self, name: &str, value: f64, tags: impl Into<Tags>) {
        let tags = self.resolve(tags.into());
        self.emit(|backend| backend.gauge(&self.metric_name(name), value, &tags));
    }

    /// Adds `value` to a counter.
    pub fn increment(&self, name: &str, value: f64, tags: impl Into<Tags>) {
        let tags = self.resolve(tags.into());
        self.emit(|backend| backend.increment(&self.metric_name(name), value, &tags));
    }

    /// Adds one to a counter.
    pub fn increment_one(&self, name: &str, tags: impl Into<Tags>) {
        self.increment(name, 1.0, tags)
    }

    /// Records one sample of a distribution.
    pub fn histogram(&self, name: &str, value: f64, tags: impl Into<Tags>) {
        let tags = self.resolve(tags.into());
        self.emit(|backend| backend.histogram(&self.metric_name(name), value, &tags));
    }

    /// Counts one observation of `value` in cumulative buckets.
    ///
    /// The counter is incremented once with an `le:<bound>` tag for every
    /// bound at or above `value`, plus `le:Inf`.
    pub fn observe_bucketed(&self, name: &str, value: f64, buckets: &[f64], tags: impl Into<Tags>) {
        let mut bucket_tags = Tags::new();
        for bound in buckets.iter().filter(|bound| value <= **bound) {
            bucket_tags.push("le", bound);
        }
        bucket_tags.push("le", "Inf");
        self.increment(name, 1.0, bucket_tags.merged(&tags.into()))
    }

    /// Starts a timer for the histogram `name`.
    ///
    /// The timer is held until [`end_time`](Self::end_time) stops it. At
    /// most [`MAX_PENDING_TIMERS`] are held; past that the oldest is dropped
    /// without emitting, and ending it later is a no-op.
    pub fn time(&self, name: &str, tags: impl Into<Tags>) -> TimerId {
        let id = TimerId(self.inner.next_timer.fetch_add(1, Ordering::Relaxed) + 1);
        let timer = Timer {
            name: name.to_string(),
            tags: tags.into(),
            started: Instant::now(),
        };
        let mut timers = self
            .inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if timers.len() >= MAX_PENDING_TIMERS {
            if let Some((dropped, _)) = timers.pop_first() {
                o11y::o11y_debug!(name: "metrics.timer_dropped", timer = dropped.to_string());
            }
        }
        timers.insert(id, timer);
        id
    }

    /// Stops the timer `id` and records the elapsed milliseconds.
    ///
    /// `tags` are added after the tags given to [`time`](Self::time).
    /// Unknown or already stopped timers are ignored.
    pub fn end_time(&self, id: TimerId, tags: impl Into<Tags>) {
        let timer = self
            .inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);

        match timer {
            Some(timer) => {
                let elapsed = timer.started.elapsed().as_secs_f64() * 1000.0;
                self.histogram(&timer.name, elapsed, timer.tags.merged(&tags.into()));
            }
            None => {
                o11y::o11y_debug!(name: "metrics.unknown_timer", timer = id.to_string());
            }
        }
    }

    /// Delivers any emissions buffered by the backend.
    pub fn flush(&self) {
        self.emit(|backend| backend.flush());
    }

    fn metric_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match &self.inner.prefix {
            Some(prefix) => Cow::Owned(format!("{prefix}.{name}")),
            None => Cow::Borrowed(name),
        }
    }

    fn resolve(&self, tags: Tags) -> Tags {
        self.default_tags().merged(&tags)
    }

    fn emit(&self, f: impl FnOnce(&dyn MetricsBackend) -> MetricResult<()>) {
        if let Some(backend) = &self.inner.backend {
            if let Err(err) = f(backend.as_ref()) {
                global::handle_error(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use o11y::metrics::MetricError;
    use std::collections::BTreeMap;

    fn metrics() -> (Metrics, InMemoryMetricsBackend) {
        let backend = InMemoryMetricsBackend::default();
        (Metrics::new(Arc::new(backend.clone())), backend)
    }

    #[derive(Debug)]
    struct FailingBackend;

    impl MetricsBackend for FailingBackend {
        fn gauge(&self, _: &str, _: f64, _: &Tags) -> MetricResult<()> {
            Err(MetricError::Backend("socket closed".into()))
        }
        fn increment(&self, _: &str, _: f64, _: &Tags) -> MetricResult<()> {
            Err(MetricError::Backend("socket closed".into()))
        }
        fn histogram(&self, _: &str, _: f64, _: &Tags) -> MetricResult<()> {
            Err(MetricError::Backend("socket closed".into()))
        }
    }

    #[test]
    fn activity_follows_the_backend() {
        assert!(metrics().0.is_active());
        assert!(!Metrics::inactive().is_active());
        Metrics::inactive().increment_one("ignored", Tags::new());
    }

    #[test]
    fn accepts_string_and_map_tags() {
        let (metrics, backend) = metrics();
        metrics.gauge("foo.bar", 14.0, Tags::from(vec!["tag1:a", "tag2:b"]));
        metrics.gauge("foo.bar", 14.0, BTreeMap::from([("tag1", "a"), ("tag2", "b")]));

        let emissions = backend.get_emissions().unwrap();
        assert_eq!(emissions[0].tags, emissions[1].tags);
        assert_eq!(emissions[0].kind, MetricKind::Gauge);
    }

    #[test]
    fn default_tags_come_first() {
        let (metrics, backend) = metrics();
        metrics.set_default_tags(BTreeMap::from([("color", "red"), ("region", "west")]));
        assert_eq!(metrics.default_tags().as_slice(), ["color:red", "region:west"]);

        metrics.histogram("latency", 5.5, Tags::from(vec!["route:/"]));

        let emission = &backend.get_emissions().unwrap()[0];
        assert_eq!(emission.kind, MetricKind::Histogram);
        assert_eq!(emission.tags.as_slice(), ["color:red", "region:west", "route:/"]);
    }

    #[test]
    fn increment_one_uses_value_one() {
        let (metrics, backend) = metrics();
        metrics.increment_one("foobar", Tags::new());
        metrics.increment_one("foobar", Tags::from(vec!["bar", "foo"]));

        let emissions = backend.get_emissions().unwrap();
        assert_eq!(emissions[0].value, 1.0);
        assert!(emissions[0].tags.is_empty());
        assert_eq!(emissions[1].tags.as_slice(), ["bar", "foo"]);
    }

    #[test]
    fn observe_bucketed_tags_matching_buckets() {
        let (metrics, backend) = metrics();
        metrics.observe_bucketed("foobar", 34.0, &[20.0, 50.0, 100.0], Tags::new());
        metrics.observe_bucketed("foobar", 200.0, &[20.0], Tags::new());
        metrics.observe_bucketed(
            "foobar",
            95.0,
            &[20.0, 50.0, 100.0],
            Tags::from(vec!["tag1", "tag2:val2"]),
        );

        let emissions = backend.get_emissions().unwrap();
        assert_eq!(emissions[0].tags.as_slice(), ["le:50", "le:100", "le:Inf"]);
        assert_eq!(emissions[1].tags.as_slice(), ["le:Inf"]);
        assert_eq!(
            emissions[2].tags.as_slice(),
            ["le:100", "le:Inf", "tag1", "tag2:val2"]
        );
        assert!(emissions.iter().all(|e| e.value == 1.0));
    }

    #[test]
    fn timers_emit_elapsed_milliseconds() {
        let (metrics, backend) = metrics();
        let first = metrics.time("foo.bar", Tags::from(vec!["tag1:a"]));
        let second = metrics.time("foo.bar", Tags::new());
        assert_ne!(first, second);

        metrics.end_time(first, Tags::from(vec!["tag2:b"]));
        metrics.end_time(first, Tags::new());

        let emissions = backend.get_emissions().unwrap();
        assert_eq!(emissions.len(), 1);
        assert_eq!(emissions[0].kind, MetricKind::Histogram);
        assert_eq!(emissions[0].name, "foo.bar");
        assert!(emissions[0].value >= 0.0);
        assert_eq!(emissions[0].tags.as_slice(), ["tag1:a", "tag2:b"]);
    }

    #[test]
    fn abandoned_timers_are_bounded() {
        let (metrics, backend) = metrics();
        let oldest = metrics.time("abandoned", Tags::new());
        let mut newest = oldest;
        for _ in 0..MAX_PENDING_TIMERS {
            newest = metrics.time("abandoned", Tags::new());
        }
        assert_eq!(metrics.inner.timers.lock().unwrap().len(), MAX_PENDING_TIMERS);

        metrics.end_time(oldest, Tags::new());
        assert!(backend.get_emissions().unwrap().is_empty());

        metrics.end_time(newest, Tags::new());
        assert_eq!(backend.get_emissions().unwrap().len(), 1);
    }

    #[test]
    fn prefixes_metric_names() {
        let backend = InMemoryMetricsBackend::default();
        let metrics = Metrics::with_prefix(Arc::new(backend.clone()), "svc");
        let unprefixed = Metrics::with_prefix(Arc::new(backend.clone()), "");

        metrics.increment_one("requests", Tags::new());
        let id = metrics.time("latency", Tags::new());
        metrics.end_time(id, Tags::new());
        unprefixed.increment_one("requests", Tags::new());

        let names: Vec<String> = backend
            .get_emissions()
            .unwrap()
            .into_iter()
            .map(|emission| emission.name)
            .collect();
        assert_eq!(names, ["svc.requests", "svc.latency", "requests"]);
    }

    #[test]
    fn flush_reaches_the_backend() {
        let (metrics, backend) = metrics();
        metrics.flush();
        assert_eq!(backend.flush_count().unwrap(), 1);

        backend.reset();
        assert_eq!(backend.flush_count().unwrap(), 0);
    }

    #[test]
    fn backend_failures_are_swallowed() {
        let metrics = Metrics::new(Arc::new(FailingBackend));
        metrics.gauge("g", 1.0, Tags::new());
        metrics.increment_one("c", Tags::new());
        metrics.flush();
    }
}
