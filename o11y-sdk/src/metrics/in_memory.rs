use o11y::metrics::{MetricError, MetricResult, MetricsBackend, Tags};
use std::fmt;
use std::sync::{Arc, Mutex};

/// The kind of a recorded emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetricKind {
    /// A gauge reading.
    Gauge,
    /// A counter increment.
    Increment,
    /// A distribution sample.
    Histogram,
}

/// One emission received by an [`InMemoryMetricsBackend`].
#[derive(Clone, Debug, PartialEq)]
pub struct Emission {
    /// What was emitted.
    pub kind: MetricKind,
    /// The metric name.
    pub name: String,
    /// The emitted value.
    pub value: f64,
    /// The resolved tags, defaults first.
    pub tags: Tags,
}

/// A metrics backend that stores emissions in memory.
///
/// This backend is useful for testing and debugging purposes. Clones share
/// the same storage.
///
/// # Example
///
/// ```
/// use o11y_sdk::metrics::{InMemoryMetricsBackend, Metrics};
/// use o11y::metrics::Tags;
/// use std::sync::Arc;
///
/// let backend = InMemoryMetricsBackend::default();
/// let metrics = Metrics::new(Arc::new(backend.clone()));
///
/// metrics.increment_one("requests", Tags::from(vec!["route:/"]));
///
/// let emissions = backend.get_emissions().unwrap();
/// assert_eq!(emissions[0].name, "requests");
/// assert_eq!(emissions[0].value, 1.0);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryMetricsBackend {
    emissions: Arc<Mutex<Vec<Emission>>>,
    flushes: Arc<Mutex<usize>>,
}

impl fmt::Debug for InMemoryMetricsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryMetricsBackend").finish()
    }
}

impl InMemoryMetricsBackend {
    /// Returns every emission received so far, in order.
    ///
    /// # Errors
    ///
    /// Returns a `MetricError` if the internal lock cannot be acquired.
    pub fn get_emissions(&self) -> MetricResult<Vec<Emission>> {
        self.emissions
            .lock()
            .map(|emissions| emissions.clone())
            .map_err(|err| MetricError::Backend(format!("failed to lock emissions: {err}")))
    }

    /// Returns how many times the backend was flushed.
    ///
    /// # Errors
    ///
    /// Returns a `MetricError` if the internal lock cannot be acquired.
    pub fn flush_count(&self) -> MetricResult<usize> {
        self.flushes
            .lock()
            .map(|flushes| *flushes)
            .map_err(|err| MetricError::Backend(format!("failed to lock flushes: {err}")))
    }

    /// Clears the recorded emissions and flush count.
    pub fn reset(&self) {
        let _ = self.emissions.lock().map(|mut emissions| emissions.clear());
        let _ = self.flushes.lock().map(|mut flushes| *flushes = 0);
    }

    fn record(&self, kind: MetricKind, name: &str, value: f64, tags: &Tags) -> MetricResult<()> {
        self.emissions
            .lock()
            .map(|mut emissions| {
                emissions.push(Emission {
                    kind,
                    name: name.to_string(),
                    value,
                    tags: tags.clone(),
                })
            })
            .map_err(|err| MetricError::Backend(format!("failed to lock emissions: {err}")))
    }
}

impl MetricsBackend for InMemoryMetricsBackend {
    fn gauge(&self, name: &str, value: f64, tags: &Tags) -> MetricResult<()> {
        self.record(MetricKind::Gauge, name, value, tags)
    }

    fn increment(&self, name: &str, value: f64, tags: &Tags) -> MetricResult<()> {
        self.record(MetricKind::Increment, name, value, tags)
    }

    fn histogram(&self, name: &str, value: f64, tags: &Tags) -> MetricResult<()> {
        self.record(MetricKind::Histogram, name, value, tags)
    }

    fn flush(&self) -> MetricResult<()> {
        self.flushes
            .lock()
            .map(|mut flushes| *flushes += 1)
            .map_err(|err| MetricError::Backend(format!("failed to lock flushes: {err}")))
    }
}
