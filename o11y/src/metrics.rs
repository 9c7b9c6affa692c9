//! The metrics seam.
//!
//! A [`MetricsBackend`] receives fully resolved emissions (name, value and
//! `key:value` tags) and forwards them to a concrete sink such as a StatsD
//! agent or a vendor HTTP API. The SDK's `Metrics` client handles default
//! tags and timers on top of it.
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use thiserror::Error;

/// A specialized `Result` type for metric operations.
pub type MetricResult<T> = Result<T, MetricError>;

/// Errors returned by metric backends.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MetricError {
    /// The backend could not deliver an emission.
    #[error("metrics backend failed: {0}")]
    Backend(String),

    /// Other errors not covered by specific cases.
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync + 'static>),
}

/// An ordered list of `key:value` metric tags.
///
/// Tags can be built from pre-formatted strings or from key/value pairs:
///
/// ```
/// use o11y::metrics::Tags;
/// use std::collections::BTreeMap;
///
/// let from_strings = Tags::from(vec!["foo:bar", "bar:baz"]);
/// let from_map = Tags::from(BTreeMap::from([("bar", "baz"), ("foo", "bar")]));
///
/// assert_eq!(from_strings.as_slice(), ["foo:bar", "bar:baz"]);
/// assert_eq!(from_map.as_slice(), ["bar:baz", "foo:bar"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Tags(Vec<String>);

impl Tags {
    /// An empty tag list.
    pub fn new() -> Self {
        Tags(Vec::new())
    }

    /// Formats each pair as `key:value`, keeping iteration order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: fmt::Display,
        V: fmt::Display,
    {
        Tags(
            pairs
                .into_iter()
                .map(|(key, value)| format!("{key}:{value}"))
                .collect(),
        )
    }

    /// Appends one `key:value` tag.
    pub fn push(&mut self, key: impl fmt::Display, value: impl fmt::Display) {
        self.0.push(format!("{key}:{value}"));
    }

    /// `self` followed by `other`.
    pub fn merged(&self, other: &Tags) -> Tags {
        let mut tags = Vec::with_capacity(self.0.len() + other.0.len());
        tags.extend(self.0.iter().cloned());
        tags.extend(other.0.iter().cloned());
        Tags(tags)
    }

    /// The tags as strings.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Returns `true` if there are no tags.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for Tags {
    fn from(tags: Vec<String>) -> Self {
        Tags(tags)
    }
}

impl From<Vec<&str>> for Tags {
    fn from(tags: Vec<&str>) -> Self {
        Tags(tags.into_iter().map(str::to_string).collect())
    }
}

impl<K: fmt::Display, V: fmt::Display> From<BTreeMap<K, V>> for Tags {
    fn from(tags: BTreeMap<K, V>) -> Self {
        Tags::from_pairs(tags)
    }
}

/// Map entries are sorted by key so the result does not depend on hashing.
impl<K: fmt::Display + Ord, V: fmt::Display> From<HashMap<K, V>> for Tags {
    fn from(tags: HashMap<K, V>) -> Self {
        Tags::from_pairs(tags.into_iter().collect::<BTreeMap<K, V>>())
    }
}

impl From<&Tags> for Tags {
    fn from(tags: &Tags) -> Self {
        tags.clone()
    }
}

/// A sink for metric emissions.
pub trait MetricsBackend: fmt::Debug + Send + Sync {
    /// Records the current value of a gauge.
    fn gauge(&self, name: &str, value: f64, tags: &Tags) -> MetricResult<()>;

    /// Adds `value` to a counter.
    fn increment(&self, name: &str, value: f64, tags: &Tags) -> MetricResult<()>;

    /// Records one sample of a distribution.
    fn histogram(&self, name: &str, value: f64, tags: &Tags) -> MetricResult<()>;

    /// Delivers any buffered emissions.
    fn flush(&self) -> MetricResult<()> {
        Ok(())
    }
}
