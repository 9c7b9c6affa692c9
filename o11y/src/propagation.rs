//! # Propagation carriers
//!
//! A tracer moves a span's identity, operation name and baggage across a
//! process boundary by writing them into a *carrier* with
//! [`Tracer::inject`] and reading them back with [`Tracer::extract`].
//!
//! Carriers are flat string-to-string maps seen through the [`Injector`] and
//! [`Extractor`] traits, which are implemented for `HashMap<String, String>`
//! and `BTreeMap<String, String>`. Keys are stored verbatim.
//!
//! Only the text-map style [`Format`]s ([`Format::HttpHeaders`] and
//! [`Format::TextMap`]) carry data; a tracer asked to use any other format
//! leaves the carrier untouched on inject and returns nothing on extract.
//!
//! [`Tracer::inject`]: crate::trace::Tracer::inject
//! [`Tracer::extract`]: crate::trace::Tracer::extract
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Serialization format requested for a propagation call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Format {
    /// Entries intended to be sent as HTTP header names and values.
    HttpHeaders,
    /// Entries in an arbitrary string-to-string map.
    TextMap,
    /// An opaque binary blob.
    Binary,
}

impl Format {
    /// Returns true for the formats that use a flat string map carrier.
    pub fn is_text_map(&self) -> bool {
        matches!(self, Format::HttpHeaders | Format::TextMap)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Format::HttpHeaders => "http_headers",
            Format::TextMap => "text_map",
            Format::Binary => "binary",
        })
    }
}

/// Injector provides an interface for adding fields to an underlying carrier.
pub trait Injector {
    /// Add a key and value to the underlying data.
    fn set(&mut self, key: &str, value: String);
}

/// Extractor provides an interface for reading fields from an underlying carrier.
pub trait Extractor {
    /// Get a value from a key from the underlying data.
    fn get(&self, key: &str) -> Option<Cow<'_, str>>;

    /// Collect all the keys from the underlying data.
    fn keys(&self) -> Vec<Cow<'_, str>>;
}

impl<S: std::hash::BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the HashMap.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

impl<S: std::hash::BuildHasher> Extractor for HashMap<String, String, S> {
    /// Get a value for a key from the HashMap.
    fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        HashMap::get(self, key).map(|v| Cow::Borrowed(v.as_str()))
    }

    /// Collect all the keys from the HashMap.
    fn keys(&self) -> Vec<Cow<'_, str>> {
        HashMap::keys(self)
            .map(|k| Cow::Borrowed(k.as_str()))
            .collect::<Vec<_>>()
    }
}

impl Injector for BTreeMap<String, String> {
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

impl Extractor for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        BTreeMap::get(self, key).map(|v| Cow::Borrowed(v.as_str()))
    }

    fn keys(&self) -> Vec<Cow<'_, str>> {
        BTreeMap::keys(self)
            .map(|k| Cow::Borrowed(k.as_str()))
            .collect::<Vec<_>>()
    }
}
