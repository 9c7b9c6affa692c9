//! Primitives for sending name/value data across system boundaries.
//!
//! Baggage is a set of name/value pairs that travels with a trace. It is
//! owned by the trace's root span: every descendant created through a
//! child-of reference holds a handle to the same [`SharedBaggage`], so an
//! item set on any span is immediately visible on every other span of that
//! trace. Spans of unrelated traces never share baggage.
//!
//! Main types in this module are:
//!
//! * [`Baggage`]: An ordered set of name/value pairs.
//! * [`SharedBaggage`]: A reference counted, lock protected handle to one
//!   `Baggage`, shared by all spans of a trace.
//!
//! Baggage size is not bounded: a trace can carry as many items as its spans
//! set.
use std::collections::{btree_map, BTreeMap};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// An ordered set of name/value pairs describing user-defined properties.
///
/// Items are kept in key order so that serialization into a carrier is
/// deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Baggage {
    inner: BTreeMap<String, String>,
}

impl Baggage {
    /// Creates an empty `Baggage`.
    pub fn new() -> Self {
        Baggage {
            inner: BTreeMap::new(),
        }
    }

    /// Returns a reference to the value associated with a given name
    ///
    /// # Examples
    ///
    /// ```
    /// use o11y::baggage::Baggage;
    ///
    /// let mut baggage = Baggage::new();
    /// let _ = baggage.insert("my-name", "my-value");
    ///
    /// assert_eq!(baggage.get("my-name"), Some("my-value"))
    /// ```
    pub fn get<K: AsRef<str>>(&self, key: K) -> Option<&str> {
        self.inner.get(key.as_ref()).map(String::as_str)
    }

    /// Inserts a name/value pair into the baggage.
    ///
    /// If the name was not present, [`None`] is returned. If the name was
    /// present, the value is updated, and the old value is returned.
    pub fn insert<K, V>(&mut self, key: K, value: V) -> Option<String>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.insert(key.into(), value.into())
    }

    /// Removes a name from the baggage, returning the value if present.
    pub fn remove<K: AsRef<str>>(&mut self, key: K) -> Option<String> {
        self.inner.remove(key.as_ref())
    }

    /// Returns the number of name/value pairs.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the baggage contains no items.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Gets an iterator over the baggage items, sorted by name.
    pub fn iter(&self) -> Iter<'_> {
        self.into_iter()
    }
}

impl<K, V> FromIterator<(K, V)> for Baggage
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Baggage {
            inner: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// An iterator over the entries of a [`Baggage`].
#[derive(Debug)]
pub struct Iter<'a>(btree_map::Iter<'a, String, String>);

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a str);

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next().map(|(key, value)| (key.as_str(), value.as_str()))
    }
}

impl<'a> IntoIterator for &'a Baggage {
    type Item = (&'a str, &'a str);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Iter(self.inner.iter())
    }
}

/// A handle to the baggage of one trace.
///
/// Cloning the handle shares the underlying map; use [`SharedBaggage::new`]
/// to start a fresh, unrelated one.
///
/// ```
/// use o11y::baggage::SharedBaggage;
///
/// let root = SharedBaggage::new();
/// let child = root.clone();
/// child.set("a", "b");
///
/// assert_eq!(root.get("a"), Some("b".to_string()));
/// assert!(root.ptr_eq(&child));
/// assert!(!root.ptr_eq(&SharedBaggage::new()));
/// ```
#[derive(Clone, Default)]
pub struct SharedBaggage(Arc<RwLock<Baggage>>);

impl SharedBaggage {
    /// Creates a handle to a new, empty baggage map.
    pub fn new() -> Self {
        SharedBaggage(Arc::new(RwLock::new(Baggage::new())))
    }

    /// Returns a copy of the value stored under `key`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.read().get(key).map(str::to_string)
    }

    /// Stores `value` under `key`, visible through every clone of this handle.
    pub fn set<K, V>(&self, key: K, value: V) -> Option<String>
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.write().insert(key, value)
    }

    /// Returns a point-in-time copy of all items.
    pub fn snapshot(&self) -> Baggage {
        self.read().clone()
    }

    /// Returns true if both handles refer to the same baggage map.
    pub fn ptr_eq(&self, other: &SharedBaggage) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    // A panic while holding the lock cannot leave a BTreeMap in an invalid
    // state, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, Baggage> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Baggage> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl From<Baggage> for SharedBaggage {
    fn from(baggage: Baggage) -> Self {
        SharedBaggage(Arc::new(RwLock::new(baggage)))
    }
}

impl fmt::Debug for SharedBaggage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedBaggage").field(&*self.read()).finish()
    }
}
