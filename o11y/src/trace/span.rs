use crate::baggage::{Baggage, SharedBaggage};
use crate::{tags, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

/// Which kind of tracer produced a [`Span`] handle.
///
/// Spans made by a stub tracer cannot be resolved by a real backend and
/// vice versa; decorating tracers use this tag to keep the two span graphs
/// apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Produced by a real (possibly mock) tracer backend.
    #[default]
    Real,
    /// Produced by the stub tracer used while tracing is disabled.
    Stub,
}

/// The causal relation a [`Reference`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReferenceType {
    /// The referenced span depends on the result of the new span.
    ChildOf,
    /// The referenced span does not depend on the new span.
    FollowsFrom,
}

/// A causal relation from a new span to an existing one.
#[derive(Clone, Debug, PartialEq)]
pub struct Reference {
    kind: ReferenceType,
    span: Span,
}

impl Reference {
    /// A child-of reference to `span`.
    pub fn child_of(span: &Span) -> Self {
        Reference {
            kind: ReferenceType::ChildOf,
            span: span.clone(),
        }
    }

    /// A follows-from reference to `span`.
    pub fn follows_from(span: &Span) -> Self {
        Reference {
            kind: ReferenceType::FollowsFrom,
            span: span.clone(),
        }
    }

    /// The kind of relation.
    pub fn kind(&self) -> ReferenceType {
        self.kind
    }

    /// The referenced span.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// A single traced unit of work.
///
/// `Span` is a cheap handle: clones refer to the same span. Its baggage is a
/// [`SharedBaggage`] owned by the trace root, so baggage items written
/// through any span of a trace are visible through all of them.
#[derive(Clone)]
pub struct Span {
    inner: Arc<SpanInner>,
    origin: Origin,
}

struct SpanInner {
    span_id: String,
    operation_name: RwLock<String>,
    baggage: SharedBaggage,
    references: Vec<Reference>,
    tags: RwLock<BTreeMap<String, String>>,
    start_time: SystemTime,
    finish_time: RwLock<Option<SystemTime>>,
}

impl Span {
    /// Starts building a span named `operation_name`.
    pub fn builder(operation_name: impl Into<String>) -> SpanBuilder {
        SpanBuilder {
            operation_name: operation_name.into(),
            span_id: None,
            references: Vec::new(),
            baggage: None,
            tags: Vec::new(),
            start_time: None,
            origin: Origin::Real,
        }
    }

    /// The process unique identifier of this span.
    pub fn span_id(&self) -> &str {
        &self.inner.span_id
    }

    /// The current operation name.
    pub fn operation_name(&self) -> String {
        read(&self.inner.operation_name).clone()
    }

    /// Renames the operation.
    pub fn set_operation_name(&self, name: impl Into<String>) {
        *write(&self.inner.operation_name) = name.into();
    }

    /// Which kind of tracer produced this handle.
    pub fn origin(&self) -> Origin {
        self.origin
    }

    /// Returns a handle to the same span tagged with a different origin.
    pub fn with_origin(&self, origin: Origin) -> Span {
        Span {
            inner: Arc::clone(&self.inner),
            origin,
        }
    }

    /// Reads a baggage item of this span's trace.
    pub fn baggage_item(&self, key: &str) -> Option<String> {
        self.inner.baggage.get(key)
    }

    /// Writes a baggage item, visible to every span sharing this trace's baggage.
    pub fn set_baggage_item(&self, key: impl Into<String>, value: impl Into<String>) {
        self.inner.baggage.set(key, value);
    }

    /// A copy of all baggage items.
    pub fn baggage_items(&self) -> Baggage {
        self.inner.baggage.snapshot()
    }

    /// The handle to this span's baggage.
    pub fn baggage(&self) -> &SharedBaggage {
        &self.inner.baggage
    }

    /// The causal references this span was created with.
    pub fn references(&self) -> &[Reference] {
        &self.inner.references
    }

    /// Sets a tag. The value is flattened with [`tags::to_tag`].
    pub fn set_tag(&self, key: impl Into<String>, value: impl Into<Value>) {
        write(&self.inner.tags).insert(key.into(), tags::to_tag(&value.into()));
    }

    /// A copy of all tags.
    pub fn tags(&self) -> BTreeMap<String, String> {
        read(&self.inner.tags).clone()
    }

    /// When the span started.
    pub fn start_time(&self) -> SystemTime {
        self.inner.start_time
    }

    /// Marks the span as finished now. Only the first call has an effect.
    pub fn finish(&self) {
        self.finish_at(SystemTime::now())
    }

    /// Marks the span as finished at `time`. Only the first call has an effect.
    pub fn finish_at(&self, time: SystemTime) {
        write(&self.inner.finish_time).get_or_insert(time);
    }

    /// When the span finished, if it has.
    pub fn finish_time(&self) -> Option<SystemTime> {
        *read(&self.inner.finish_time)
    }
}

/// Two handles are equal when they refer to the same span with the same origin.
impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) && self.origin == other.origin
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("span_id", &self.inner.span_id)
            .field("operation_name", &*read(&self.inner.operation_name))
            .field("origin", &self.origin)
            .field("references", &self.inner.references.len())
            .finish()
    }
}

/// Collects the properties of a span before it is created.
#[derive(Debug)]
pub struct SpanBuilder {
    operation_name: String,
    span_id: Option<String>,
    references: Vec<Reference>,
    baggage: Option<SharedBaggage>,
    tags: Vec<(String, Value)>,
    start_time: Option<SystemTime>,
    origin: Origin,
}

impl SpanBuilder {
    /// Uses a fixed identifier instead of generating one.
    pub fn with_span_id(self, span_id: impl Into<String>) -> Self {
        SpanBuilder {
            span_id: Some(span_id.into()),
            ..self
        }
    }

    /// Adds causal references.
    pub fn with_references(mut self, references: impl IntoIterator<Item = Reference>) -> Self {
        self.references.extend(references);
        self
    }

    /// Uses `baggage` instead of adopting a parent's or creating a new one.
    pub fn with_baggage(self, baggage: SharedBaggage) -> Self {
        SpanBuilder {
            baggage: Some(baggage),
            ..self
        }
    }

    /// Adds tags, flattened when the span is built.
    pub fn with_tags(mut self, tags: impl IntoIterator<Item = (String, Value)>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Sets an explicit start time.
    pub fn with_start_time(self, start_time: SystemTime) -> Self {
        SpanBuilder {
            start_time: Some(start_time),
            ..self
        }
    }

    /// Sets the origin of the built handle.
    pub fn with_origin(self, origin: Origin) -> Self {
        SpanBuilder { origin, ..self }
    }

    /// Creates the span.
    ///
    /// Unless baggage was given explicitly, the span adopts the baggage of
    /// the first child-of reference; without one it becomes the root of a
    /// new, empty baggage map.
    pub fn build(self) -> Span {
        let baggage = self
            .baggage
            .or_else(|| {
                self.references
                    .iter()
                    .find(|reference| reference.kind == ReferenceType::ChildOf)
                    .map(|parent| parent.span.baggage().clone())
            })
            .unwrap_or_default();

        let tags = self
            .tags
            .iter()
            .map(|(key, value)| (key.clone(), tags::to_tag(value)))
            .collect();

        Span {
            inner: Arc::new(SpanInner {
                span_id: self
                    .span_id
                    .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
                operation_name: RwLock::new(self.operation_name),
                baggage,
                references: self.references,
                tags: RwLock::new(tags),
                start_time: self.start_time.unwrap_or_else(SystemTime::now),
                finish_time: RwLock::new(None),
            }),
            origin: self.origin,
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
