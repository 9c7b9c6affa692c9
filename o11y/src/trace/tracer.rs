use crate::propagation::{Extractor, Format, Injector};
use crate::trace::{Origin, Reference, ReferenceType, Span, TraceResult};
use crate::Value;
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;

/// A tracer shared between decorators and the global registry.
pub type SharedTracer = Arc<dyn Tracer>;

/// The capability every tracer in this project exposes.
///
/// Implementations are interchangeable: a mock, a real backend, a
/// switchable tracer and a multi tracer can all stand in for one another.
/// Errors are reported through [`TraceResult`]; decorating tracers decide
/// which of them reach the caller.
pub trait Tracer: fmt::Debug + Send + Sync {
    /// Creates a new span named `name`.
    fn start_span(&self, name: &str, options: SpanOptions) -> TraceResult<Span>;

    /// Serializes `span` into `carrier` using `format`.
    ///
    /// Formats the tracer does not understand leave the carrier untouched.
    fn inject(&self, span: &Span, format: Format, carrier: &mut dyn Injector) -> TraceResult<()>;

    /// Rebuilds a span from `carrier`.
    ///
    /// Returns `Ok(None)` for formats the tracer does not understand.
    fn extract(&self, format: Format, carrier: &dyn Extractor) -> TraceResult<Option<Span>>;

    /// Creates a new root span named `name` with default options.
    fn start(&self, name: &str) -> TraceResult<Span> {
        self.start_span(name, SpanOptions::default())
    }
}

impl<T: Tracer + ?Sized> Tracer for Arc<T> {
    fn start_span(&self, name: &str, options: SpanOptions) -> TraceResult<Span> {
        (**self).start_span(name, options)
    }

    fn inject(&self, span: &Span, format: Format, carrier: &mut dyn Injector) -> TraceResult<()> {
        (**self).inject(span, format, carrier)
    }

    fn extract(&self, format: Format, carrier: &dyn Extractor) -> TraceResult<Option<Span>> {
        (**self).extract(format, carrier)
    }
}

/// Options for [`Tracer::start_span`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpanOptions {
    /// The parent span. Treated as the first child-of reference.
    pub child_of: Option<Span>,
    /// Additional causal references.
    pub references: Vec<Reference>,
    /// Tags set on the new span.
    pub tags: Vec<(String, Value)>,
    /// Explicit start time; defaults to now.
    pub start_time: Option<SystemTime>,
}

impl SpanOptions {
    /// Options naming `parent` as the parent span.
    pub fn child_of(parent: &Span) -> Self {
        SpanOptions {
            child_of: Some(parent.clone()),
            ..Default::default()
        }
    }

    /// Adds a reference.
    pub fn with_reference(mut self, reference: Reference) -> Self {
        self.references.push(reference);
        self
    }

    /// Adds a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Sets the start time.
    pub fn with_start_time(mut self, start_time: SystemTime) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// All references in order, `child_of` first.
    pub fn all_references(&self) -> Vec<Reference> {
        self.child_of
            .iter()
            .map(Reference::child_of)
            .chain(self.references.iter().cloned())
            .collect()
    }

    /// The first child-of parent, if any.
    pub fn parent(&self) -> Option<&Span> {
        self.child_of.as_ref().or_else(|| {
            self.references
                .iter()
                .find(|reference| reference.kind() == ReferenceType::ChildOf)
                .map(Reference::span)
        })
    }

    /// Removes every parent and reference whose span does not satisfy `keep`.
    pub fn retain_parents(&mut self, mut keep: impl FnMut(&Span) -> bool) {
        if self.child_of.as_ref().is_some_and(|parent| !keep(parent)) {
            self.child_of = None;
        }
        self.references.retain(|reference| keep(reference.span()));
    }

    /// Removes every parent and reference that originated from `origin`.
    pub fn without_parents_from(mut self, origin: Origin) -> Self {
        self.retain_parents(|span| span.origin() != origin);
        self
    }

    /// Removes every parent and reference that did not originate from `origin`.
    pub fn only_parents_from(mut self, origin: Origin) -> Self {
        self.retain_parents(|span| span.origin() == origin);
        self
    }

    /// Applies these options to a span builder.
    pub fn apply(self, builder: crate::trace::SpanBuilder) -> crate::trace::SpanBuilder {
        let references = self.all_references();
        let builder = builder.with_references(references).with_tags(self.tags);
        match self.start_time {
            Some(start_time) => builder.with_start_time(start_time),
            None => builder,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_of_comes_first_in_references() {
        let parent = Span::builder("parent").build();
        let previous = Span::builder("previous").build();
        let options = SpanOptions::child_of(&parent).with_reference(Reference::follows_from(&previous));

        let references = options.all_references();
        assert_eq!(references.len(), 2);
        assert_eq!(references[0].kind(), ReferenceType::ChildOf);
        assert_eq!(references[0].span(), &parent);
        assert_eq!(options.parent(), Some(&parent));
    }

    #[test]
    fn parent_falls_back_to_child_of_reference() {
        let parent = Span::builder("parent").build();
        let options = SpanOptions::default().with_reference(Reference::child_of(&parent));
        assert_eq!(options.parent(), Some(&parent));
    }

    #[test]
    fn stripping_parents_by_origin() {
        let real = Span::builder("real").build();
        let stub = Span::builder("stub").with_origin(Origin::Stub).build();

        let options = SpanOptions::child_of(&real).with_reference(Reference::child_of(&stub));

        let stub_only = options.clone().only_parents_from(Origin::Stub);
        assert_eq!(stub_only.child_of, None);
        assert_eq!(stub_only.references.len(), 1);

        let real_only = options.without_parents_from(Origin::Stub);
        assert_eq!(real_only.child_of, Some(real));
        assert!(real_only.references.is_empty());
    }

    #[test]
    fn empty_options_equal_default() {
        let parent = Span::builder("parent").build();
        let stripped = SpanOptions::child_of(&parent).without_parents_from(Origin::Real);
        assert_eq!(stripped, SpanOptions::default());
    }
}
