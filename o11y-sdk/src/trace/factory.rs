//! Builds the process tracer from configuration.
use crate::config::{Config, TraceBackend};
use crate::metrics::Metrics;
use crate::trace::{MockTracer, MultiTracer, SliConfig, SliTracer};
use o11y::global;
use o11y::propagation::{Extractor, Format, Injector};
use o11y::trace::{NoopTracer, SharedTracer, Span, SpanOptions, TraceResult, Tracer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Builds the tracer for a named agent.
pub type AgentConstructor = Arc<dyn Fn(&Config) -> TraceResult<SharedTracer> + Send + Sync>;

/// The tracer assembled by a [`TracerFactory`].
#[derive(Clone, Debug)]
pub enum FactoryTracer {
    /// Tracing is disabled.
    Disabled(NoopTracer),
    /// The in-memory mock tracer.
    Mock(MockTracer),
    /// A registered agent.
    Agent(SharedTracer),
    /// The selected tracer with the SLI tracer observing it.
    Multi(MultiTracer),
}

impl FactoryTracer {
    /// The mock tracer, if this is one.
    pub fn as_mock(&self) -> Option<&MockTracer> {
        match self {
            FactoryTracer::Mock(tracer) => Some(tracer),
            _ => None,
        }
    }

    /// The multi tracer, if SLI tracking was requested.
    pub fn as_multi(&self) -> Option<&MultiTracer> {
        match self {
            FactoryTracer::Multi(tracer) => Some(tracer),
            _ => None,
        }
    }

    /// Returns `true` for the disabled variant.
    pub fn is_disabled(&self) -> bool {
        matches!(self, FactoryTracer::Disabled(_))
    }

    /// Converts into a shared tracer.
    pub fn into_shared(self) -> SharedTracer {
        match self {
            FactoryTracer::Disabled(tracer) => Arc::new(tracer),
            FactoryTracer::Mock(tracer) => Arc::new(tracer),
            FactoryTracer::Agent(tracer) => tracer,
            FactoryTracer::Multi(tracer) => Arc::new(tracer),
        }
    }

    fn as_tracer(&self) -> &dyn Tracer {
        match self {
            FactoryTracer::Disabled(tracer) => tracer,
            FactoryTracer::Mock(tracer) => tracer,
            FactoryTracer::Agent(tracer) => tracer.as_ref(),
            FactoryTracer::Multi(tracer) => tracer,
        }
    }
}

impl Tracer for FactoryTracer {
    fn start_span(&self, name: &str, options: SpanOptions) -> TraceResult<Span> {
        self.as_tracer().start_span(name, options)
    }

    fn inject(&self, span: &Span, format: Format, carrier: &mut dyn Injector) -> TraceResult<()> {
        self.as_tracer().inject(span, format, carrier)
    }

    fn extract(&self, format: Format, carrier: &dyn Extractor) -> TraceResult<Option<Span>> {
        self.as_tracer().extract(format, carrier)
    }
}

/// Assembles a tracer from a [`Config`].
///
/// * [`TraceBackend::Mock`] yields a [`MockTracer`].
/// * [`TraceBackend::Agent`] yields the tracer built by the constructor
///   registered under that name. An unknown name, or a constructor that
///   fails, falls back to a disabled tracer.
/// * [`TraceBackend::Disabled`] yields a [`NoopTracer`].
///
/// When SLI tracking is requested the selected tracer becomes the primary of
/// a [`MultiTracer`] with an [`SliTracer`] as its only additional tracer.
///
/// ```
/// use o11y_sdk::trace::{SliConfig, SliOperation, TracerFactory};
/// use o11y_sdk::{Config, TraceBackend};
///
/// let config = Config::builder().with_trace_backend(TraceBackend::Mock).build();
/// let slis = SliConfig::new().track("my_operation", SliOperation::new());
///
/// let tracer = TracerFactory::new().create(&config, Some(&slis));
/// let multi = tracer.as_multi().unwrap();
/// assert_eq!(multi.additional_tracers().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct TracerFactory {
    agents: BTreeMap<String, AgentConstructor>,
    metrics: Metrics,
}

impl fmt::Debug for TracerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TracerFactory")
            .field("agents", &self.agents.keys().collect::<Vec<_>>())
            .field("metrics", &self.metrics)
            .finish()
    }
}

impl TracerFactory {
    /// A factory with no agents and inactive SLI metrics.
    pub fn new() -> Self {
        TracerFactory::default()
    }

    /// Registers the constructor for the agent `name`.
    pub fn with_agent<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&Config) -> TraceResult<SharedTracer> + Send + Sync + 'static,
    {
        self.agents.insert(name.into(), Arc::new(constructor));
        self
    }

    /// The metrics client SLI tracers emit through.
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = metrics;
        self
    }

    /// Returns `true` if an agent is registered under `name`.
    pub fn has_agent(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// Builds the tracer for `config`.
    pub fn create(&self, config: &Config, slis: Option<&SliConfig>) -> FactoryTracer {
        let tracer = self.select(config);

        match slis {
            Some(slis) => {
                let sli = SliTracer::new(slis.clone(), self.metrics.clone());
                FactoryTracer::Multi(
                    MultiTracer::new(tracer.into_shared()).with_additional_tracer(Arc::new(sli)),
                )
            }
            None => tracer,
        }
    }

    fn select(&self, config: &Config) -> FactoryTracer {
        match &config.trace_backend {
            TraceBackend::Disabled => FactoryTracer::Disabled(NoopTracer::new()),
            TraceBackend::Mock => FactoryTracer::Mock(MockTracer::new()),
            TraceBackend::Agent(name) => match self.agents.get(name) {
                Some(constructor) => match constructor(config) {
                    Ok(tracer) => FactoryTracer::Agent(tracer),
                    Err(err) => {
                        global::handle_error(err);
                        FactoryTracer::Disabled(NoopTracer::new())
                    }
                },
                None => {
                    o11y::o11y_warn!(name: "unknown_trace_agent", agent = name.as_str());
                    FactoryTracer::Disabled(NoopTracer::new())
                }
            },
        }
    }
}
