//! The composition root.
use crate::error::Error;
use crate::error_reporting::{ErrorReporter, NoopErrorReporter};
use crate::logs::{self, TracingLogger};
use crate::metrics::Metrics;
use crate::trace::{
    EnabledPredicate, FactoryTracer, MockTracer, SliConfig, SwitchableTracer, TracerFactory,
};
use crate::Config;
use o11y::global;
use o11y::metrics::MetricsBackend;
use o11y::trace::SharedTracer;
use o11y::BoxError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static GLOBAL_INSTALLED: AtomicBool = AtomicBool::new(false);

/// The logger, metrics clients, error reporter and tracer of a process.
///
/// ```
/// use o11y::trace::Tracer;
/// use o11y_sdk::{Config, Instrumentation, TraceBackend};
///
/// # fn main() -> o11y::trace::TraceResult<()> {
/// let config = Config::builder()
///     .with_service_name("api")
///     .with_trace_backend(TraceBackend::Mock)
///     .build();
/// let instrumentation = Instrumentation::builder(config)
///     .with_tracer_enabled(|| Ok(true))
///     .build();
///
/// let span = instrumentation.tracer().start("handle_request")?;
/// span.finish();
/// assert_eq!(instrumentation.mock_tracer().unwrap().finished_spans().len(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Instrumentation {
    config: Config,
    logger: TracingLogger,
    metrics: Metrics,
    std_metrics: Metrics,
    error_reporter: Arc<dyn ErrorReporter>,
    factory_tracer: FactoryTracer,
    tracer: SharedTracer,
}

impl fmt::Debug for Instrumentation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instrumentation")
            .field("config", &self.config)
            .field("logger", &self.logger)
            .field("error_reporter", &self.error_reporter)
            .field("tracer", &self.tracer)
            .finish()
    }
}

impl Instrumentation {
    /// Starts assembling the instrumentation for `config`.
    pub fn builder(config: Config) -> InstrumentationBuilder {
        InstrumentationBuilder {
            config,
            factory: TracerFactory::new(),
            metrics_backend: None,
            error_reporter: None,
            is_tracer_enabled: None,
            slis: None,
        }
    }

    /// The configuration this was built from.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The root logger, carrying the static fields of the configuration.
    pub fn logger(&self) -> &TracingLogger {
        &self.logger
    }

    /// The metrics client, with the configured prefix.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// A metrics client on the same backend without the prefix.
    pub fn std_metrics(&self) -> &Metrics {
        &self.std_metrics
    }

    /// The error reporter.
    pub fn error_reporter(&self) -> &Arc<dyn ErrorReporter> {
        &self.error_reporter
    }

    /// The tracer application code should use.
    pub fn tracer(&self) -> &SharedTracer {
        &self.tracer
    }

    /// The tracer the factory built, before any switching.
    pub fn factory_tracer(&self) -> &FactoryTracer {
        &self.factory_tracer
    }

    /// The mock tracer, when the mock backend was selected without SLI
    /// tracking.
    pub fn mock_tracer(&self) -> Option<&MockTracer> {
        self.factory_tracer.as_mock()
    }

    /// Installs [`tracer`](Self::tracer) as the global tracer.
    ///
    /// Only the first call in a process has an effect; it returns `true`.
    pub fn install_global(&self) -> bool {
        if GLOBAL_INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return false;
        }
        global::set_tracer(self.tracer.clone());
        o11y::o11y_info!(
            name: "global_tracer_installed",
            trace_backend = self.config.trace_backend.to_string()
        );
        true
    }

    /// Installs the process-wide log subscriber, see
    /// [`logs::init_subscriber`].
    pub fn init_subscriber(&self) -> Result<bool, Error> {
        logs::init_subscriber(&self.config, self.error_reporter.clone())
    }
}

/// Builder for [`Instrumentation`].
pub struct InstrumentationBuilder {
    config: Config,
    factory: TracerFactory,
    metrics_backend: Option<Arc<dyn MetricsBackend>>,
    error_reporter: Option<Arc<dyn ErrorReporter>>,
    is_tracer_enabled: Option<EnabledPredicate>,
    slis: Option<SliConfig>,
}

impl fmt::Debug for InstrumentationBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstrumentationBuilder")
            .field("config", &self.config)
            .field("factory", &self.factory)
            .field("slis", &self.slis)
            .finish()
    }
}

impl InstrumentationBuilder {
    /// Registers a tracing agent, see [`TracerFactory::with_agent`].
    pub fn with_agent<F>(mut self, name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn(&Config) -> o11y::trace::TraceResult<SharedTracer> + Send + Sync + 'static,
    {
        self.factory = self.factory.with_agent(name, constructor);
        self
    }

    /// The backend both metrics clients emit to. Without one they are
    /// inactive.
    pub fn with_metrics_backend(mut self, backend: Arc<dyn MetricsBackend>) -> Self {
        self.metrics_backend = Some(backend);
        self
    }

    /// The error reporter. Defaults to a [`NoopErrorReporter`].
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = Some(reporter);
        self
    }

    /// Makes tracing switchable: the factory tracer is only used while
    /// `is_enabled` returns `Ok(true)`.
    pub fn with_tracer_enabled<F>(mut self, is_enabled: F) -> Self
    where
        F: Fn() -> Result<bool, BoxError> + Send + Sync + 'static,
    {
        self.is_tracer_enabled = Some(Arc::new(is_enabled));
        self
    }

    /// Requests SLI tracking.
    pub fn with_slis(mut self, slis: SliConfig) -> Self {
        self.slis = Some(slis);
        self
    }

    /// Assembles the instrumentation.
    pub fn build(self) -> Instrumentation {
        let config = self.config;

        let (metrics, std_metrics) = match &self.metrics_backend {
            Some(backend) => (
                Metrics::with_prefix(
                    backend.clone(),
                    config.metrics_prefix.clone().unwrap_or_default(),
                ),
                Metrics::new(backend.clone()),
            ),
            None => (Metrics::inactive(), Metrics::inactive()),
        };

        let logger = TracingLogger::new(config.service_name.clone()).child(config.static_fields());
        let error_reporter = self
            .error_reporter
            .unwrap_or_else(|| Arc::new(NoopErrorReporter::new()));

        let factory_tracer = self
            .factory
            .with_metrics(std_metrics.clone())
            .create(&config, self.slis.as_ref());

        let tracer: SharedTracer = match self.is_tracer_enabled {
            Some(is_enabled) => Arc::new(
                SwitchableTracer::builder(factory_tracer.clone().into_shared())
                    .with_shared_enabled(is_enabled)
                    .with_logger(Arc::new(logger.child([("component", "tracer")])))
                    .build(),
            ),
            None => factory_tracer.clone().into_shared(),
        };

        o11y::o11y_debug!(
            name: "instrumentation_built",
            trace_backend = config.trace_backend.to_string()
        );

        Instrumentation {
            config,
            logger,
            metrics,
            std_metrics,
            error_reporter,
            factory_tracer,
            tracer,
        }
    }
}
