//! Environment driven configuration.
//!
//! [`Config::default`] reads the process environment; every setting can be
//! overridden through [`ConfigBuilder`].
//!
//! | variable | setting |
//! |---|---|
//! | `TRACE_AGENT_CLIENT` | [`TraceBackend`]: unset or empty disables tracing, `mock` selects the in-memory tracer, anything else names an agent |
//! | `LOG_LEVEL` | `tracing_subscriber` filter directive, `info` by default |
//! | `ENVIRONMENT` | deployment environment |
//! | `RELEASE_CHANNEL` | release channel |
//! | `AWS_REGION` | region |
//! | `PURPOSE` | what the process is for |
//! | `METRICS_PREFIX` | prefix for metric names |
use std::collections::BTreeMap;
use std::env;
use std::fmt;

pub(crate) const TRACE_AGENT_CLIENT: &str = "TRACE_AGENT_CLIENT";
pub(crate) const LOG_LEVEL: &str = "LOG_LEVEL";
pub(crate) const LOG_LEVEL_DEFAULT: &str = "info";
pub(crate) const ENVIRONMENT: &str = "ENVIRONMENT";
pub(crate) const RELEASE_CHANNEL: &str = "RELEASE_CHANNEL";
pub(crate) const AWS_REGION: &str = "AWS_REGION";
pub(crate) const PURPOSE: &str = "PURPOSE";
pub(crate) const METRICS_PREFIX: &str = "METRICS_PREFIX";
pub(crate) const SERVICE_NAME_DEFAULT: &str = "unknown_service";

/// Which tracer backs the instrumentation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum TraceBackend {
    /// Tracing is off; spans come from a no-op tracer.
    #[default]
    Disabled,
    /// The in-memory mock tracer.
    Mock,
    /// A tracing agent registered under this name.
    Agent(String),
}

impl TraceBackend {
    /// Parses a `TRACE_AGENT_CLIENT` value.
    ///
    /// ```
    /// use o11y_sdk::TraceBackend;
    ///
    /// assert_eq!(TraceBackend::parse(""), TraceBackend::Disabled);
    /// assert_eq!(TraceBackend::parse("mock"), TraceBackend::Mock);
    /// assert_eq!(TraceBackend::parse("datadog"), TraceBackend::Agent("datadog".into()));
    /// ```
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "" => TraceBackend::Disabled,
            "mock" => TraceBackend::Mock,
            agent => TraceBackend::Agent(agent.to_string()),
        }
    }
}

impl fmt::Display for TraceBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceBackend::Disabled => f.write_str("disabled"),
            TraceBackend::Mock => f.write_str("mock"),
            TraceBackend::Agent(name) => f.write_str(name),
        }
    }
}

/// Instrumentation settings.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Name of the instrumented service.
    pub service_name: String,
    /// Which tracer to build.
    pub trace_backend: TraceBackend,
    /// Filter directive for the log subscriber.
    pub log_level: String,
    /// Deployment environment.
    pub environment: Option<String>,
    /// Release channel.
    pub release_channel: Option<String>,
    /// Region.
    pub region: Option<String>,
    /// What the process is for.
    pub purpose: Option<String>,
    /// Prefix for metric names.
    pub metrics_prefix: Option<String>,
}

impl Default for Config {
    /// Reads the process environment.
    fn default() -> Self {
        ConfigBuilder::default().build()
    }
}

impl Config {
    /// Create a new [`ConfigBuilder`] seeded from the process environment.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Fields attached to every log record and error report: `purpose`,
    /// `environment`, `region` and `channel`, when set.
    pub fn static_fields(&self) -> BTreeMap<String, String> {
        [
            ("purpose", &self.purpose),
            ("environment", &self.environment),
            ("region", &self.region),
            ("channel", &self.release_channel),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|value| (key.to_string(), value)))
        .collect()
    }
}

/// A builder for creating [`Config`] instances.
#[derive(Clone, Debug)]
pub struct ConfigBuilder {
    service_name: String,
    trace_backend: TraceBackend,
    log_level: String,
    environment: Option<String>,
    release_channel: Option<String>,
    region: Option<String>,
    purpose: Option<String>,
    metrics_prefix: Option<String>,
}

impl Default for ConfigBuilder {
    /// Create a new [`ConfigBuilder`] initialized with the default values
    /// overridden by environment variables.
    fn default() -> Self {
        ConfigBuilder {
            service_name: SERVICE_NAME_DEFAULT.to_string(),
            trace_backend: TraceBackend::Disabled,
            log_level: LOG_LEVEL_DEFAULT.to_string(),
            environment: None,
            release_channel: None,
            region: None,
            purpose: None,
            metrics_prefix: None,
        }
        .init_from_env_vars()
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl ConfigBuilder {
    /// Sets the service name.
    pub fn with_service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    /// Sets the trace backend.
    pub fn with_trace_backend(mut self, trace_backend: TraceBackend) -> Self {
        self.trace_backend = trace_backend;
        self
    }

    /// Sets the log filter directive.
    pub fn with_log_level(mut self, log_level: impl Into<String>) -> Self {
        self.log_level = log_level.into();
        self
    }

    /// Sets the deployment environment.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// Sets the release channel.
    pub fn with_release_channel(mut self, release_channel: impl Into<String>) -> Self {
        self.release_channel = Some(release_channel.into());
        self
    }

    /// Sets the region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets the purpose.
    pub fn with_purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }

    /// Sets the metric prefix.
    pub fn with_metrics_prefix(mut self, metrics_prefix: impl Into<String>) -> Self {
        self.metrics_prefix = Some(metrics_prefix.into());
        self
    }

    /// Builds the [`Config`].
    pub fn build(self) -> Config {
        Config {
            service_name: self.service_name,
            trace_backend: self.trace_backend,
            log_level: self.log_level,
            environment: self.environment,
            release_channel: self.release_channel,
            region: self.region,
            purpose: self.purpose,
            metrics_prefix: self.metrics_prefix,
        }
    }

    fn init_from_env_vars(mut self) -> Self {
        if let Ok(client) = env::var(TRACE_AGENT_CLIENT) {
            self.trace_backend = TraceBackend::parse(&client);
        }

        if let Some(log_level) = non_empty_var(LOG_LEVEL) {
            self.log_level = log_level;
        }

        self.environment = non_empty_var(ENVIRONMENT).or(self.environment);
        self.release_channel = non_empty_var(RELEASE_CHANNEL).or(self.release_channel);
        self.region = non_empty_var(AWS_REGION).or(self.region);
        self.purpose = non_empty_var(PURPOSE).or(self.purpose);
        self.metrics_prefix = non_empty_var(METRICS_PREFIX).or(self.metrics_prefix);

        self
    }
}
