//! # Logging
//!
//! [`TracingLogger`] is the [`Logger`] handed to components such as the
//! switchable tracer. It emits `tracing` events, so whatever subscriber the
//! process installed decides where they go.
//!
//! [`init_subscriber`] installs the subscriber this SDK expects: a `fmt`
//! layer filtered by `LOG_LEVEL`, and an [`ErrorReportingLayer`] with its own
//! minimum level. The filter applies to the `fmt` layer only, so lowering the
//! log output never hides errors from the tracking service.
use crate::error::Error;
use crate::error_reporting::{ErrorReporter, ErrorReportingLayer};
use crate::Config;
use o11y::logs::{Logger, Severity};
use std::collections::BTreeMap;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Name of the event field carrying the logger name.
pub const LOGGER_FIELD: &str = "logger";

/// Name of the event field carrying the rendered logger fields.
pub const CONTEXT_FIELD: &str = "context";

/// A [`Logger`] writing `tracing` events.
///
/// Every event carries a `logger` field with the logger's name and a
/// `context` field rendering the logger's fields as `key=value` pairs.
/// [`ErrorReportingLayer`] splits `context` back into separate fields, so
/// a child logger's fields reach reports as extra data and tags.
///
/// ```
/// use o11y::logs::Logger;
/// use o11y_sdk::logs::TracingLogger;
///
/// let logger = TracingLogger::new("api").child([("request_id", "42")]);
/// assert_eq!(logger.context(), "request_id=42");
/// logger.info("handled");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TracingLogger {
    name: String,
    fields: BTreeMap<String, String>,
}

impl TracingLogger {
    /// A logger named `name` with no fields.
    pub fn new(name: impl Into<String>) -> Self {
        TracingLogger {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// A logger with the same name and fields plus `fields`. Keys already
    /// present are overwritten.
    pub fn child<I, K, V>(&self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut child = self.clone();
        child
            .fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        child
    }

    /// The logger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The logger fields.
    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// The fields rendered as space separated `key=value` pairs.
    ///
    /// Keys and values that are empty or contain whitespace, `=`, `"` or
    /// `\` are written in double quotes with `"` and `\` backslash escaped,
    /// so [`parse_context`] recovers the fields exactly.
    pub fn context(&self) -> String {
        let mut context = String::new();
        for (key, value) in &self.fields {
            if !context.is_empty() {
                context.push(' ');
            }
            push_token(&mut context, key);
            context.push('=');
            push_token(&mut context, value);
        }
        context
    }
}

impl Logger for TracingLogger {
    fn log(&self, severity: Severity, message: &str) {
        let context = self.context();
        let logger = self.name.as_str();
        match severity {
            Severity::Error => {
                tracing::error!(logger = logger, context = context.as_str(), "{}", message)
            }
            Severity::Warn => {
                tracing::warn!(logger = logger, context = context.as_str(), "{}", message)
            }
            Severity::Info => {
                tracing::info!(logger = logger, context = context.as_str(), "{}", message)
            }
            Severity::Debug => {
                tracing::debug!(logger = logger, context = context.as_str(), "{}", message)
            }
        }
    }
}

fn needs_quotes(token: &str) -> bool {
    token.is_empty()
        || token
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '=' | '"' | '\\'))
}

fn push_token(out: &mut String, token: &str) {
    if !needs_quotes(token) {
        out.push_str(token);
        return;
    }
    out.push('"');
    for c in token.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
}

fn read_token(chars: &mut Peekable<Chars<'_>>, stop_at_equals: bool) -> String {
    let mut token = String::new();
    if chars.next_if_eq(&'"').is_some() {
        while let Some(c) = chars.next() {
            match c {
                '"' => break,
                '\\' => token.extend(chars.next()),
                c => token.push(c),
            }
        }
        return token;
    }
    while let Some(c) = chars.next_if(|c| !c.is_whitespace() && !(stop_at_equals && *c == '=')) {
        token.push(c);
    }
    token
}

/// Splits a [`TracingLogger::context`] rendering back into its fields.
///
/// Pairs without `=` are skipped.
///
/// ```
/// use o11y_sdk::logs::{parse_context, TracingLogger};
///
/// let logger = TracingLogger::new("api").child([("user", "Ada Lovelace"), ("feature", "billing")]);
/// assert_eq!(logger.context(), r#"feature=billing user="Ada Lovelace""#);
/// assert_eq!(
///     parse_context(&logger.context()),
///     [("feature".to_string(), "billing".to_string()), ("user".to_string(), "Ada Lovelace".to_string())]
/// );
/// ```
pub fn parse_context(context: &str) -> Vec<(String, String)> {
    let mut fields = Vec::new();
    let mut chars = context.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            return fields;
        }
        let key = read_token(&mut chars, true);
        if chars.next_if_eq(&'=').is_some() {
            fields.push((key, read_token(&mut chars, false)));
        }
    }
}

/// Builds the filter for `directive`.
pub fn env_filter(directive: &str) -> Result<EnvFilter, Error> {
    EnvFilter::try_new(directive).map_err(|err| Error::InvalidLogLevel {
        directive: directive.to_string(),
        message: err.to_string(),
    })
}

/// Installs the process-wide subscriber described in the module docs.
///
/// Returns `Ok(false)` without changing anything when a subscriber is
/// already installed.
pub fn init_subscriber(config: &Config, reporter: Arc<dyn ErrorReporter>) -> Result<bool, Error> {
    let filter = env_filter(&config.log_level)?;
    let reporting = ErrorReportingLayer::new(reporter).with_static_fields(config.static_fields());

    let installed = tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(filter))
        .with(reporting)
        .try_init()
        .is_ok();

    if installed {
        o11y::o11y_debug!(name: "log_subscriber_installed", level = config.log_level.as_str());
    }
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_reporting::InMemoryErrorReporter;
    use rstest::rstest;
    use tracing_subscriber::prelude::*;

    #[test]
    fn child_loggers_extend_fields() {
        let logger = TracingLogger::new("test");
        let child = logger.child([("child", "child")]);
        let grandchild = child.child([("child", "grandchild"), ("parent", "child")]);

        assert!(logger.fields().is_empty());
        assert_eq!(child.context(), "child=child");
        assert_eq!(grandchild.context(), "child=grandchild parent=child");
        assert_eq!(grandchild.name(), "test");
    }

    #[test]
    fn events_carry_name_and_context() {
        let reporter = InMemoryErrorReporter::default();
        let subscriber = tracing_subscriber::registry()
            .with(ErrorReportingLayer::new(Arc::new(reporter.clone())));

        let logger = TracingLogger::new("test").child([("child", "child")]);
        tracing::subscriber::with_default(subscriber, || {
            logger.error("test");
            logger.info("not reported");
        });

        let messages = reporter.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message.as_deref(), Some("test"));
        assert_eq!(messages[0].extra["logger"], "test");
        assert_eq!(messages[0].extra["child"], "child");
    }

    #[test]
    fn nested_child_fields_reach_reports() {
        let reporter = InMemoryErrorReporter::default();
        let subscriber = tracing_subscriber::registry()
            .with(ErrorReportingLayer::new(Arc::new(reporter.clone())));

        let logger = TracingLogger::new("test")
            .child([("child", "child"), ("log_type", "job")])
            .child([("child", "grandchild"), ("feature", "billing")]);
        tracing::subscriber::with_default(subscriber, || logger.error("test"));

        let report = &reporter.messages()[0];
        assert_eq!(report.extra.get("child").map(String::as_str), Some("grandchild"));
        assert_eq!(report.tags["feature"], "billing");
        assert_eq!(report.tags["log_type"], "job");
    }

    #[rstest]
    #[case(&[("a", "1"), ("b", "2")], "a=1 b=2")]
    #[case(&[("msg", "two words")], r#"msg="two words""#)]
    #[case(&[("expr", "x=1")], r#"expr="x=1""#)]
    #[case(&[("quote", r#"say "hi""#)], r#"quote="say \"hi\"""#)]
    #[case(&[("path", r"C:\tmp")], r#"path="C:\\tmp""#)]
    #[case(&[("empty", "")], r#"empty="""#)]
    #[case(&[("odd key", "v")], r#""odd key"=v"#)]
    fn context_renders_and_parses_back(#[case] fields: &[(&str, &str)], #[case] rendered: &str) {
        let logger = TracingLogger::new("test").child(fields.iter().copied());
        assert_eq!(logger.context(), rendered);

        let expected: Vec<(String, String)> = logger
            .fields()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_eq!(parse_context(rendered), expected);
    }

    #[test]
    fn parse_context_skips_malformed_pairs() {
        assert!(parse_context("").is_empty());
        assert_eq!(
            parse_context("  stray a=1   b=\"unterminated"),
            [
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "unterminated".to_string()),
            ]
        );
    }

    #[test]
    fn rejects_invalid_log_levels() {
        assert!(env_filter("info").is_ok());
        assert!(env_filter("o11y_sdk=debug,warn").is_ok());
        assert!(matches!(
            env_filter("o11y_sdk=loudest"),
            Err(Error::InvalidLogLevel { .. })
        ));
    }
}
