#![allow(unused_macros)]
//!
//! **Note**: The `o11y_info!`, `o11y_warn!`, `o11y_debug!` and `o11y_error!`
//! macros are meant for diagnostics **inside this project's tracers, metric
//! clients and reporters**, i.e. for problems the observability layer
//! recovers from by itself. Application logging goes through a
//! [`Logger`](crate::logs::Logger).
//!
//! Events are emitted through `tracing` with the calling crate as target
//! when the `internal-logs` feature is enabled. Under `cfg(test)` they are
//! also printed to stdout, which shows up with `--nocapture`.

#[doc(hidden)]
#[macro_export]
macro_rules! __o11y_log {
    ($level:ident, $label:literal, name: $name:expr $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::$level!(name: $name, target: env!("CARGO_PKG_NAME"), name = $name);
        }

        #[cfg(test)]
        {
            print!("{}: name={}\n", $label, $name);
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = $name;
        }
    };
    ($level:ident, $label:literal, name: $name:expr, $($key:ident = $value:expr),+ $(,)?) => {
        #[cfg(feature = "internal-logs")]
        {
            $crate::_private::$level!(
                name: $name,
                target: env!("CARGO_PKG_NAME"),
                name = $name,
                $($key = $value),+
            );
        }

        #[cfg(test)]
        {
            print!("{}: name={}", $label, $name);
            $(
                print!(", {}={}", stringify!($key), $value);
            )+
            print!("\n");
        }

        #[cfg(all(not(feature = "internal-logs"), not(test)))]
        {
            let _ = ($name, $($value),+);
        }
    };
}

/// Logs an informational event about the observability layer itself.
///
/// # Example:
/// ```rust
/// use o11y::o11y_info;
/// o11y_info!(name: "instrumentation_initialized", backend = "mock");
/// ```
#[macro_export]
macro_rules! o11y_info {
    ($($args:tt)+) => {
        $crate::__o11y_log!(info, "o11y_info", $($args)+)
    };
}

/// Logs a recovered, unexpected condition.
///
/// # Example:
/// ```rust
/// use o11y::o11y_warn;
/// o11y_warn!(name: "unknown_trace_agent", agent = "zipkin");
/// ```
#[macro_export]
macro_rules! o11y_warn {
    ($($args:tt)+) => {
        $crate::__o11y_log!(warn, "o11y_warn", $($args)+)
    };
}

/// Logs fine grained diagnostics.
///
/// # Example:
/// ```rust
/// use o11y::o11y_debug;
/// o11y_debug!(name: "span_routed", route = "stub");
/// ```
#[macro_export]
macro_rules! o11y_debug {
    ($($args:tt)+) => {
        $crate::__o11y_log!(debug, "o11y_debug", $($args)+)
    };
}

/// Logs a failure that was isolated from the caller.
///
/// # Example:
/// ```rust
/// use o11y::o11y_error;
/// o11y_error!(name: "observer_failed", error = "timeout");
/// ```
#[macro_export]
macro_rules! o11y_error {
    ($($args:tt)+) => {
        $crate::__o11y_log!(error, "o11y_error", $($args)+)
    };
}
