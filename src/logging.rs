//! Logging setup and the injected [`Logger`].
//!
//! Events go through `tracing`; [`init`] installs the subscriber once at
//! startup. Components never reach for a global logger: they hold a
//! [`Logger`] handed to them at construction, which carries the immutable
//! [`LogConfig`] and decides what to emit.

use crate::config::{LogConfig, LogLevel};
use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `log.level`. Fails when a global
/// subscriber is already installed.
pub fn init(config: &LogConfig) -> Result<(), TryInitError> {
    let default_directive = if config.enabled {
        config.level.as_str()
    } else {
        "off"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let fmt = tracing_subscriber::fmt::layer().with_target(false);
    let registry = tracing_subscriber::registry().with(filter);

    if config.show_timestamp {
        registry.with(fmt).try_init()
    } else {
        registry.with(fmt.without_time()).try_init()
    }
}

/// Messages of every error in the `source()` chain, outermost first.
pub fn source_chain(err: &dyn Error) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut current = err.source();
    while let Some(cause) = current {
        chain.push(cause.to_string());
        current = cause.source();
    }
    chain
}

/// Config-gated logging handle, cheap to clone.
#[derive(Debug, Clone)]
pub struct Logger {
    config: Arc<LogConfig>,
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(LogConfig::default())
    }
}

impl Logger {
    pub fn new(config: LogConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// A logger that emits nothing.
    pub fn disabled() -> Self {
        Self::new(LogConfig {
            enabled: false,
            ..LogConfig::default()
        })
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.config.enabled && level <= self.config.level
    }

    /// Log an error with its context pairs. The source chain is attached
    /// when `show_stack` is on.
    pub fn error(&self, message: &str, err: &dyn Error, context: &[(&str, &str)]) {
        if !self.enabled(LogLevel::Error) {
            return;
        }
        let context = format_context(context);
        if self.config.show_stack {
            let stack = source_chain(err).join(" <- ");
            tracing::error!(error = %err, context = %context, stack = %stack, "{message}");
        } else {
            tracing::error!(error = %err, context = %context, "{message}");
        }
    }

    pub fn warn(&self, message: &str) {
        if self.enabled(LogLevel::Warn) {
            tracing::warn!("{message}");
        }
    }

    pub fn info(&self, message: &str) {
        if self.enabled(LogLevel::Info) {
            tracing::info!("{message}");
        }
    }

    pub fn debug(&self, message: &str) {
        if self.enabled(LogLevel::Debug) {
            tracing::debug!("{message}");
        }
    }

    /// One access-log line per handled request.
    pub fn request(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        if !self.enabled(LogLevel::Info) {
            return;
        }
        let millis = elapsed.as_secs_f64() * 1000.0;
        if status >= 500 {
            tracing::warn!(status, "{method} {path} ({millis:.1}ms)");
        } else {
            tracing::info!(status, "{method} {path} ({millis:.1}ms)");
        }
    }

    /// Run `f`, logging its duration at debug level.
    pub fn timed<T>(&self, label: &str, f: impl FnOnce() -> T) -> T {
        if !self.enabled(LogLevel::Debug) {
            return f();
        }
        let start = Instant::now();
        let out = f();
        tracing::debug!("{label}: {:.1}ms", start.elapsed().as_secs_f64() * 1000.0);
        out
    }
}

fn format_context(context: &[(&str, &str)]) -> String {
    context
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Outer(Inner);
    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "outer failed")
        }
    }
    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "inner cause")
        }
    }
    impl Error for Inner {}
    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn source_chain_walks_causes() {
        let chain = source_chain(&Outer(Inner));
        assert_eq!(chain, vec!["outer failed", "inner cause"]);
    }

    #[test]
    fn level_gating() {
        let logger = Logger::new(LogConfig {
            level: LogLevel::Warn,
            ..LogConfig::default()
        });
        assert!(logger.enabled(LogLevel::Error));
        assert!(logger.enabled(LogLevel::Warn));
        assert!(!logger.enabled(LogLevel::Info));
        assert!(!logger.enabled(LogLevel::Debug));
    }

    #[test]
    fn disabled_logger_emits_nothing() {
        let logger = Logger::disabled();
        assert!(!logger.enabled(LogLevel::Error));
    }

    #[test]
    fn timed_returns_closure_value() {
        let logger = Logger::new(LogConfig {
            level: LogLevel::Debug,
            ..LogConfig::default()
        });
        assert_eq!(logger.timed("sum", || 2 + 2), 4);
    }

    #[test]
    fn second_init_reports_existing_subscriber() {
        let config = LogConfig {
            show_timestamp: false,
            ..LogConfig::default()
        };
        let _ = init(&config);
        assert!(init(&config).is_err());
    }

    #[test]
    fn context_pairs_formatted() {
        assert_eq!(
            format_context(&[("slug", "a"), ("kind", "blog")]),
            "slug=a kind=blog"
        );
    }
}
