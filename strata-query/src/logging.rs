//! Logging setup driven by environment variables.
//!
//! Library code only emits `tracing` events. Binaries and tests that want to
//! see them call [`init`] once, which installs a `tracing-subscriber`
//! (feature `tracing-subscriber`) configured from:
//!
//! - `STRATA_DEBUG=true|1|yes` - log at `debug`
//! - `STRATA_LOG_LEVEL=trace|debug|info|warn|error` - explicit level
//! - `STRATA_LOG_FORMAT=json|compact|pretty` - output format (default: json)
//!
//! Nothing is installed when neither `STRATA_DEBUG` nor `STRATA_LOG_LEVEL`
//! is set, so an application can bring its own subscriber.
//!
//! ```rust,no_run
//! strata_query::logging::init();
//! ```

use std::env;
use std::sync::Once;

static INIT: Once = Once::new();

/// Output format of the installed subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Single-line human readable output.
    Compact,
    /// Multi-line human readable output.
    Pretty,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Whether logging was requested at all.
    pub enabled: bool,
    /// Level applied to the strata crates.
    pub level: &'static str,
    /// Output format.
    pub format: LogFormat,
}

fn truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl LogSettings {
    /// Resolve from raw variable values.
    pub fn resolve(debug: Option<&str>, level: Option<&str>, format: Option<&str>) -> Self {
        let debug = debug.is_some_and(truthy);
        let fallback = if debug { "debug" } else { "warn" };
        let level_name = level.map(str::to_lowercase);
        let level = match level_name.as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => fallback,
        };

        Self {
            enabled: debug || level_name.is_some(),
            level,
            format: format.map(LogFormat::parse).unwrap_or_default(),
        }
    }

    /// Resolve from `STRATA_DEBUG`, `STRATA_LOG_LEVEL` and `STRATA_LOG_FORMAT`.
    pub fn from_env() -> Self {
        let debug = env::var("STRATA_DEBUG").ok();
        let level = env::var("STRATA_LOG_LEVEL").ok();
        let format = env::var("STRATA_LOG_FORMAT").ok();
        Self::resolve(debug.as_deref(), level.as_deref(), format.as_deref())
    }

    /// The `EnvFilter` directive for these settings.
    pub fn directive(&self) -> String {
        ["strata", "strata_query", "strata_sqlite", "strata_s3migrate"]
            .iter()
            .map(|target| format!("{}={}", target, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Whether debug logging was requested through `STRATA_DEBUG`.
pub fn is_debug_enabled() -> bool {
    env::var("STRATA_DEBUG").is_ok_and(|v| truthy(&v))
}

/// Install the subscriber described by the environment. Later calls are no-ops.
pub fn init() {
    init_with(LogSettings::from_env());
}

/// Install a subscriber for explicit settings. Later calls are no-ops.
pub fn init_with(settings: LogSettings) {
    INIT.call_once(|| {
        if !settings.enabled {
            return;
        }

        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter =
                EnvFilter::try_new(settings.directive()).unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);
            let installed = match settings.format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = settings.level,
                    format = ?settings.format,
                    "strata logging initialized"
                );
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_without_variables() {
        let settings = LogSettings::resolve(None, None, None);
        assert!(!settings.enabled);
        assert_eq!(settings.level, "warn");
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn test_debug_flag() {
        let settings = LogSettings::resolve(Some("YES"), None, Some("compact"));
        assert!(settings.enabled);
        assert_eq!(settings.level, "debug");
        assert_eq!(settings.format, LogFormat::Compact);
    }

    #[test]
    fn test_explicit_level_wins() {
        let settings = LogSettings::resolve(Some("1"), Some("Trace"), None);
        assert_eq!(settings.level, "trace");

        let unknown = LogSettings::resolve(None, Some("loud"), None);
        assert!(unknown.enabled);
        assert_eq!(unknown.level, "warn");
    }

    #[test]
    fn test_directive_covers_workspace_crates() {
        let settings = LogSettings::resolve(None, Some("info"), None);
        assert_eq!(
            settings.directive(),
            "strata=info,strata_query=info,strata_sqlite=info,strata_s3migrate=info"
        );
    }
}
