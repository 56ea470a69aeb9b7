//! Logging setup for docseed.
//!
//! All crates log through the `tracing` macros. Nothing is printed unless a
//! subscriber is installed, either by the host application or by [`init`]
//! (requires the `tracing-subscriber` feature).
//!
//! # Environment Variables
//!
//! - `DOCSEED_DEBUG=true|1|yes` - Enable debug logging
//! - `DOCSEED_LOG_LEVEL=trace|debug|info|warn|error` - Set a specific level
//! - `DOCSEED_LOG_FORMAT=json|pretty|compact` - Output format (default: json)
//!
//! ```rust,no_run
//! docseed_core::logging::init();
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
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "compact" => Self::Compact,
            _ => Self::Json,
        }
    }

    /// Name of the format.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
            Self::Compact => "compact",
        }
    }
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// Whether logging was requested at all.
    pub enabled: bool,
    /// Level directive applied to the docseed crates.
    pub level: &'static str,
    /// Output format.
    pub format: LogFormat,
}

impl LogSettings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through a variable lookup function.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let debug = lookup("DOCSEED_DEBUG").is_some_and(|v| is_truthy(&v));
        let requested = lookup("DOCSEED_LOG_LEVEL");
        let fallback = if debug { "debug" } else { "warn" };
        let level = requested
            .as_deref()
            .map(|level| match level.to_lowercase().as_str() {
                "trace" => "trace",
                "debug" => "debug",
                "info" => "info",
                "warn" => "warn",
                "error" => "error",
                _ => fallback,
            })
            .unwrap_or(fallback);
        let format = lookup("DOCSEED_LOG_FORMAT")
            .map(|f| LogFormat::parse(&f))
            .unwrap_or_default();

        Self {
            enabled: debug || requested.is_some(),
            level,
            format,
        }
    }

    /// Settings for an explicit level, regardless of the environment.
    pub fn with_level(level: &'static str) -> Self {
        Self {
            enabled: true,
            level,
            format: LogFormat::Json,
        }
    }

    /// `EnvFilter` directive covering the docseed crates.
    pub fn directive(&self) -> String {
        let level = self.level;
        format!("docseed={level},docseed_core={level},docseed_mongodb={level},docseed_cli={level}")
    }
}

/// Whether `DOCSEED_DEBUG` enables debug logging.
pub fn is_debug_enabled() -> bool {
    env::var("DOCSEED_DEBUG").is_ok_and(|v| is_truthy(&v))
}

/// Interpret a boolean-ish environment value.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

/// Initialize logging from the environment.
///
/// Subsequent calls are no-ops. Does nothing unless `DOCSEED_DEBUG` or
/// `DOCSEED_LOG_LEVEL` is set.
pub fn init() {
    init_with(LogSettings::from_env());
}

/// Initialize logging with explicit settings.
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

            // try_init: the host may already have installed a subscriber.
            let installed = match settings.format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
            };

            if installed.is_ok() {
                tracing::info!(
                    level = settings.level,
                    format = settings.format.as_str(),
                    "docseed logging initialized"
                );
            }
        }
    });
}
