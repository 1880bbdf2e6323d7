//! Logging initialization using `tracing` and `tracing-subscriber`.
//!
//! Configuration is static and controlled by:
//! - `RUST_LOG`: log level filtering (standard [`EnvFilter`] syntax)
//! - `DELLING_LOG_FORMAT`: output format, see [`LogFormat`]

use std::str::FromStr;

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Environment variable selecting the [`LogFormat`].
pub const LOG_FORMAT_ENV: &str = "DELLING_LOG_FORMAT";

/// Log output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line logs, optimized for short line lengths.
    Compact,
    /// No timestamps, targets or ANSI colors. Useful under journald, which adds its own.
    Bare,
    /// Multi-line logs for local development.
    Pretty,
    /// Newline-delimited JSON.
    Json,
}

impl LogFormat {
    /// Install the global subscriber for this format.
    pub fn init(self, env_filter: EnvFilter) {
        let builder = tracing_subscriber::fmt().with_env_filter(env_filter);
        let dispatch = match self {
            Self::Compact => builder.compact().finish().into(),
            Self::Pretty => builder.pretty().finish().into(),
            Self::Bare => builder
                .compact()
                .without_time()
                .with_target(false)
                .with_ansi(false)
                .finish()
                .into(),
            Self::Json => builder.json().finish().into(),
        };
        // Not using `SubscriberInitExt::init()`: it would install its own `LogTracer`,
        // which conflicts with `init_log_bridge`.
        tracing::dispatcher::set_global_default(dispatch)
            .expect("failed to set global default subscriber");
    }
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Compact
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "bare" => Ok(Self::Bare),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid log format '{s}'. Valid options: json, compact, bare or pretty"
            )),
        }
    }
}

/// Forward `log` records (sqlx, actix) into `tracing`.
fn init_log_bridge(env_filter: &EnvFilter) {
    let mut log_builder = tracing_log::LogTracer::builder()
        .with_interest_cache(tracing_log::InterestCacheConfig::default());
    if let Some(Some(max_level)) = env_filter.max_level_hint().map(LevelFilter::into_level) {
        let max_level = match max_level {
            Level::TRACE => log::LevelFilter::Trace,
            Level::DEBUG => log::LevelFilter::Debug,
            Level::INFO => log::LevelFilter::Info,
            Level::WARN => log::LevelFilter::Warn,
            Level::ERROR => log::LevelFilter::Error,
        };
        log_builder = log_builder.with_max_level(max_level);
    }
    log_builder
        .init()
        .expect("failed to initialize log -> tracing bridge: LogTracer already set");
}

/// Initialize the global tracing subscriber for the given filter and format.
///
/// An invalid filter falls back to `debug`, an invalid format to [`LogFormat::default`].
/// Both problems are reported on stderr because logging is not up yet.
pub fn init_tracing(filter: &str, format: Option<String>) {
    let env_filter = EnvFilter::from_str(filter).unwrap_or_else(|_| {
        eprintln!("Warning: Invalid filter string '{filter}' passed, using 'debug' instead");
        EnvFilter::new("debug")
    });

    let log_format = format
        .and_then(|s| {
            s.parse::<LogFormat>()
                .map_err(|e| {
                    eprintln!("Warning: {e}");
                    eprintln!(
                        "Falling back to default format ({:?})",
                        LogFormat::default()
                    );
                })
                .ok()
        })
        .unwrap_or_default();

    init_log_bridge(&env_filter);
    log_format.init(env_filter);
}

/// Make the `delling_mbtiles` log level follow the level given for `replacement`
/// (e.g. `delling_map=`) unless `RUST_LOG` sets it explicitly.
#[must_use]
pub fn ensure_mbtiles_log_level_matches(
    env_filter: Option<String>,
    replacement: &'static str,
) -> String {
    let Some(rust_log) = env_filter else {
        return format!("{replacement}info,delling_mbtiles=info");
    };
    if rust_log.contains(replacement) && !rust_log.contains("delling_mbtiles=") {
        if let Some(level) = rust_log
            .split(',')
            .find_map(|s| s.strip_prefix(replacement))
        {
            return format!("{rust_log},delling_mbtiles={level}");
        }
    }
    rust_log
}
