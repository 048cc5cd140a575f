//! Tracer configuration.
//!
//! [`Config`] is the immutable snapshot the rest of the crate reads. It is
//! built from [`TracerOptions`], with explicit options taking precedence over
//! `APM_*` environment variables, which in turn take precedence over
//! defaults. Malformed environment values are logged and fall back; invalid
//! explicit options fail construction.

use std::env;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::error::ConfigError;
use crate::log::{self, LogLevel, LogSink};

pub(crate) const DEFAULT_AGENT_URL: &str = "http://127.0.0.1:8126";

const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(2000);

/// Caller-supplied tracer options.
///
/// Every option is optional; unset options resolve from the environment and
/// then from defaults when [`Config::new`] runs.
///
/// # Examples
///
/// ```
/// use apm_trace::TracerOptions;
///
/// let options = TracerOptions::default()
///     .with_service("checkout")
///     .with_env("staging")
///     .with_sample_rate(0.25)
///     .with_tag("team", "payments");
/// ```
#[derive(Clone, Default)]
pub struct TracerOptions {
    enabled: Option<bool>,
    debug: Option<bool>,
    log_level: Option<String>,
    logger: Option<Arc<dyn LogSink>>,
    service: Option<String>,
    env: Option<String>,
    version: Option<String>,
    agent_url: Option<String>,
    sample_rate: Option<f64>,
    flush_interval: Option<Duration>,
    runtime_metrics: Option<bool>,
    analytics: Option<bool>,
    tags: Vec<(String, String)>,
    raw_tags: Option<String>,
    experimental: Experimental,
}

impl TracerOptions {
    /// Create an empty option set; everything resolves from the environment
    /// or defaults.
    pub fn new() -> TracerOptions {
        TracerOptions::default()
    }

    /// Whether tracing is enabled at all. Disabled tracers still configure
    /// logging and the platform but never record spans.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    /// Force debug-level internal logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Internal log level name (`error`, `warn`, `info` or `debug`).
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = Some(level.into());
        self
    }

    /// Custom sink for the tracer's internal log records.
    pub fn with_logger(mut self, logger: Arc<dyn LogSink>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Service name spans are reported under.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Deployment environment, e.g. `production`.
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    /// Application version tag.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Trace agent endpoint.
    pub fn with_agent_url(mut self, url: impl Into<String>) -> Self {
        self.agent_url = Some(url.into());
        self
    }

    /// Trace sample rate in `[0.0, 1.0]`.
    pub fn with_sample_rate(mut self, rate: f64) -> Self {
        self.sample_rate = Some(rate);
        self
    }

    /// Interval between trace flushes.
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = Some(interval);
        self
    }

    /// Collect runtime metrics alongside traces.
    pub fn with_runtime_metrics(mut self, enabled: bool) -> Self {
        self.runtime_metrics = Some(enabled);
        self
    }

    /// Enable App Analytics event sampling.
    pub fn with_analytics(mut self, enabled: bool) -> Self {
        self.analytics = Some(enabled);
        self
    }

    /// Add a tag applied to every span.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Tags in `key:value,key:value` form, as accepted by `APM_TAGS`.
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.raw_tags = Some(tags.into());
        self
    }

    /// Expose trace metadata to real-user-monitoring via
    /// [`Tracer::rum_data`].
    ///
    /// [`Tracer::rum_data`]: crate::Tracer::rum_data
    pub fn with_rum_data(mut self, enabled: bool) -> Self {
        self.experimental.enable_rum_data = enabled;
        self
    }
}

/// Experimental, unstable settings.
#[derive(Clone, Copy, Debug, Default)]
pub struct Experimental {
    pub(crate) enable_rum_data: bool,
}

/// Immutable, validated configuration snapshot.
///
/// Built once per [`Tracer::init`] attempt and shared by reference with the
/// platform adapter, the delegate constructor and the instrumentation
/// manager.
///
/// [`Tracer::init`]: crate::Tracer::init
#[derive(Clone)]
pub struct Config {
    pub(crate) enabled: bool,
    pub(crate) debug: bool,
    pub(crate) log_level: LogLevel,
    pub(crate) logger: Option<Arc<dyn LogSink>>,
    pub(crate) service: String,
    pub(crate) env: Option<String>,
    pub(crate) version: Option<String>,
    pub(crate) agent_url: Url,
    pub(crate) sample_rate: f64,
    pub(crate) flush_interval: Duration,
    pub(crate) runtime_metrics: bool,
    pub(crate) analytics: bool,
    pub(crate) tags: Vec<(String, String)>,
    pub(crate) experimental: Experimental,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("enabled", &self.enabled)
            .field("debug", &self.debug)
            .field("log_level", &self.log_level)
            .field("logger", &self.logger.as_ref().map(|_| "<log sink>"))
            .field("service", &self.service)
            .field("env", &self.env)
            .field("version", &self.version)
            .field("agent_url", &self.agent_url)
            .field("sample_rate", &self.sample_rate)
            .field("flush_interval", &self.flush_interval)
            .field("runtime_metrics", &self.runtime_metrics)
            .field("analytics", &self.analytics)
            .field("tags", &self.tags)
            .field("experimental", &self.experimental)
            .finish()
    }
}

impl Config {
    /// Resolve and validate a full configuration from the given options.
    pub fn new(options: TracerOptions) -> Result<Config, ConfigError> {
        let enabled = options
            .enabled
            .or_else(|| env_bool("APM_TRACE_ENABLED"))
            .unwrap_or(true);
        let debug = options
            .debug
            .or_else(|| env_bool("APM_TRACE_DEBUG"))
            .unwrap_or(false);

        let log_level = match options.log_level {
            Some(raw) => raw.parse()?,
            None => env_log_level("APM_LOG_LEVEL").unwrap_or(LogLevel::Error),
        };

        let service = options
            .service
            .or_else(|| env_string("APM_SERVICE"))
            .unwrap_or_else(default_service);

        let agent_url = match options.agent_url {
            Some(raw) => Url::parse(&raw)?,
            None => env_agent_url("APM_TRACE_AGENT_URL"),
        };

        let sample_rate = match options.sample_rate {
            Some(rate) if !(0.0..=1.0).contains(&rate) => {
                return Err(ConfigError::InvalidSampleRate(rate));
            }
            Some(rate) => rate,
            None => env_sample_rate("APM_TRACE_SAMPLE_RATE").unwrap_or(1.0),
        };

        let flush_interval = options.flush_interval.unwrap_or(DEFAULT_FLUSH_INTERVAL);
        if flush_interval.is_zero() {
            return Err(ConfigError::ZeroFlushInterval);
        }

        let mut tags = env_tags("APM_TAGS");
        if let Some(raw) = options.raw_tags {
            for entry in split_tag_list(&raw) {
                tags.push(parse_tag(entry).ok_or_else(|| {
                    ConfigError::MalformedTag(entry.to_string())
                })?);
            }
        }
        tags.extend(options.tags);

        Ok(Config {
            enabled,
            debug,
            log_level,
            logger: options.logger,
            service,
            env: options.env.or_else(|| env_string("APM_ENV")),
            version: options.version.or_else(|| env_string("APM_VERSION")),
            agent_url,
            sample_rate,
            flush_interval,
            runtime_metrics: options
                .runtime_metrics
                .or_else(|| env_bool("APM_RUNTIME_METRICS_ENABLED"))
                .unwrap_or(false),
            analytics: options
                .analytics
                .or_else(|| env_bool("APM_TRACE_ANALYTICS_ENABLED"))
                .unwrap_or(false),
            tags,
            experimental: options.experimental,
        })
    }

    /// The service name spans are reported under.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Whether span recording is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// The resolved trace agent endpoint.
    pub fn agent_url(&self) -> &Url {
        &self.agent_url
    }
}

fn default_service() -> String {
    env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "unnamed-rust-service".to_string())
}

fn default_agent_url() -> Url {
    Url::parse(DEFAULT_AGENT_URL).expect("default agent url is valid")
}

fn env_string(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    let value = env::var(key).ok()?;
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => {
            log::warn(format!("ignoring {key}={value}: expected a boolean"));
            None
        }
    }
}

fn env_log_level(key: &str) -> Option<LogLevel> {
    let value = env::var(key).ok()?;
    match value.parse() {
        Ok(level) => Some(level),
        Err(_) => {
            log::warn(format!("ignoring {key}={value}: unknown log level"));
            None
        }
    }
}

fn env_sample_rate(key: &str) -> Option<f64> {
    let value = env::var(key).ok()?;
    match value.parse::<f64>() {
        Ok(rate) if (0.0..=1.0).contains(&rate) => Some(rate),
        _ => {
            log::warn(format!(
                "ignoring {key}={value}: expected a rate in [0.0, 1.0]"
            ));
            None
        }
    }
}

fn env_agent_url(key: &str) -> Url {
    match env::var(key) {
        Ok(raw) => Url::parse(&raw).unwrap_or_else(|err| {
            log::warn(format!("ignoring {key}={raw}: {err}"));
            default_agent_url()
        }),
        Err(_) => default_agent_url(),
    }
}

fn env_tags(key: &str) -> Vec<(String, String)> {
    let Ok(raw) = env::var(key) else {
        return Vec::new();
    };
    split_tag_list(&raw)
        .filter_map(|entry| {
            let tag = parse_tag(entry);
            if tag.is_none() {
                log::warn(format!("ignoring malformed tag in {key}: {entry}"));
            }
            tag
        })
        .collect()
}

fn split_tag_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}

fn parse_tag(entry: &str) -> Option<(String, String)> {
    let (key, value) = entry.split_once(':')?;
    if key.is_empty() {
        return None;
    }
    Some((key.trim().to_string(), value.trim().to_string()))
}
