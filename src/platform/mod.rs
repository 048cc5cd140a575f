//! Process-wide platform services configured during initialization.
//!
//! The profiler and the runtime metrics collector are process singletons:
//! whichever tracer instance initializes first starts them, and they stay
//! up for the process lifetime.

mod metrics;
mod profiler;
mod startup_log;

pub use metrics::RuntimeMetrics;
pub use profiler::Profiler;
pub(crate) use startup_log::startup_log;

use once_cell::sync::Lazy;
use std::sync::RwLock;

use crate::config::Config;
use crate::error::Error;
use crate::log;

static PROFILER: Profiler = Profiler::new();
static METRICS: RuntimeMetrics = RuntimeMetrics::new();

static SERVICE: Lazy<RwLock<Option<String>>> = Lazy::new(|| RwLock::new(None));

/// Record the process-wide identity the platform services report under.
pub(crate) fn configure(config: &Config) -> Result<(), Error> {
    let mut service = SERVICE.write().expect("platform state lock poisoned");
    *service = Some(config.service.clone());
    log::debug(format!("platform configured for service {}", config.service));
    Ok(())
}

/// Check that this environment can actually run the tracer.
pub(crate) fn validate(config: &Config) -> Result<(), Error> {
    match config.agent_url.scheme() {
        "http" | "https" | "unix" => Ok(()),
        scheme => Err(Error::Unsupported(format!(
            "agent url scheme {scheme} is not supported"
        ))),
    }
}

pub(crate) fn service_name() -> Option<String> {
    SERVICE.read().expect("platform state lock poisoned").clone()
}

/// The process-wide profiler service.
pub fn profiler() -> &'static Profiler {
    &PROFILER
}

/// The process-wide runtime metrics collector.
pub fn metrics() -> &'static RuntimeMetrics {
    &METRICS
}
