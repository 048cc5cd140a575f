use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::json;

use crate::config::Config;
use crate::log;

/// Emit the one-line JSON startup record.
///
/// Runs once per successful initialization, after the instrumentation
/// manager has been enabled, so the record reflects the integrations that
/// were actually loaded.
pub(crate) fn startup_log(config: &Config, integrations: &[String]) {
    let date = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    let tags: BTreeMap<&str, &str> = config
        .tags
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()))
        .collect();

    let record = json!({
        "date": date,
        "lang": "rust",
        "version": env!("CARGO_PKG_VERSION"),
        "os_name": std::env::consts::OS,
        "arch": std::env::consts::ARCH,
        "pid": std::process::id(),
        "enabled": config.enabled,
        "service": config.service,
        "env": config.env,
        "app_version": config.version,
        "agent_url": config.agent_url.as_str(),
        "sample_rate": config.sample_rate,
        "flush_interval_ms": config.flush_interval.as_millis() as u64,
        "debug": config.debug,
        "log_level": config.log_level.to_string(),
        "runtime_metrics_enabled": config.runtime_metrics,
        "analytics_enabled": config.analytics,
        "tags": tags,
        "integrations_loaded": integrations,
    });

    log::info(format!("APM TRACER CONFIGURATION - {record}"));
}
