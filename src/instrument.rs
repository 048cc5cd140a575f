//! Auto-instrumentation of third-party libraries.
//!
//! Applications register plugin configuration through the facade's
//! `use_plugin` at any point; the registry is applied once a functional
//! tracer exists and [`Instrumenter::enable`] runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use crate::config::Config;
use crate::log;

/// Libraries with built-in instrumentation support.
const KNOWN_PLUGINS: &[&str] = &[
    "actix-web",
    "hyper",
    "lapin",
    "mongodb",
    "rdkafka",
    "redis",
    "reqwest",
    "sqlx",
    "tide",
    "tonic",
];

/// Per-plugin configuration recorded by [`Instrumenter::use_plugin`].
#[derive(Clone, Debug)]
pub struct PluginConfig {
    /// Whether the plugin is patched at all.
    pub enabled: bool,
    /// Override the service name for spans this plugin creates.
    pub service: Option<String>,
    /// Tags added to every span this plugin creates.
    pub tags: Vec<(String, String)>,
}

impl Default for PluginConfig {
    fn default() -> Self {
        PluginConfig {
            enabled: true,
            service: None,
            tags: Vec::new(),
        }
    }
}

/// Records plugin configuration and patches the registered libraries once a
/// functional tracer exists.
pub struct Instrumenter {
    plugins: RwLock<HashMap<String, PluginConfig>>,
    enabled: AtomicBool,
}

impl Instrumenter {
    pub(crate) fn new() -> Instrumenter {
        Instrumenter {
            plugins: RwLock::new(HashMap::new()),
            enabled: AtomicBool::new(false),
        }
    }

    /// Record configuration for a plugin. Unknown plugin names are logged
    /// and ignored. May run before or after [`enable`]; registrations made
    /// after activation are patched immediately.
    ///
    /// [`enable`]: Instrumenter::enable
    pub(crate) fn use_plugin(&self, name: &str, config: PluginConfig) {
        if !KNOWN_PLUGINS.contains(&name) {
            log::warn(format!("unknown instrumentation plugin: {name}"));
            return;
        }
        let patch_now = self.is_enabled() && config.enabled;
        self.plugins
            .write()
            .expect("plugin registry lock poisoned")
            .insert(name.to_string(), config);
        if patch_now {
            log::debug(format!("patching {name}"));
        }
    }

    /// Activate the registry. Runs once, after the real delegate has been
    /// constructed.
    pub(crate) fn enable(&self, config: &Config) {
        if self.enabled.swap(true, Ordering::SeqCst) {
            return;
        }
        let plugins = self.plugins.read().expect("plugin registry lock poisoned");
        for (name, plugin) in plugins.iter() {
            if plugin.enabled {
                log::debug(format!(
                    "patching {name} (service {})",
                    plugin.service.as_deref().unwrap_or(&config.service)
                ));
            }
        }
    }

    /// Whether the registry has been activated.
    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Names of the registered, enabled plugins, sorted for stable output.
    pub(crate) fn loaded(&self) -> Vec<String> {
        let plugins = self.plugins.read().expect("plugin registry lock poisoned");
        let mut names: Vec<String> = plugins
            .iter()
            .filter(|(_, plugin)| plugin.enabled)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TracerOptions;

    #[test]
    fn records_known_plugins_only() {
        let instrumenter = Instrumenter::new();
        instrumenter.use_plugin("hyper", PluginConfig::default());
        instrumenter.use_plugin("left-pad", PluginConfig::default());
        assert_eq!(instrumenter.loaded(), vec!["hyper".to_string()]);
    }

    #[test]
    fn disabled_plugins_are_not_loaded() {
        let instrumenter = Instrumenter::new();
        instrumenter.use_plugin(
            "redis",
            PluginConfig {
                enabled: false,
                ..PluginConfig::default()
            },
        );
        assert!(instrumenter.loaded().is_empty());
    }

    #[test]
    fn enable_runs_once() {
        let config = Config::new(TracerOptions::default()).unwrap();
        let instrumenter = Instrumenter::new();
        instrumenter.use_plugin("sqlx", PluginConfig::default());
        assert!(!instrumenter.is_enabled());
        instrumenter.enable(&config);
        instrumenter.enable(&config);
        assert!(instrumenter.is_enabled());
    }

    #[test]
    fn registration_after_enable_is_kept() {
        let config = Config::new(TracerOptions::default()).unwrap();
        let instrumenter = Instrumenter::new();
        instrumenter.enable(&config);
        instrumenter.use_plugin("tonic", PluginConfig::default());
        assert_eq!(instrumenter.loaded(), vec!["tonic".to_string()]);
    }
}
