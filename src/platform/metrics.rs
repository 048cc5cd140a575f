use std::sync::atomic::{AtomicBool, Ordering};

use crate::log;

/// Runtime metrics collector.
///
/// Started during initialization when `runtime_metrics` is set. Collection
/// itself is delegated to the agent side; this service only tracks whether
/// the collector is up.
#[derive(Debug)]
pub struct RuntimeMetrics {
    started: AtomicBool,
}

impl RuntimeMetrics {
    pub(crate) const fn new() -> RuntimeMetrics {
        RuntimeMetrics {
            started: AtomicBool::new(false),
        }
    }

    /// Start the collector. Subsequent calls are no-ops.
    pub fn start(&self) {
        if !self.started.swap(true, Ordering::SeqCst) {
            match super::service_name() {
                Some(service) => {
                    log::debug(format!("runtime metrics collector started for {service}"))
                }
                None => log::debug("runtime metrics collector started"),
            }
        }
    }

    /// Whether the collector has been started in this process.
    pub fn started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }
}
