//! Trace sampling.
//!
//! The sampling decision is made once per trace, when its root span is
//! created; child spans inherit it through the scope or the propagated
//! context.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::trace::TraceId;

/// Priority attached to a trace's sampling decision, using the agent wire
/// values. User decisions take precedence over automatic ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(i8)]
pub enum SamplingPriority {
    /// The user asked for the trace to be dropped.
    UserReject = -1,
    /// The sampler dropped the trace.
    AutoReject = 0,
    /// The sampler kept the trace.
    AutoKeep = 1,
    /// The user asked for the trace to be kept.
    UserKeep = 2,
}

impl SamplingPriority {
    pub(crate) fn from_i8(value: i8) -> Option<SamplingPriority> {
        match value {
            -1 => Some(SamplingPriority::UserReject),
            0 => Some(SamplingPriority::AutoReject),
            1 => Some(SamplingPriority::AutoKeep),
            2 => Some(SamplingPriority::UserKeep),
            _ => None,
        }
    }

    /// Whether the trace is kept.
    pub fn is_keep(self) -> bool {
        matches!(self, SamplingPriority::AutoKeep | SamplingPriority::UserKeep)
    }
}

const KNUTH_FACTOR: u64 = 1_111_111_111_111_111_111;

/// Deterministic rate sampler.
///
/// The decision is a pure function of the trace id, so every span of a trace
/// agrees without coordination.
#[derive(Clone, Debug)]
pub(crate) struct RateSampler {
    rate: f64,
}

impl RateSampler {
    pub(crate) fn new(rate: f64) -> RateSampler {
        RateSampler { rate }
    }

    pub(crate) fn sample(&self, trace_id: TraceId) -> bool {
        if self.rate >= 1.0 {
            return true;
        }
        if self.rate <= 0.0 {
            return false;
        }
        let scaled = trace_id.to_u64().wrapping_mul(KNUTH_FACTOR);
        (scaled as f64) < self.rate * (u64::MAX as f64)
    }
}

static ANALYTICS: AtomicBool = AtomicBool::new(false);

/// Enable App Analytics event sampling for the process.
pub(crate) fn enable_analytics() {
    ANALYTICS.store(true, Ordering::Relaxed);
}

/// Whether App Analytics event sampling is on.
pub fn analytics_enabled() -> bool {
    ANALYTICS.load(Ordering::Relaxed)
}
