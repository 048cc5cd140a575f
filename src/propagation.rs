//! Trace-context propagation across process boundaries.
//!
//! Carriers implement [`Injector`] and [`Extractor`]; the
//! [`AgentPropagator`] reads and writes the agent's decimal header format.

use std::collections::HashMap;
use std::hash::BuildHasher;

use crate::sampling::SamplingPriority;
use crate::trace::{SpanContext, SpanId, TraceId};

/// Header carrying the trace id in decimal.
pub const TRACE_ID_HEADER: &str = "x-apm-trace-id";
/// Header carrying the parent span id in decimal.
pub const PARENT_ID_HEADER: &str = "x-apm-parent-id";
/// Header carrying the sampling priority wire value.
pub const SAMPLING_PRIORITY_HEADER: &str = "x-apm-sampling-priority";

/// Interface for adding fields to an underlying carrier such as a header
/// map.
pub trait Injector {
    /// Add a key and value to the underlying data.
    fn set(&mut self, key: &str, value: String);
}

/// Interface for reading fields from an underlying carrier such as a header
/// map.
pub trait Extractor {
    /// Get a value for a key from the underlying data.
    fn get(&self, key: &str) -> Option<&str>;

    /// Collect all the keys from the underlying data.
    fn keys(&self) -> Vec<&str>;
}

impl<S: BuildHasher> Injector for HashMap<String, String, S> {
    /// Set a key and value in the HashMap.
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_lowercase(), value);
    }
}

impl<S: BuildHasher> Extractor for HashMap<String, String, S> {
    /// Get a value for a key from the HashMap.
    fn get(&self, key: &str) -> Option<&str> {
        self.get(&key.to_lowercase()).map(|value| value.as_str())
    }

    /// Collect all the keys from the HashMap.
    fn keys(&self) -> Vec<&str> {
        self.keys().map(|key| key.as_str()).collect()
    }
}

/// Injects and extracts span contexts using the agent's header format.
///
/// Extraction is tolerant: a missing or malformed parent id degrades to the
/// invalid span id so the rest of the trace is not lost, and a malformed
/// sampling priority is dropped rather than failing the extraction. Only a
/// missing or malformed trace id yields `None`.
#[derive(Clone, Debug, Default)]
pub struct AgentPropagator {
    _private: (),
}

impl AgentPropagator {
    /// Creates a new `AgentPropagator`.
    pub fn new() -> AgentPropagator {
        AgentPropagator::default()
    }

    /// Write `context` into the carrier. Invalid contexts write nothing.
    pub fn inject(&self, context: &SpanContext, carrier: &mut dyn Injector) {
        if !context.is_valid() {
            return;
        }
        carrier.set(TRACE_ID_HEADER, context.trace_id().to_string());
        carrier.set(PARENT_ID_HEADER, context.span_id().to_string());
        if let Some(priority) = context.sampling_priority() {
            carrier.set(SAMPLING_PRIORITY_HEADER, (priority as i8).to_string());
        }
    }

    /// Read a span context out of the carrier.
    pub fn extract(&self, carrier: &dyn Extractor) -> Option<SpanContext> {
        let trace_id = carrier
            .get(TRACE_ID_HEADER)?
            .parse::<u64>()
            .ok()
            .map(TraceId::from_u64)
            .filter(|id| *id != TraceId::INVALID)?;
        let span_id = carrier
            .get(PARENT_ID_HEADER)
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(SpanId::from_u64)
            .unwrap_or(SpanId::INVALID);
        let priority = carrier
            .get(SAMPLING_PRIORITY_HEADER)
            .and_then(|raw| raw.parse::<i8>().ok())
            .and_then(SamplingPriority::from_i8);
        Some(SpanContext::new(trace_id, span_id, priority))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rustfmt::skip]
    fn extract_test_data() -> Vec<(Vec<(&'static str, &'static str)>, Option<SpanContext>)> {
        vec![
            (vec![], None),
            (vec![(SAMPLING_PRIORITY_HEADER, "0")], None),
            (vec![(TRACE_ID_HEADER, "garbage")], None),
            (vec![(TRACE_ID_HEADER, "0"), (PARENT_ID_HEADER, "12")], None),
            (vec![(TRACE_ID_HEADER, "1234"), (PARENT_ID_HEADER, "garbage")], Some(SpanContext::new(TraceId::from_u64(1234), SpanId::INVALID, None))),
            (vec![(TRACE_ID_HEADER, "1234"), (PARENT_ID_HEADER, "12")], Some(SpanContext::new(TraceId::from_u64(1234), SpanId::from_u64(12), None))),
            (vec![(TRACE_ID_HEADER, "1234"), (PARENT_ID_HEADER, "12"), (SAMPLING_PRIORITY_HEADER, "0")], Some(SpanContext::new(TraceId::from_u64(1234), SpanId::from_u64(12), Some(SamplingPriority::AutoReject)))),
            (vec![(TRACE_ID_HEADER, "1234"), (PARENT_ID_HEADER, "12"), (SAMPLING_PRIORITY_HEADER, "1")], Some(SpanContext::new(TraceId::from_u64(1234), SpanId::from_u64(12), Some(SamplingPriority::AutoKeep)))),
            (vec![(TRACE_ID_HEADER, "1234"), (PARENT_ID_HEADER, "12"), (SAMPLING_PRIORITY_HEADER, "9")], Some(SpanContext::new(TraceId::from_u64(1234), SpanId::from_u64(12), None))),
        ]
    }

    #[rustfmt::skip]
    fn inject_test_data() -> Vec<(Vec<(&'static str, &'static str)>, SpanContext)> {
        vec![
            (vec![], SpanContext::INVALID),
            (vec![], SpanContext::new(TraceId::from_u64(1234), SpanId::INVALID, None)),
            (vec![(TRACE_ID_HEADER, "1234"), (PARENT_ID_HEADER, "12")], SpanContext::new(TraceId::from_u64(1234), SpanId::from_u64(12), None)),
            (vec![(TRACE_ID_HEADER, "1234"), (PARENT_ID_HEADER, "12"), (SAMPLING_PRIORITY_HEADER, "0")], SpanContext::new(TraceId::from_u64(1234), SpanId::from_u64(12), Some(SamplingPriority::AutoReject))),
            (vec![(TRACE_ID_HEADER, "1234"), (PARENT_ID_HEADER, "12"), (SAMPLING_PRIORITY_HEADER, "2")], SpanContext::new(TraceId::from_u64(1234), SpanId::from_u64(12), Some(SamplingPriority::UserKeep))),
        ]
    }

    #[test]
    fn test_extract() {
        let propagator = AgentPropagator::new();
        for (header_list, expected) in extract_test_data() {
            let carrier: HashMap<String, String> = header_list
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            assert_eq!(propagator.extract(&carrier), expected);
        }
    }

    #[test]
    fn test_inject() {
        let propagator = AgentPropagator::new();
        for (header_values, span_context) in inject_test_data() {
            let mut carrier: HashMap<String, String> = HashMap::new();
            propagator.inject(&span_context, &mut carrier);

            if header_values.is_empty() {
                assert!(carrier.is_empty());
            } else {
                for (key, value) in header_values {
                    assert_eq!(Extractor::get(&carrier, key), Some(value));
                    carrier.remove(key);
                }
                assert!(carrier.is_empty());
            }
        }
    }

    #[test]
    fn extracted_context_can_parent_even_without_span_id() {
        let mut carrier: HashMap<String, String> = HashMap::new();
        carrier.set(TRACE_ID_HEADER, "42".to_string());
        let context = AgentPropagator::new().extract(&carrier).unwrap();
        assert!(!context.is_valid());
        assert_eq!(context.trace_id(), TraceId::from_u64(42));
    }
}
