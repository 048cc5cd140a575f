//! No-op tracer.
//!
//! This implementation is bound to the facade before initialization and
//! whenever initialization fails. Spans it produces carry the invalid
//! context and never record, but a valid parent context still propagates so
//! instrumented code behaves the same either way.

use super::{Scope, Span, SpanContext, SpanOptions, TraceId, TracerCore};
use crate::propagation::{Extractor, Injector};

/// An inert tracer; every operation is a side-effect-free stub.
#[derive(Clone, Debug, Default)]
pub struct NoopTracer {
    _private: (),
}

impl NoopTracer {
    /// Create a new no-op tracer.
    pub fn new() -> NoopTracer {
        NoopTracer::default()
    }
}

impl TracerCore for NoopTracer {
    /// Returns a non-recording span. An explicit or scope-active parent's
    /// context is propagated; otherwise the span carries the invalid
    /// context.
    fn start_span(&self, _name: &str, options: &SpanOptions) -> Span {
        let parent = options
            .child_of
            .clone()
            .or_else(|| Scope::new().active().map(|span| span.context()))
            .filter(|context| context.trace_id() != TraceId::INVALID);
        Span::noop(parent.unwrap_or(SpanContext::INVALID))
    }

    /// Writes nothing.
    fn inject(&self, _context: &SpanContext, _carrier: &mut dyn Injector) {}

    /// Extracts nothing.
    fn extract(&self, _carrier: &dyn Extractor) -> Option<SpanContext> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::SpanId;
    use std::collections::HashMap;

    fn valid_context() -> SpanContext {
        SpanContext::new(TraceId::from_u64(42), SpanId::from_u64(42), None)
    }

    #[test]
    fn noop_tracer_defaults_to_invalid_span() {
        let tracer = NoopTracer::new();
        let span = tracer.start_span("foo", &SpanOptions::default());
        assert!(!span.context().is_valid());
        assert!(!span.is_recording());
    }

    #[test]
    fn noop_tracer_propagates_explicit_parent_context() {
        let tracer = NoopTracer::new();
        let span = tracer.start_span("foo", &SpanOptions::new().child_of(valid_context()));
        assert_eq!(span.context(), valid_context());
        assert!(!span.is_recording());
    }

    #[test]
    fn noop_tracer_propagates_scope_active_context() {
        let tracer = NoopTracer::new();
        let parent = Span::noop(valid_context());
        let scope = Scope::new();
        let span = scope.activate(&parent, || tracer.start_span("foo", &SpanOptions::default()));
        assert_eq!(span.context().trace_id(), TraceId::from_u64(42));
    }

    #[test]
    fn noop_tracer_injects_and_extracts_nothing() {
        let tracer = NoopTracer::new();
        let mut carrier: HashMap<String, String> = HashMap::new();
        tracer.inject(&valid_context(), &mut carrier);
        assert!(carrier.is_empty());
        carrier.insert("x-apm-trace-id".to_string(), "42".to_string());
        assert!(tracer.extract(&carrier).is_none());
    }
}
