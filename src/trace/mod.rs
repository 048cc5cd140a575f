//! Tracing API: ids, span context, spans and the tracer capability set.

mod agent;
mod noop;
mod scope;
mod span;

pub use agent::AgentTracer;
pub use noop::NoopTracer;
pub use scope::{Scope, ScopeGuard};
pub use span::Span;

use rand::Rng;
use std::fmt;

use crate::config::Config;
use crate::propagation::{Extractor, Injector};
use crate::sampling::SamplingPriority;

/// A 64-bit trace identifier. `0` is invalid.
///
/// Displays in the decimal form used on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TraceId(u64);

impl TraceId {
    /// The invalid trace id.
    pub const INVALID: TraceId = TraceId(0);

    /// Construct a trace id from its representation as a `u64`.
    pub fn from_u64(id: u64) -> TraceId {
        TraceId(id)
    }

    /// The underlying `u64` value.
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A 64-bit span identifier. `0` is invalid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpanId(u64);

impl SpanId {
    /// The invalid span id.
    pub const INVALID: SpanId = SpanId(0);

    /// Construct a span id from its representation as a `u64`.
    pub fn from_u64(id: u64) -> SpanId {
        SpanId(id)
    }

    /// The underlying `u64` value.
    pub fn to_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The portion of a span that propagates across process boundaries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpanContext {
    trace_id: TraceId,
    span_id: SpanId,
    sampling_priority: Option<SamplingPriority>,
}

impl SpanContext {
    /// The invalid span context, carried by spans of an inert tracer.
    pub const INVALID: SpanContext = SpanContext {
        trace_id: TraceId::INVALID,
        span_id: SpanId::INVALID,
        sampling_priority: None,
    };

    /// Create a new span context.
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        sampling_priority: Option<SamplingPriority>,
    ) -> SpanContext {
        SpanContext {
            trace_id,
            span_id,
            sampling_priority,
        }
    }

    /// The trace this span belongs to.
    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    /// This span's own id.
    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    /// The trace's sampling decision, if one has been made.
    pub fn sampling_priority(&self) -> Option<SamplingPriority> {
        self.sampling_priority
    }

    /// Whether both ids are present. Contexts with a valid trace id but an
    /// invalid span id can still parent new spans.
    pub fn is_valid(&self) -> bool {
        self.trace_id != TraceId::INVALID && self.span_id != SpanId::INVALID
    }
}

/// Generates random nonzero 64-bit ids.
#[derive(Clone, Debug, Default)]
pub(crate) struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    pub(crate) fn trace_id(&self) -> TraceId {
        TraceId(next_nonzero())
    }

    pub(crate) fn span_id(&self) -> SpanId {
        SpanId(next_nonzero())
    }
}

fn next_nonzero() -> u64 {
    let mut rng = rand::thread_rng();
    loop {
        let id: u64 = rng.gen();
        if id != 0 {
            return id;
        }
    }
}

/// Options for starting a span.
#[derive(Clone, Debug, Default)]
pub struct SpanOptions {
    pub(crate) service: Option<String>,
    pub(crate) resource: Option<String>,
    pub(crate) span_type: Option<String>,
    pub(crate) tags: Vec<(String, String)>,
    pub(crate) child_of: Option<SpanContext>,
}

impl SpanOptions {
    /// Create an empty option set.
    pub fn new() -> SpanOptions {
        SpanOptions::default()
    }

    /// Override the service name for this span.
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// The resource this span covers, e.g. an endpoint or a query. Defaults
    /// to the span name.
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// The span type, e.g. `web` or `db`.
    pub fn with_span_type(mut self, span_type: impl Into<String>) -> Self {
        self.span_type = Some(span_type.into());
        self
    }

    /// Add a tag to the span.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.push((key.into(), value.into()));
        self
    }

    /// Explicit parent context, taking precedence over the scope's active
    /// span.
    pub fn child_of(mut self, parent: SpanContext) -> Self {
        self.child_of = Some(parent);
        self
    }
}

/// The capability set a tracer delegate implements.
///
/// Object safe so the facade can hold either the inert or the functional
/// implementation behind a single reference and forward branch-free.
pub trait TracerCore: Send + Sync {
    /// Start a new span.
    fn start_span(&self, name: &str, options: &SpanOptions) -> Span;

    /// Write `context` into a carrier.
    fn inject(&self, context: &SpanContext, carrier: &mut dyn Injector);

    /// Read a span context out of a carrier.
    fn extract(&self, carrier: &dyn Extractor) -> Option<SpanContext>;

    /// Handle to the active-span scope.
    fn scope(&self) -> Scope {
        Scope::new()
    }

    /// The span currently active in the scope, if any.
    fn current_span(&self) -> Option<Span> {
        Scope::new().active()
    }

    /// The configuration the delegate was built from; `None` while inert.
    fn config(&self) -> Option<&Config> {
        None
    }
}
