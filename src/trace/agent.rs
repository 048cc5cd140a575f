//! The functional tracer delegate.

use super::{IdGenerator, Scope, Span, SpanContext, SpanOptions, TraceId, TracerCore};
use crate::config::Config;
use crate::propagation::{AgentPropagator, Extractor, Injector};
use crate::sampling::{RateSampler, SamplingPriority};

/// Tracer built from a validated [`Config`].
///
/// The sampling decision happens once per trace, at root-span creation;
/// child spans inherit the decision through the scope or an explicit parent
/// context.
pub struct AgentTracer {
    config: Config,
    ids: IdGenerator,
    sampler: RateSampler,
    propagator: AgentPropagator,
}

impl AgentTracer {
    /// Build a tracer from a configuration snapshot.
    pub fn new(config: &Config) -> AgentTracer {
        AgentTracer {
            config: config.clone(),
            ids: IdGenerator::default(),
            sampler: RateSampler::new(config.sample_rate),
            propagator: AgentPropagator::new(),
        }
    }
}

impl TracerCore for AgentTracer {
    fn start_span(&self, name: &str, options: &SpanOptions) -> Span {
        let parent = options
            .child_of
            .clone()
            .or_else(|| Scope::new().active().map(|span| span.context()))
            .filter(|context| context.trace_id() != TraceId::INVALID);

        let (trace_id, inherited) = match &parent {
            Some(context) => (context.trace_id(), context.sampling_priority()),
            None => (self.ids.trace_id(), None),
        };
        let priority = inherited.unwrap_or_else(|| {
            if self.sampler.sample(trace_id) {
                SamplingPriority::AutoKeep
            } else {
                SamplingPriority::AutoReject
            }
        });

        let context = SpanContext::new(trace_id, self.ids.span_id(), Some(priority));
        let service = options.service.as_deref().unwrap_or(&self.config.service);
        let resource = options.resource.as_deref().unwrap_or(name);
        let span = Span::start(name, context, service, resource, true);

        if let Some(span_type) = &options.span_type {
            span.set_tag("span.type", span_type);
        }
        for (key, value) in self.config.tags.iter().chain(options.tags.iter()) {
            span.set_tag(key, value);
        }

        span
    }

    fn inject(&self, context: &SpanContext, carrier: &mut dyn Injector) {
        self.propagator.inject(context, carrier);
    }

    fn extract(&self, carrier: &dyn Extractor) -> Option<SpanContext> {
        self.propagator.extract(carrier)
    }

    fn config(&self) -> Option<&Config> {
        Some(&self.config)
    }
}
