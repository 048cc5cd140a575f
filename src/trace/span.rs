use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use super::SpanContext;
use crate::log;

struct SpanState {
    name: String,
    service: String,
    resource: String,
    context: SpanContext,
    tags: HashMap<String, String>,
    start: SystemTime,
    end: Option<SystemTime>,
    recording: bool,
}

/// A single unit of work in a trace.
///
/// Clones share state, so a span can be held by the scope and the caller at
/// the same time. A recording span that is dropped without an explicit
/// [`finish`] is finished when its last clone goes away.
///
/// [`finish`]: Span::finish
#[derive(Clone)]
pub struct Span {
    state: Arc<Mutex<SpanState>>,
}

impl Span {
    pub(crate) fn start(
        name: &str,
        context: SpanContext,
        service: &str,
        resource: &str,
        recording: bool,
    ) -> Span {
        Span {
            state: Arc::new(Mutex::new(SpanState {
                name: name.to_string(),
                service: service.to_string(),
                resource: resource.to_string(),
                context,
                tags: HashMap::new(),
                start: SystemTime::now(),
                end: None,
                recording,
            })),
        }
    }

    /// A non-recording span that only carries `context`.
    pub(crate) fn noop(context: SpanContext) -> Span {
        Span::start("", context, "", "", false)
    }

    /// The propagatable part of this span. Stable for the span's lifetime.
    pub fn context(&self) -> SpanContext {
        self.state().context.clone()
    }

    /// The operation name.
    pub fn name(&self) -> String {
        self.state().name.clone()
    }

    /// The resource under measurement.
    pub fn resource(&self) -> String {
        self.state().resource.clone()
    }

    /// The service this span is reported under.
    pub fn service(&self) -> String {
        self.state().service.clone()
    }

    /// Whether this span records tags and is reported on finish.
    pub fn is_recording(&self) -> bool {
        self.state().recording
    }

    /// Set a tag. Non-recording spans ignore tags.
    pub fn set_tag(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut state = self.state();
        if state.recording {
            state.tags.insert(key.into(), value.into());
        }
    }

    /// Read a tag back.
    pub fn tag(&self, key: &str) -> Option<String> {
        self.state().tags.get(key).cloned()
    }

    /// Finish the span now. Subsequent calls are ignored.
    pub fn finish(&self) {
        self.finish_at(SystemTime::now());
    }

    /// Finish the span at the given timestamp. Subsequent calls are ignored.
    pub fn finish_at(&self, timestamp: SystemTime) {
        let mut state = self.state();
        if state.end.is_none() {
            state.end = Some(timestamp);
            report(&state);
        }
    }

    fn state(&self) -> MutexGuard<'_, SpanState> {
        self.state.lock().expect("span state lock poisoned")
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("Span")
            .field("name", &state.name)
            .field("trace_id", &state.context.trace_id())
            .field("span_id", &state.context.span_id())
            .field("recording", &state.recording)
            .finish()
    }
}

fn report(state: &SpanState) {
    if !state.recording {
        return;
    }
    let duration_us = state
        .end
        .and_then(|end| end.duration_since(state.start).ok())
        .unwrap_or_default()
        .as_micros();
    log::debug(format!(
        "finished span name={} service={} resource={} trace_id={} span_id={} duration_us={}",
        state.name,
        state.service,
        state.resource,
        state.context.trace_id(),
        state.context.span_id(),
        duration_us,
    ));
}

impl Drop for SpanState {
    fn drop(&mut self) {
        if self.recording && self.end.is_none() {
            self.end = Some(SystemTime::now());
            report(self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{SpanId, TraceId};

    fn recording_span() -> Span {
        let context = SpanContext::new(TraceId::from_u64(1), SpanId::from_u64(2), None);
        Span::start("test.op", context, "svc", "res", true)
    }

    #[test]
    fn context_is_stable_across_clones() {
        let span = recording_span();
        let clone = span.clone();
        assert_eq!(span.context(), clone.context());
        span.finish();
        assert_eq!(span.context(), clone.context());
    }

    #[test]
    fn recording_span_keeps_tags() {
        let span = recording_span();
        span.set_tag("http.status_code", "200");
        assert_eq!(span.tag("http.status_code").as_deref(), Some("200"));
    }

    #[test]
    fn noop_span_ignores_tags() {
        let span = Span::noop(SpanContext::INVALID);
        span.set_tag("ignored", "yes");
        assert_eq!(span.tag("ignored"), None);
        assert!(!span.is_recording());
    }

    #[test]
    fn finish_is_idempotent() {
        let span = recording_span();
        let early = SystemTime::now();
        span.finish_at(early);
        span.finish();
        assert_eq!(span.state().end, Some(early));
    }
}
