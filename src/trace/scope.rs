use std::cell::RefCell;

use super::Span;

thread_local! {
    static ACTIVE_SPANS: RefCell<Vec<Span>> = RefCell::new(Vec::new());
}

/// Handle to the thread's active-span stack.
///
/// The innermost activated span is what [`active`] returns and what new
/// spans adopt as their parent. Activation is per thread; callers moving
/// work across threads re-activate on the target thread.
///
/// [`active`]: Scope::active
#[derive(Clone, Copy, Debug, Default)]
pub struct Scope {
    _private: (),
}

impl Scope {
    /// Create a scope handle.
    pub fn new() -> Scope {
        Scope::default()
    }

    /// The currently active span on this thread, if any.
    pub fn active(&self) -> Option<Span> {
        ACTIVE_SPANS.with(|spans| spans.borrow().last().cloned())
    }

    /// Make `span` active until the returned guard is dropped.
    pub fn attach(&self, span: &Span) -> ScopeGuard {
        ACTIVE_SPANS.with(|spans| spans.borrow_mut().push(span.clone()));
        ScopeGuard { _private: () }
    }

    /// Run `f` with `span` active, restoring the previous active span after.
    pub fn activate<T>(&self, span: &Span, f: impl FnOnce() -> T) -> T {
        let _guard = self.attach(span);
        f()
    }
}

/// Deactivates the span it was created for when dropped.
#[derive(Debug)]
#[must_use = "dropping the guard immediately deactivates the span"]
pub struct ScopeGuard {
    _private: (),
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        ACTIVE_SPANS.with(|spans| {
            spans.borrow_mut().pop();
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{Span, SpanContext, SpanId, TraceId};

    fn span(trace_id: u64) -> Span {
        Span::start(
            "scope.test",
            SpanContext::new(TraceId::from_u64(trace_id), SpanId::from_u64(1), None),
            "svc",
            "res",
            false,
        )
    }

    #[test]
    fn no_span_is_active_by_default() {
        assert!(Scope::new().active().is_none());
    }

    #[test]
    fn activation_nests_and_restores() {
        let scope = Scope::new();
        let outer = span(1);
        let inner = span(2);

        scope.activate(&outer, || {
            assert_eq!(
                scope.active().map(|s| s.context().trace_id()),
                Some(TraceId::from_u64(1))
            );
            scope.activate(&inner, || {
                assert_eq!(
                    scope.active().map(|s| s.context().trace_id()),
                    Some(TraceId::from_u64(2))
                );
            });
            assert_eq!(
                scope.active().map(|s| s.context().trace_id()),
                Some(TraceId::from_u64(1))
            );
        });

        assert!(scope.active().is_none());
    }

    #[test]
    fn guard_restores_on_drop() {
        let scope = Scope::new();
        let outer = span(7);
        {
            let _guard = scope.attach(&outer);
            assert!(scope.active().is_some());
        }
        assert!(scope.active().is_none());
    }
}
