//! The tracer facade.
//!
//! Applications hold one [`Tracer`] for the process lifetime. The facade
//! starts bound to an inert delegate; a successful [`init`] swaps in the
//! functional one. Every public call reads the current delegate and
//! forwards, so instrumented code never has to care whether tracing is
//! configured.
//!
//! [`init`]: Tracer::init

use std::fmt;
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::{Config, TracerOptions};
use crate::error::Error;
use crate::instrument::{Instrumenter, PluginConfig};
use crate::log;
use crate::platform;
use crate::propagation::{Extractor, Injector};
use crate::sampling;
use crate::trace::{AgentTracer, NoopTracer, Scope, Span, SpanContext, SpanOptions, TracerCore};

/// The tracing client facade.
///
/// Safe by default: before a successful [`init`], and whenever
/// initialization fails, every operation forwards to a no-op delegate and
/// nothing panics. Cloning is cheap and clones share the same delegate.
///
/// # Examples
///
/// ```
/// use apm_trace::{Tracer, TracerOptions};
///
/// let tracer = Tracer::new();
/// tracer.init(TracerOptions::default().with_service("billing"));
///
/// let span = tracer.start_span("web.request", None);
/// // ... handle the request ...
/// span.finish();
/// ```
///
/// [`init`]: Tracer::init
#[derive(Clone)]
pub struct Tracer {
    inner: Arc<Inner>,
}

struct Inner {
    delegate: RwLock<Arc<dyn TracerCore>>,
    instrumenter: Instrumenter,
}

impl Tracer {
    /// Create a facade bound to the inert delegate.
    pub fn new() -> Tracer {
        Tracer {
            inner: Arc::new(Inner {
                delegate: RwLock::new(Arc::new(NoopTracer::new())),
                instrumenter: Instrumenter::new(),
            }),
        }
    }

    /// Initialize the tracer from the given options.
    ///
    /// Never fails from the caller's point of view: any error anywhere in
    /// the initialization chain is logged and swallowed, and the facade
    /// stays inert. A call made while the tracer is already active is a
    /// no-op. With `enabled` resolved to `false` the logging and platform
    /// services are configured but the delegate stays inert by design.
    pub fn init(&self, options: TracerOptions) -> &Tracer {
        if !self.is_active() {
            match self.try_init(options) {
                Ok(Some(delegate)) => {
                    *self
                        .inner
                        .delegate
                        .write()
                        .expect("tracer delegate lock poisoned") = delegate;
                }
                Ok(None) => {}
                Err(err) => log::error(format!("tracer initialization failed: {err}")),
            }
        }
        self
    }

    /// Run every initialization step, committing the delegate swap only
    /// after all of them succeed. `Ok(None)` means tracing is disabled by
    /// configuration.
    ///
    /// The profiler is started before the enabled gate and before platform
    /// validation; a failure later in the chain leaves it running.
    fn try_init(&self, options: TracerOptions) -> Result<Option<Arc<dyn TracerCore>>, Error> {
        let config = Config::new(options)?;

        log::use_sink(config.logger.clone());
        log::toggle(config.debug, config.log_level);

        platform::configure(&config)?;
        platform::profiler().start();

        if !config.enabled {
            return Ok(None);
        }

        platform::validate(&config)?;

        if config.runtime_metrics {
            platform::metrics().start();
        }
        if config.analytics {
            sampling::enable_analytics();
        }

        let delegate: Arc<dyn TracerCore> = Arc::new(AgentTracer::new(&config));
        self.inner.instrumenter.enable(&config);
        platform::startup_log(&config, &self.inner.instrumenter.loaded());

        Ok(Some(delegate))
    }

    /// Record configuration for an instrumentation plugin. Returns the
    /// facade for chaining.
    pub fn use_plugin(&self, name: &str, config: PluginConfig) -> &Tracer {
        self.inner.instrumenter.use_plugin(name, config);
        self
    }

    /// Run `f` under a new span, which is active for the duration of the
    /// call and finished afterwards.
    ///
    /// A missing callable degrades to `None` instead of panicking, so
    /// loosely typed call sites stay safe.
    pub fn trace<F, R>(&self, name: &str, options: Option<SpanOptions>, f: Option<F>) -> Option<R>
    where
        F: FnOnce(&Span) -> R,
    {
        let f = f?;
        Some(self.trace_with(name, options.unwrap_or_default(), f))
    }

    /// Wrap `f` so that every invocation runs under a new span.
    ///
    /// A missing callable is returned unchanged (`None`), mirroring
    /// [`trace`]'s degradation.
    ///
    /// [`trace`]: Tracer::trace
    pub fn wrap<F, R>(
        &self,
        name: &str,
        options: Option<SpanOptions>,
        f: Option<F>,
    ) -> Option<impl FnMut() -> R>
    where
        F: FnMut() -> R,
    {
        let mut f = f?;
        let tracer = self.clone();
        let name = name.to_string();
        let options = options.unwrap_or_default();
        Some(move || tracer.trace_with(&name, options.clone(), |_span| f()))
    }

    fn trace_with<F, R>(&self, name: &str, options: SpanOptions, f: F) -> R
    where
        F: FnOnce(&Span) -> R,
    {
        let delegate = self.delegate();
        let span = delegate.start_span(name, &options);
        let result = delegate.scope().activate(&span, || f(&span));
        span.finish();
        result
    }

    /// Start a span. The caller is responsible for finishing it.
    pub fn start_span(&self, name: &str, options: Option<SpanOptions>) -> Span {
        self.delegate()
            .start_span(name, &options.unwrap_or_default())
    }

    /// Write `context` into a carrier for propagation to another process.
    pub fn inject(&self, context: &SpanContext, carrier: &mut dyn Injector) {
        self.delegate().inject(context, carrier)
    }

    /// Read a propagated span context out of a carrier.
    pub fn extract(&self, carrier: &dyn Extractor) -> Option<SpanContext> {
        self.delegate().extract(carrier)
    }

    /// Handle to the active-span scope.
    pub fn scope(&self) -> Scope {
        self.delegate().scope()
    }

    /// Deprecated alias for [`scope`].
    ///
    /// [`scope`]: Tracer::scope
    #[deprecated(note = "use `start_span` and `scope` instead")]
    pub fn scope_manager(&self) -> Scope {
        log::deprecate("scope_manager");
        self.delegate().scope()
    }

    /// Deprecated: the currently active span, as [`scope`]'s `active`.
    ///
    /// [`scope`]: Tracer::scope
    #[deprecated(note = "use `start_span` and `scope` instead")]
    pub fn current_span(&self) -> Option<Span> {
        log::deprecate("current_span");
        self.delegate().current_span()
    }

    /// Deprecated: returns `callback` unchanged; context propagation is
    /// handled by the scope.
    #[deprecated(note = "use `start_span` and `scope` instead")]
    pub fn bind<F>(&self, callback: F) -> F {
        log::deprecate("bind");
        callback
    }

    /// Deprecated: does nothing; emitters need no binding.
    #[deprecated(note = "use `start_span` and `scope` instead")]
    pub fn bind_emitter<T>(&self, _emitter: &T) {
        log::deprecate("bind_emitter");
    }

    /// A markup fragment exposing the active trace id and the current time
    /// for real-user-monitoring correlation.
    ///
    /// Returns the empty string unless the active delegate was configured
    /// with the experimental RUM flag and a span is active. A pure read:
    /// never creates a span.
    pub fn rum_data(&self) -> String {
        let delegate = self.delegate();
        let enabled = delegate
            .config()
            .map_or(false, |config| config.experimental.enable_rum_data);
        if !enabled {
            return String::new();
        }
        let Some(span) = delegate.scope().active() else {
            return String::new();
        };
        let trace_id = span.context().trace_id();
        let trace_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        format!(
            "<meta name=\"apm-trace-id\" content=\"{trace_id}\" />\
             <meta name=\"apm-trace-time\" content=\"{trace_time}\" />"
        )
    }

    fn delegate(&self) -> Arc<dyn TracerCore> {
        self.inner
            .delegate
            .read()
            .expect("tracer delegate lock poisoned")
            .clone()
    }

    fn is_active(&self) -> bool {
        self.delegate().config().is_some()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Tracer::new()
    }
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("active", &self.is_active())
            .finish()
    }
}
