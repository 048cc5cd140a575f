//! A safe-by-default distributed-tracing client.
//!
//! Applications hold one [`Tracer`] for the lifetime of the process and use
//! it to create spans, propagate trace context across process boundaries
//! and optionally annotate pages with trace metadata. Until [`Tracer::init`]
//! succeeds the handle is inert: every operation is a side-effect-free
//! no-op, and initialization failures are logged and swallowed rather than
//! surfaced, so instrumented code behaves identically whether tracing is
//! configured or not.
//!
//! # Getting started
//!
//! ```
//! use apm_trace::{Tracer, TracerOptions};
//!
//! let tracer = Tracer::new();
//! tracer.init(
//!     TracerOptions::default()
//!         .with_service("checkout")
//!         .with_env("staging"),
//! );
//!
//! let handled = tracer.trace(
//!     "web.request",
//!     None,
//!     Some(|span: &apm_trace::Span| {
//!         span.set_tag("http.method", "GET");
//!         // ... handle the request ...
//!         "ok"
//!     }),
//! );
//! assert_eq!(handled, Some("ok"));
//! ```
//!
//! # Context propagation
//!
//! Span contexts cross process boundaries through [`Injector`] and
//! [`Extractor`] carriers, typically header maps:
//!
//! ```
//! use std::collections::HashMap;
//! use apm_trace::{SpanOptions, Tracer, TracerOptions};
//!
//! let tracer = Tracer::new();
//! tracer.init(TracerOptions::default());
//!
//! let span = tracer.start_span("http.request", None);
//! let mut headers: HashMap<String, String> = HashMap::new();
//! tracer.inject(&span.context(), &mut headers);
//!
//! // ... on the receiving side ...
//! if let Some(parent) = tracer.extract(&headers) {
//!     let child = tracer.start_span("web.request", Some(SpanOptions::new().child_of(parent)));
//!     child.finish();
//! }
//! span.finish();
//! ```
//!
//! [`Injector`]: propagation::Injector
//! [`Extractor`]: propagation::Extractor

pub mod config;
pub mod error;
pub mod instrument;
pub mod log;
pub mod platform;
pub mod propagation;
pub mod sampling;
pub mod trace;

mod tracer;

pub use config::{Config, TracerOptions};
pub use error::{ConfigError, Error};
pub use instrument::PluginConfig;
pub use log::{LogLevel, LogSink};
pub use sampling::SamplingPriority;
pub use trace::{NoopTracer, Scope, Span, SpanContext, SpanId, SpanOptions, TraceId};
pub use tracer::Tracer;
