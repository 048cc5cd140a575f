use thiserror::Error;

/// Errors produced while wiring up the tracer.
///
/// [`Tracer::init`] never surfaces these to the caller; they are logged and
/// the facade stays inert. The variants exist so each initialization step can
/// short-circuit with `?`.
///
/// [`Tracer::init`]: crate::Tracer::init
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or contradictory configuration options.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The current environment cannot run the tracer.
    #[error("unsupported platform: {0}")]
    Unsupported(String),

    /// Any uncategorized error.
    #[error("{0}")]
    Other(String),
}

/// Errors raised while building a [`Config`] snapshot.
///
/// Only explicitly passed options produce these; malformed `APM_*`
/// environment values are logged and fall back to defaults instead.
///
/// [`Config`]: crate::config::Config
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// Sample rates must fall within `[0.0, 1.0]`.
    #[error("sample rate {0} is outside the range [0.0, 1.0]")]
    InvalidSampleRate(f64),

    /// The agent endpoint could not be parsed as a URL.
    #[error("invalid agent url: {0}")]
    InvalidAgentUrl(#[from] url::ParseError),

    /// An unrecognized log level name.
    #[error("unknown log level: {0}")]
    UnknownLogLevel(String),

    /// A tag entry that is not of the form `key:value`.
    #[error("malformed tag entry: {0}")]
    MalformedTag(String),

    /// The flush interval cannot be zero.
    #[error("flush interval must be non-zero")]
    ZeroFlushInterval,
}
