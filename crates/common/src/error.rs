use thiserror::Error;

/// Boxed source error carried by [`TapError::Format`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Canonical error taxonomy used across taps crates.
///
/// Classification guidance:
/// - [`TapError::InvalidConfig`]: scheme/tap setup problems detected before any IO
/// - [`TapError::NotFound`]: a path or wildcard expression that resolves to nothing
/// - [`TapError::TypeMismatch`]: a tuple field holds a value of the wrong kind
/// - [`TapError::InvalidRecord`]: a structured record violates its descriptor
/// - [`TapError::Format`]: decode/encode failures from the storage format libraries
/// - [`TapError::Io`]: raw filesystem IO failures from std APIs
#[derive(Debug, Error)]
pub enum TapError {
    /// Invalid or incomplete scheme/tap configuration.
    ///
    /// Examples:
    /// - sinking through a parquet scheme without a record type
    /// - a filter predicate naming an unknown column
    /// - malformed wildcard syntax
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Path expression matched no file.
    #[error("File not found: {0}")]
    NotFound(String),

    /// A field value did not have the kind the scheme expects.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A structured record is inconsistent with its descriptor (e.g. unset required field).
    #[error("invalid record: {0}")]
    InvalidRecord(String),

    /// Decode/encode failure reported by an underlying format library.
    #[error("format error: {context}: {source}")]
    Format {
        context: String,
        #[source]
        source: BoxError,
    },

    /// Transparent std IO failures.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Valid request for a feature this version does not implement.
    #[error("unsupported: {0}")]
    Unsupported(String),
}

impl TapError {
    /// Wraps a library error, keeping it reachable through `source()`.
    pub fn format(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Format {
            context: context.into(),
            source: source.into(),
        }
    }
}

/// Standard taps result alias.
pub type Result<T> = std::result::Result<T, TapError>;
