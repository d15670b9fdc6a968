use thiserror::Error;

/// Shared error taxonomy for every pipeline stage.
///
/// Each stage crate defines its own local error enum for internal detail
/// and converts into this one at its public boundary, mirroring the error
/// kinds in the design (validation / transient / rate-limited / quota /
/// upstream-malformed / fatal).
#[derive(Error, Debug)]
pub enum GazetteError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("transient I/O error: {0}")]
    TransientIo(String),

    #[error("rate limited, retry after {retry_after_secs:?}s")]
    RateLimited { retry_after_secs: Option<f64> },

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("upstream returned malformed data: {0}")]
    UpstreamMalformed(String),

    #[error("fatal: {0}")]
    Fatal(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl GazetteError {
    /// Whether this error should be retried by re-delivering the message
    /// rather than dead-lettering it.
    pub fn retry_recommended(&self) -> bool {
        matches!(
            self,
            GazetteError::TransientIo(_) | GazetteError::RateLimited { .. }
        )
    }

    /// Whether this error should dead-letter the message immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            GazetteError::Validation(_) | GazetteError::Fatal(_) | GazetteError::QuotaExceeded(_)
        )
    }
}
