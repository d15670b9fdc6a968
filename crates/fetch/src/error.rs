use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("rate limited, retry after {0:?}s")]
    RateLimited(Option<f64>),

    #[error("upstream returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("timeout")]
    Timeout,
}

impl FetchError {
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Request(_) | FetchError::Timeout => true,
            FetchError::RateLimited(_) => true,
            FetchError::UpstreamStatus { status, .. } => *status >= 500 || *status == 429,
        }
    }
}
