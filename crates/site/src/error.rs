use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("invalid markdown blob name: {0}")]
    InvalidBlob(String),

    #[error("storage error: {0}")]
    Storage(#[from] gazette_storage::StorageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("hugo exited with status {0}: {1}")]
    BuildFailed(i32, String),

    #[error("hugo timed out after {0}s")]
    BuildTimedOut(u64),

    #[error("output tree validation failed: {0}")]
    InvalidOutput(String),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl SiteError {
    /// Every failure here aborts the whole publish job (§4.H): none of
    /// them represent "try again with different input", only "try again
    /// later or not at all".
    pub fn retry_recommended(&self) -> bool {
        matches!(self, SiteError::Storage(_) | SiteError::Io(_))
    }
}
