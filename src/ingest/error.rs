use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("event is missing {0}")]
    MissingField(&'static str),

    #[error("not a csv file: {0}")]
    NotCsv(String),

    #[error("tenant {0} not found")]
    TenantNotFound(String),

    #[error("csv missing required column: {0}")]
    MissingColumn(&'static str),

    #[error("registry error: {0}")]
    Store(#[from] crate::error::Error),

    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("invalid object key: {0}")]
    ObjectKey(#[from] object_store::path::Error),

    #[error("csv error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("ingestion task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IngestError {
    /// Events that are ignored on purpose rather than failures.
    #[must_use]
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            IngestError::MissingField(_) | IngestError::NotCsv(_) | IngestError::TenantNotFound(_)
        )
    }
}
