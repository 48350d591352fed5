use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("persistence worker timed out after {0:?}")]
    Timeout(std::time::Duration),
}
