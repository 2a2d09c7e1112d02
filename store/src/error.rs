use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store: identity not found: {0}")]
    NotFound(String),

    #[error("store: storage error: {0}")]
    Storage(String),

    #[error("store: serialization error: {0}")]
    Serialization(String),
}
