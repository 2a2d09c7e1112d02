use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("filestore: not found: {0}")]
    NotFound(String),

    #[error("filestore: io error: {0}")]
    Io(String),
}
