use thiserror::Error;

use faceguard_filestore::FileError;
use faceguard_store::StoreError;

#[derive(Error, Debug)]
pub enum EnrollError {
    #[error("enroll: identity already exists: {0}")]
    DuplicateIdentity(String),

    #[error("enroll: unknown identity: {0}")]
    UnknownIdentity(String),

    #[error("enroll: insufficient valid images: required {required}, found {found}")]
    InsufficientValidImages { required: usize, found: usize },

    #[error("enroll: {0}")]
    Store(#[from] StoreError),

    #[error("enroll: {0}")]
    Image(#[from] FileError),
}
