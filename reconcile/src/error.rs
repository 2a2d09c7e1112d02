use thiserror::Error;

use faceguard_filestore::FileError;
use faceguard_store::StoreError;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("reconcile: {0}")]
    Store(#[from] StoreError),

    #[error("reconcile: {0}")]
    Image(#[from] FileError),
}
