use thiserror::Error;

use crate::db::StoreError;

/// Startup and serving failures
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Store initialization failed: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
