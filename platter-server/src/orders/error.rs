use thiserror::Error;

use crate::db::StoreError;
use crate::resilience::Transient;

/// Order service errors
#[derive(Debug, Error)]
pub enum OrderError {
    /// Structural violations; every violation is listed
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("Order not found: {0}")]
    NotFound(String),

    /// Operation not allowed in the order's current state
    #[error("{0}")]
    Invariant(String),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),
}

impl OrderError {
    pub fn validation(message: impl Into<String>) -> Self {
        OrderError::Validation(vec![message.into()])
    }
}

/// Store errors reaching the service have already spent their retry budget,
/// so nothing at this level is retried again.
impl Transient for OrderError {
    fn is_transient(&self) -> bool {
        false
    }
}

pub type OrderResult<T> = Result<T, OrderError>;
