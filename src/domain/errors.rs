use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    /// Rejected request. The message is surfaced to the caller as-is.
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("permission denied")]
    PermissionDenied,
    /// The order is already in a terminal status.
    #[error("invalid order status")]
    InvalidOrderStatus,
    /// The requested target status is not a known status.
    #[error("invalid status")]
    InvalidStatus,
    #[error("request cancelled")]
    Cancelled,
    #[error("Internal error: {0}")]
    Internal(String),
}
