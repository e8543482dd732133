use thiserror::Error;

/// Errors a store gateway may surface.
///
/// Gateways translate backend-specific failures into this set at their
/// boundary; callers never inspect backend error text.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The addressed row or document does not exist.
    #[error("record not found: {0}")]
    NotFound(String),

    /// The call exceeded its deadline and was abandoned.
    #[error("store call exceeded its deadline")]
    DeadlineExceeded,

    /// The backend rejected or failed the call.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be decoded.
    #[error("stored document is malformed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
