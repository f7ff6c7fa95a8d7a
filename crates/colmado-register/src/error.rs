//! # Register Errors
//!
//! The error taxonomy the UI shell sees. Every variant maps to a user-facing
//! message; none of them is fatal to the session — the cart survives every
//! failure path untouched.

use colmado_core::error::{CoreError, ValidationError};
use thiserror::Error;

use crate::services::ServiceError;

// =============================================================================
// Register Error
// =============================================================================

/// Session-layer errors.
#[derive(Debug, Error)]
pub enum RegisterError {
    /// Input failed a local validation rule.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A cart/domain rule was violated.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Another sale commit is still running; the new one was refused.
    #[error("A sale commit is already in progress")]
    CommitInFlight,

    /// The backend answered and said no. The message is the backend's own,
    /// surfaced verbatim.
    #[error("Sale rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached or the call failed in transit.
    #[error("Backend unreachable: {0}")]
    Transport(String),

    /// The backend reported success but assigned no sale id. Treated as a
    /// failed commit: the backend is the single source of truth for sale
    /// identity.
    #[error("Backend accepted the sale but returned no id")]
    MissingSaleId,

    /// The requested product is not in the catalog cache.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The product exists but is inactive (soft-deleted).
    #[error("Product is inactive: {0}")]
    ProductInactive(String),
}

impl From<ServiceError> for RegisterError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Backend(message) => RegisterError::Rejected(message),
            ServiceError::Transport(message) => RegisterError::Transport(message),
        }
    }
}

/// Convenience type alias for Results with RegisterError.
pub type RegisterResult<T> = Result<T, RegisterError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_surfaces_verbatim() {
        let err: RegisterError =
            ServiceError::Backend("insufficient stock for Malta Morena".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Sale rejected: insufficient stock for Malta Morena"
        );
    }

    #[test]
    fn test_core_error_passes_through() {
        let err: RegisterError = CoreError::LineNotFound(3).into();
        assert_eq!(err.to_string(), "No cart line at index 3");
    }
}
