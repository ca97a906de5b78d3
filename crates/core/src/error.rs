//! Failures the catalog rules can produce.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic catalog failure.
///
/// Storage and transport problems are reported by the layers that own them;
/// everything here is caused by the request or the current record state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input that no record could be built from (unparseable price, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A record would end up in a state the catalog forbids.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Text that does not parse as a record identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("not found")]
    NotFound,

    /// The stored record moved past the version the caller edited.
    #[error("conflict: {0}")]
    Conflict(String),

    /// A transfer asked for more units than the article has in stock.
    #[error("insufficient stock (requested {requested}, available {available})")]
    InsufficientStock { requested: u32, available: u32 },
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn insufficient_stock(requested: u32, available: u32) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }
}
