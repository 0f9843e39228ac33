//! The error type shared by every ledger operation.
//!
//! Variants follow the API error taxonomy: entities that are absent or not
//! owned by the caller surface as [`NotFound`], malformed input as
//! [`InvalidArgument`], uniqueness violations and blocked deletions as
//! [`Conflict`], and cap violations as [`BudgetExceeded`].
//!
//! [`NotFound`]: LedgerError::NotFound
//! [`InvalidArgument`]: LedgerError::InvalidArgument
//! [`Conflict`]: LedgerError::Conflict
//! [`BudgetExceeded`]: LedgerError::BudgetExceeded
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("budget exceeded: {0}")]
    BudgetExceeded(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::InvalidArgument(a), Self::InvalidArgument(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::BudgetExceeded(a), Self::BudgetExceeded(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
