//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::{ExpenseId, MemberId};

/// Domain errors represent ledger rule violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("invalid weight in expense {expense}: {reason}")]
    InvalidWeight { expense: ExpenseId, reason: String },

    #[error("unknown member: {0}")]
    UnknownMember(MemberId),

    #[error("ledger is unbalanced: balances sum to {residual:e}")]
    UnbalancedLedger { residual: f64 },

    #[error("expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    #[error("invalid expense: {message}")]
    InvalidExpense { message: String },

    #[error("invalid member: {message}")]
    InvalidMember { message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
