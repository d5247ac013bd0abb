//! Unified error types for the ledger engine.
//!
//! Every public operation returns [`Result`]. Callers branch on [`Error::kind`]
//! and render [`Error::messages`]; nothing crosses the public boundary as a panic.

use crate::core::validation::ValidationErrors;
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Broad classification of an [`Error`], used by callers to decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; the caller can correct the request and resubmit.
    Validation,
    /// A referenced record does not exist (usually stale caller state).
    Referential,
    /// The atomic commit was rejected by the store; safe to retry with the same request id.
    Conflict,
    /// A post-hoc audit found ledger state that contradicts the movement log.
    Invariant,
    /// Configuration, I/O or unexpected database failure.
    Infrastructure,
}

/// Application error type.
#[derive(Debug, Error)]
pub enum Error {
    /// One or more field-tagged business-rule violations.
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),

    /// A guarded account decrement found less than the required balance.
    #[error("Insufficient funds in account '{account}': required {required}")]
    InsufficientFunds {
        /// Account identifier
        account: String,
        /// Amount the commit tried to withdraw
        required: i64,
    },

    /// A sale asked for more units than the product has in stock.
    #[error("Insufficient stock for product '{product}': requested {requested}")]
    InsufficientStock {
        /// Product identifier
        product: String,
        /// Units requested
        requested: i64,
    },

    /// A payment larger than what is owed.
    #[error("Payment of {requested} exceeds outstanding debt of {outstanding}")]
    PaymentExceedsDebt {
        /// Debt outstanding when the payment was planned
        outstanding: i64,
        /// Payment amount
        requested: i64,
    },

    /// A referenced record does not exist.
    #[error("{entity} '{id}' not found")]
    NotFound {
        /// Kind of record (e.g. "client", "sale")
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// The store refused the atomic commit.
    #[error("Commit conflict: {message}")]
    CommitConflict {
        /// Store-provided reason
        message: String,
    },

    /// Audit detected state that does not match the movement log.
    #[error("Ledger invariant violated: {}", violations.join("; "))]
    InvariantViolation {
        /// One line per mismatch
        violations: Vec<String>,
    },

    /// Configuration could not be loaded or parsed.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Database error that is not a commit conflict.
    #[error("Database error: {0}")]
    Database(DbErr),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classifies the error for the caller.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_)
            | Self::InsufficientFunds { .. }
            | Self::InsufficientStock { .. }
            | Self::PaymentExceedsDebt { .. } => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::Referential,
            Self::CommitConflict { .. } => ErrorKind::Conflict,
            Self::InvariantViolation { .. } => ErrorKind::Invariant,
            Self::Config { .. } | Self::Database(_) | Self::Io(_) => ErrorKind::Infrastructure,
        }
    }

    /// Human-readable messages, one per violation where the error carries several.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::Validation(errors) => errors.iter().map(ToString::to_string).collect(),
            Self::InvariantViolation { violations } => violations.clone(),
            other => vec![other.to_string()],
        }
    }

    /// Whether resubmitting the identical request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conflict)
    }

    /// Shorthand for a [`Error::NotFound`].
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<DbErr> for Error {
    fn from(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(message)) => Self::CommitConflict { message },
            _ if is_busy(&err) => Self::CommitConflict {
                message: err.to_string(),
            },
            _ => Self::Database(err),
        }
    }
}

// SQLite reports writer contention as SQLITE_BUSY / "database is locked".
fn is_busy(err: &DbErr) -> bool {
    let text = err.to_string();
    text.contains("database is locked") || text.contains("SQLITE_BUSY")
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
