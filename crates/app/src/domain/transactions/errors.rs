//! Transactions service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{
    chain::ChainError,
    domain::transactions::{models::TransactionUuid, status::TransactionStatus},
    validation::ValidationErrors,
};

#[derive(Debug, Error)]
pub enum TransactionsServiceError {
    #[error("transaction not found")]
    NotFound,

    #[error("no transaction with hash {0}")]
    UnknownHash(String),

    #[error("transaction hash already recorded")]
    AlreadyExists,

    #[error("not permitted to act on this transaction")]
    Unauthorized,

    #[error("cannot {action} transaction {transaction} while it is {current}")]
    InvalidStateTransition {
        transaction: TransactionUuid,
        current: TransactionStatus,
        action: &'static str,
    },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("webhook signature mismatch")]
    InvalidSignature,

    #[error("chain service unavailable")]
    ExternalServiceFailure(#[source] ChainError),

    #[error("related resource not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for TransactionsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists,
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation | ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
