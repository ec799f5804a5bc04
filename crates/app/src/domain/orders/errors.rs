//! Orders service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{
    domain::{
        orders::{
            models::OrderUuid,
            status::{OrderAction, OrderStatus},
        },
        stock::StockError,
    },
    validation::ValidationErrors,
};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("not permitted to act on this order")]
    Unauthorized,

    #[error("cannot {action} order {order} while it is {current}")]
    InvalidStateTransition {
        order: OrderUuid,
        current: OrderStatus,
        action: OrderAction,
    },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("stock ledger error")]
    Stock(#[from] StockError),

    #[error("related resource not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for OrdersServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation | ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::UniqueViolation | ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}
