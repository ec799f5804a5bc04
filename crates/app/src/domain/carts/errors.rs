//! Carts service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{domain::products::models::ProductUuid, validation::ValidationErrors};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart item not found")]
    NotFound,

    #[error("product {0} not found")]
    ProductNotFound(ProductUuid),

    #[error("product {0} is not available")]
    ProductUnavailable(ProductUuid),

    #[error(
        "insufficient stock for product {product}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product: ProductUuid,
        requested: i32,
        available: i32,
    },

    #[error("cart item belongs to another buyer")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("related resource not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CartsServiceError {
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
