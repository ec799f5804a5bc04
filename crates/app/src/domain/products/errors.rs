//! Products service errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

/// Column checks on the `products` table, as named by `PostgreSQL`.
const PRICE_CHECK: &str = "products_price_check";
const STOCK_CHECK: &str = "products_stock_quantity_check";

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product not found")]
    NotFound,

    #[error("a product with this uuid already exists")]
    AlreadyExists,

    #[error("market does not exist")]
    UnknownMarket,

    #[error("price cannot be negative")]
    NegativePrice,

    #[error("stock quantity cannot be negative")]
    NegativeStock,

    #[error("invalid product data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for ProductsServiceError {
    fn from(error: Error) -> Self {
        if matches!(error, Error::RowNotFound) {
            return Self::NotFound;
        }

        let Some(database_error) = error.as_database_error() else {
            return Self::Sql(error);
        };

        match (database_error.kind(), database_error.constraint()) {
            (ErrorKind::UniqueViolation, _) => Self::AlreadyExists,
            (ErrorKind::ForeignKeyViolation, _) => Self::UnknownMarket,
            (ErrorKind::CheckViolation, Some(PRICE_CHECK)) => Self::NegativePrice,
            (ErrorKind::CheckViolation, Some(STOCK_CHECK)) => Self::NegativeStock,
            (ErrorKind::CheckViolation | ErrorKind::NotNullViolation, _) => Self::InvalidData,
            _ => Self::Sql(error),
        }
    }
}
