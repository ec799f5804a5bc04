//! Checkout errors.

use sqlx::{
    Error,
    error::{DatabaseError, ErrorKind},
};
use thiserror::Error;

use crate::{
    domain::{markets::models::MarketUuid, products::models::ProductUuid, stock::StockError},
    validation::ValidationErrors,
};

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error(
        "insufficient stock for product {product}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product: ProductUuid,
        requested: i32,
        available: i32,
    },

    #[error("product {0} is not available")]
    ProductUnavailable(ProductUuid),

    #[error("product {product} is not sold by market {market}")]
    ProductOutsideMarket {
        product: ProductUuid,
        market: MarketUuid,
    },

    #[error("no free order number after {attempts} attempts")]
    OrderNumberExhausted { attempts: usize },

    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error("related resource not found")]
    InvalidReference,

    #[error("invalid data")]
    InvalidData,

    #[error("storage error")]
    Sql(#[source] Error),
}

impl From<Error> for CheckoutError {
    fn from(error: Error) -> Self {
        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::ForeignKeyViolation) => Self::InvalidReference,
            Some(ErrorKind::NotNullViolation | ErrorKind::CheckViolation) => Self::InvalidData,
            Some(ErrorKind::UniqueViolation | ErrorKind::Other | _) | None => Self::Sql(error),
        }
    }
}

impl From<StockError> for CheckoutError {
    fn from(error: StockError) -> Self {
        match error {
            StockError::InsufficientStock {
                product,
                requested,
                available,
            } => Self::InsufficientStock {
                product,
                requested,
                available,
            },
            StockError::NotFound(product) => Self::ProductUnavailable(product),
            StockError::InvalidQuantity(_) => Self::InvalidData,
            StockError::Sql(source) => Self::Sql(source),
        }
    }
}
