//! Stock ledger errors.

use sqlx::Error;
use thiserror::Error;

use crate::domain::products::models::ProductUuid;

#[derive(Debug, Error)]
pub enum StockError {
    #[error(
        "insufficient stock for product {product}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product: ProductUuid,
        requested: i32,
        available: i32,
    },

    #[error("product {0} not found")]
    NotFound(ProductUuid),

    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(i32),

    #[error("storage error")]
    Sql(#[from] Error),
}
