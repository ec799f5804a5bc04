//! Shared HTTP error mapping.

use salvo::http::StatusError;
use tracing::error;

use bazaar_app::{domain::stock::StockError, validation::ValidationErrors};

/// 422 listing every rejected field as `field: message`.
pub(crate) fn validation_error(errors: &ValidationErrors) -> StatusError {
    let detail = errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");

    StatusError::unprocessable_entity()
        .brief("Validation failed")
        .detail(detail)
}

pub(crate) fn insufficient_stock(product: impl ToString, requested: i32, available: i32) -> StatusError {
    StatusError::unprocessable_entity()
        .brief("Insufficient stock")
        .detail(format!(
            "product {}: requested {requested}, available {available}",
            product.to_string()
        ))
}

pub(crate) fn stock_error(error: StockError) -> StatusError {
    match error {
        StockError::InsufficientStock {
            product,
            requested,
            available,
        } => insufficient_stock(product, requested, available),
        StockError::NotFound(product) => StatusError::unprocessable_entity()
            .brief("Product unavailable")
            .detail(format!("product {product}")),
        StockError::InvalidQuantity(quantity) => StatusError::unprocessable_entity()
            .brief("Invalid quantity")
            .detail(format!("quantity {quantity}")),
        StockError::Sql(source) => {
            error!("stock ledger storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
