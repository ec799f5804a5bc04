//! Errors

use salvo::http::StatusError;
use tracing::error;

use bazaar_app::domain::{carts::CartsServiceError, checkout::CheckoutError};

use crate::errors::{insufficient_stock, validation_error};

pub(crate) fn into_status_error(error: CartsServiceError) -> StatusError {
    match error {
        CartsServiceError::NotFound => StatusError::not_found().brief("Cart item not found"),
        CartsServiceError::ProductNotFound(product) => StatusError::not_found()
            .brief("Product not found")
            .detail(format!("product {product}")),
        CartsServiceError::ProductUnavailable(product) => product_unavailable(product),
        CartsServiceError::InsufficientStock {
            product,
            requested,
            available,
        } => insufficient_stock(product, requested, available),
        CartsServiceError::Unauthorized => StatusError::forbidden(),
        CartsServiceError::Validation(errors) => validation_error(&errors),
        CartsServiceError::InvalidReference | CartsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid cart payload")
        }
        CartsServiceError::Sql(source) => {
            error!("cart storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}

pub(crate) fn checkout_status_error(error: CheckoutError) -> StatusError {
    match error {
        CheckoutError::EmptyCart => StatusError::unprocessable_entity().brief("Cart is empty"),
        CheckoutError::InsufficientStock {
            product,
            requested,
            available,
        } => insufficient_stock(product, requested, available),
        CheckoutError::ProductUnavailable(product) => product_unavailable(product),
        CheckoutError::ProductOutsideMarket { product, market } => {
            StatusError::unprocessable_entity()
                .brief("Product not sold by this market")
                .detail(format!("product {product} is not sold by market {market}"))
        }
        CheckoutError::Validation(errors) => validation_error(&errors),
        CheckoutError::InvalidReference | CheckoutError::InvalidData => {
            StatusError::bad_request().brief("Invalid checkout payload")
        }
        CheckoutError::OrderNumberExhausted { attempts } => {
            error!(attempts, "could not allocate an order number");

            StatusError::internal_server_error()
        }
        CheckoutError::Sql(source) => {
            error!("checkout storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}

fn product_unavailable(product: impl std::fmt::Display) -> StatusError {
    StatusError::unprocessable_entity()
        .brief("Product unavailable")
        .detail(format!("product {product}"))
}
