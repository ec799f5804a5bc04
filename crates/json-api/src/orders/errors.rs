//! Errors

use salvo::http::StatusError;
use tracing::error;

use bazaar_app::domain::orders::OrdersServiceError;

use crate::errors::{stock_error, validation_error};

pub(crate) fn into_status_error(error: OrdersServiceError) -> StatusError {
    match error {
        OrdersServiceError::NotFound => StatusError::not_found().brief("Order not found"),
        OrdersServiceError::Unauthorized => StatusError::forbidden(),
        OrdersServiceError::InvalidStateTransition {
            order,
            current,
            action,
        } => StatusError::unprocessable_entity()
            .brief("Invalid state transition")
            .detail(format!("cannot {action} order {order} while it is {current}")),
        OrdersServiceError::Validation(errors) => validation_error(&errors),
        OrdersServiceError::Stock(source) => stock_error(source),
        OrdersServiceError::InvalidReference | OrdersServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid order payload")
        }
        OrdersServiceError::Sql(source) => {
            error!("order storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
