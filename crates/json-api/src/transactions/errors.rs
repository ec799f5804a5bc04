//! Errors

use salvo::http::StatusError;
use tracing::{error, warn};

use bazaar_app::domain::transactions::TransactionsServiceError;

use crate::errors::validation_error;

pub(crate) fn into_status_error(error: TransactionsServiceError) -> StatusError {
    match error {
        TransactionsServiceError::NotFound => {
            StatusError::not_found().brief("Transaction not found")
        }
        TransactionsServiceError::UnknownHash(hash) => StatusError::not_found()
            .brief("Transaction not found")
            .detail(format!("no transaction with hash {hash}")),
        TransactionsServiceError::AlreadyExists => {
            StatusError::conflict().brief("Transaction hash already recorded")
        }
        TransactionsServiceError::Unauthorized => StatusError::forbidden(),
        TransactionsServiceError::InvalidStateTransition {
            transaction,
            current,
            action,
        } => StatusError::unprocessable_entity()
            .brief("Invalid state transition")
            .detail(format!(
                "cannot {action} transaction {transaction} while it is {current}"
            )),
        TransactionsServiceError::Validation(errors) => validation_error(&errors),
        TransactionsServiceError::InvalidSignature => {
            StatusError::unauthorized().brief("Invalid webhook signature")
        }
        TransactionsServiceError::ExternalServiceFailure(source) => {
            warn!("chain service failure: {source}");

            StatusError::bad_gateway().brief("Chain service unavailable")
        }
        TransactionsServiceError::InvalidReference | TransactionsServiceError::InvalidData => {
            StatusError::bad_request().brief("Invalid transaction payload")
        }
        TransactionsServiceError::Sql(source) => {
            error!("transaction storage error: {source}");

            StatusError::internal_server_error()
        }
    }
}
