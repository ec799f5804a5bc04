//! Sync Transaction Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    observability::record_settlement,
    state::State,
    transactions::{errors::into_status_error, models::TransactionResponse},
};

/// Sync Transaction Handler
///
/// Asks the chain service how far the entry's transfer got and applies the
/// answer. Unknown or still-unconfirmed signatures leave the entry as is.
#[endpoint(
    tags("transactions"),
    summary = "Sync Transaction with Chain",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Current state of the entry"),
        (status_code = StatusCode::NOT_FOUND, description = "Transaction not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Entry has no transaction hash"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Chain service unavailable"),
    ),
)]
#[tracing::instrument(
    name = "transactions.sync",
    skip(transaction, depot),
    fields(
        user_uuid = tracing::field::Empty,
        transaction_uuid = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    transaction: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<TransactionResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;
    let transaction = transaction.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));
    span.record("transaction_uuid", tracing::field::display(transaction));

    let result = state
        .app
        .transactions
        .sync_transaction(user, transaction.into())
        .await;

    record_settlement("sync", result.is_ok());

    Ok(Json(result.map_err(into_status_error)?.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use bazaar_app::{
        chain::ChainError,
        domain::transactions::{
            MockTransactionsService, TransactionsServiceError,
            models::{TransactionType, TransactionUuid},
            status::TransactionStatus,
        },
    };

    use crate::test_helpers::{TEST_USER_UUID, make_transaction, transactions_service};

    use super::*;

    fn make_service(transactions: MockTransactionsService) -> Service {
        transactions_service(
            transactions,
            Router::with_path("transactions/{transaction}/sync").post(handler),
        )
    }

    #[tokio::test]
    async fn test_sync_returns_settled_entry() -> TestResult {
        let uuid = TransactionUuid::new();

        let mut transactions = MockTransactionsService::new();

        transactions
            .expect_sync_transaction()
            .once()
            .withf(move |user, transaction| *user == TEST_USER_UUID && *transaction == uuid)
            .return_once(move |_, _| {
                Ok(make_transaction(
                    uuid,
                    TransactionType::Funding,
                    TransactionStatus::Confirmed,
                ))
            });

        let response: TransactionResponse =
            TestClient::post(format!("http://example.com/transactions/{uuid}/sync"))
                .send(&make_service(transactions))
                .await
                .take_json()
                .await?;

        assert_eq!(response.status, "confirmed");

        Ok(())
    }

    #[tokio::test]
    async fn test_sync_chain_outage_returns_502() -> TestResult {
        let uuid = TransactionUuid::new();

        let mut transactions = MockTransactionsService::new();

        transactions.expect_sync_transaction().once().return_once(|_, _| {
            Err(TransactionsServiceError::ExternalServiceFailure(
                ChainError::UnexpectedResponse("500 Internal Server Error".to_string()),
            ))
        });

        let res = TestClient::post(format!("http://example.com/transactions/{uuid}/sync"))
            .send(&make_service(transactions))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::BAD_GATEWAY));

        Ok(())
    }
}
