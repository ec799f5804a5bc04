//! Cancel Transaction Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    state::State,
    transactions::{errors::into_status_error, models::TransactionResponse},
};

/// Cancel Transaction Handler
///
/// Withdraws a pending or processing entry.
#[endpoint(
    tags("transactions"),
    summary = "Cancel Transaction",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Transaction cancelled"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the owner"),
        (status_code = StatusCode::NOT_FOUND, description = "Transaction not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Transaction already settled"),
    ),
)]
#[tracing::instrument(
    name = "transactions.cancel",
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

    let transaction = state
        .app
        .transactions
        .cancel_transaction(user, transaction.into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(transaction.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use bazaar_app::domain::transactions::{
        MockTransactionsService, TransactionsServiceError,
        models::{TransactionType, TransactionUuid},
        status::TransactionStatus,
    };

    use crate::test_helpers::{TEST_USER_UUID, make_transaction, transactions_service};

    use super::*;

    fn make_service(transactions: MockTransactionsService) -> Service {
        transactions_service(
            transactions,
            Router::with_path("transactions/{transaction}/cancel").patch(handler),
        )
    }

    #[tokio::test]
    async fn test_cancel_returns_cancelled_entry() -> TestResult {
        let uuid = TransactionUuid::new();

        let mut transactions = MockTransactionsService::new();

        transactions
            .expect_cancel_transaction()
            .once()
            .withf(move |user, transaction| *user == TEST_USER_UUID && *transaction == uuid)
            .return_once(move |_, _| {
                Ok(make_transaction(
                    uuid,
                    TransactionType::Withdrawal,
                    TransactionStatus::Cancelled,
                ))
            });

        let response: TransactionResponse =
            TestClient::patch(format!("http://example.com/transactions/{uuid}/cancel"))
                .send(&make_service(transactions))
                .await
                .take_json()
                .await?;

        assert_eq!(response.status, "cancelled");

        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_missing_entry_returns_404() -> TestResult {
        let uuid = TransactionUuid::new();

        let mut transactions = MockTransactionsService::new();

        transactions
            .expect_cancel_transaction()
            .once()
            .return_once(|_, _| Err(TransactionsServiceError::NotFound));

        let res = TestClient::patch(format!("http://example.com/transactions/{uuid}/cancel"))
            .send(&make_service(transactions))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
