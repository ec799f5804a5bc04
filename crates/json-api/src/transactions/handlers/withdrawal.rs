//! Create Withdrawal Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use bazaar_app::domain::transactions::models::NewWithdrawal;

use crate::{
    extensions::*,
    state::State,
    transactions::{errors::into_status_error, models::TransactionResponse},
};

/// Create Withdrawal Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateWithdrawalRequest {
    pub amount: String,
    pub currency: String,
    pub to_wallet: String,

    #[serde(default)]
    pub description: Option<String>,
}

impl From<CreateWithdrawalRequest> for NewWithdrawal {
    fn from(request: CreateWithdrawalRequest) -> Self {
        NewWithdrawal {
            amount: request.amount,
            currency: request.currency,
            to_wallet: request.to_wallet,
            description: request.description,
        }
    }
}

/// Create Withdrawal Handler
///
/// Records a pending transfer out of the caller's wallet.
#[endpoint(
    tags("transactions"),
    summary = "Request Withdrawal",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Withdrawal recorded"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid amount, currency or wallet"),
    ),
)]
#[tracing::instrument(
    name = "transactions.withdrawal",
    skip(json, depot, res),
    fields(user_uuid = tracing::field::Empty, transaction_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateWithdrawalRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<TransactionResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(user));

    let transaction = state
        .app
        .transactions
        .create_withdrawal(user, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    span.record("transaction_uuid", tracing::field::display(transaction.uuid));

    res.add_header(LOCATION, format!("/transactions/{}", transaction.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(transaction.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use bazaar_app::{
        domain::transactions::{
            MockTransactionsService, TransactionsServiceError,
            models::{TransactionType, TransactionUuid},
            status::TransactionStatus,
        },
        validation::{FieldError, ValidationErrors},
    };

    use crate::test_helpers::{TEST_USER_UUID, make_transaction, transactions_service};

    use super::*;

    fn make_service(transactions: MockTransactionsService) -> Service {
        transactions_service(
            transactions,
            Router::with_path("transactions/withdrawal").post(handler),
        )
    }

    #[tokio::test]
    async fn test_withdrawal_is_pending() -> TestResult {
        let uuid = TransactionUuid::new();

        let mut transactions = MockTransactionsService::new();

        transactions
            .expect_create_withdrawal()
            .once()
            .withf(|user, withdrawal| {
                *user == TEST_USER_UUID && withdrawal.amount == "5" && withdrawal.to_wallet == "WalletC"
            })
            .return_once(move |_, _| {
                Ok(make_transaction(
                    uuid,
                    TransactionType::Withdrawal,
                    TransactionStatus::Pending,
                ))
            });

        let mut res = TestClient::post("http://example.com/transactions/withdrawal")
            .json(&json!({ "amount": "5", "currency": "SOL", "to_wallet": "WalletC" }))
            .send(&make_service(transactions))
            .await;

        let response: TransactionResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(response.transaction_type, "withdrawal");
        assert_eq!(response.status, "pending");

        Ok(())
    }

    #[tokio::test]
    async fn test_invalid_withdrawal_returns_422() -> TestResult {
        let mut transactions = MockTransactionsService::new();

        transactions.expect_create_withdrawal().once().return_once(|_, _| {
            let mut errors = ValidationErrors::single("amount", "must be greater than zero");
            errors.push(FieldError::new("currency", "must be one of SOL, USDC, TOKEN"));

            Err(TransactionsServiceError::Validation(errors))
        });

        let res = TestClient::post("http://example.com/transactions/withdrawal")
            .json(&json!({ "amount": "0", "currency": "EUR", "to_wallet": "WalletC" }))
            .send(&make_service(transactions))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }
}
