//! Confirm Transaction Handler

use std::sync::Arc;

use salvo::{
    oapi::{
        ToSchema,
        extract::{JsonBody, PathParam},
    },
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::transactions::models::ConfirmTransaction;

use crate::{
    extensions::*,
    observability::record_settlement,
    state::State,
    transactions::{errors::into_status_error, models::TransactionResponse},
};

/// Confirm Transaction Request
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct ConfirmTransactionRequest {
    #[serde(default)]
    pub transaction_hash: Option<String>,

    #[serde(default)]
    pub blockchain_signature: Option<String>,

    /// Decimal network fee
    #[serde(default)]
    pub gas_fee: Option<String>,
}

impl From<ConfirmTransactionRequest> for ConfirmTransaction {
    fn from(request: ConfirmTransactionRequest) -> Self {
        ConfirmTransaction {
            transaction_hash: request.transaction_hash,
            blockchain_signature: request.blockchain_signature,
            gas_fee: request.gas_fee,
        }
    }
}

/// Confirm Transaction Handler
///
/// Owner confirmation of a pending entry; confirming a purchase marks its
/// order paid.
#[endpoint(
    tags("transactions"),
    summary = "Confirm Transaction",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Transaction confirmed"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the owner"),
        (status_code = StatusCode::NOT_FOUND, description = "Transaction not found"),
        (status_code = StatusCode::CONFLICT, description = "Transaction hash already recorded"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Transaction is not pending"),
    ),
)]
#[tracing::instrument(
    name = "transactions.confirm",
    skip(transaction, json, depot),
    fields(
        user_uuid = tracing::field::Empty,
        transaction_uuid = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    transaction: PathParam<Uuid>,
    json: JsonBody<ConfirmTransactionRequest>,
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
        .confirm_transaction(user, transaction.into(), json.into_inner().into())
        .await;

    record_settlement("manual", result.is_ok());

    Ok(Json(result.map_err(into_status_error)?.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
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
            Router::with_path("transactions/{transaction}/confirm").patch(handler),
        )
    }

    #[tokio::test]
    async fn test_confirm_forwards_chain_details() -> TestResult {
        let uuid = TransactionUuid::new();

        let mut transactions = MockTransactionsService::new();

        transactions
            .expect_confirm_transaction()
            .once()
            .withf(move |user, transaction, confirmation| {
                *user == TEST_USER_UUID
                    && *transaction == uuid
                    && *confirmation
                        == ConfirmTransaction {
                            transaction_hash: Some("5def".to_string()),
                            blockchain_signature: None,
                            gas_fee: Some("0.000005".to_string()),
                        }
            })
            .return_once(move |_, _, _| {
                Ok(make_transaction(
                    uuid,
                    TransactionType::Purchase,
                    TransactionStatus::Confirmed,
                ))
            });

        let response: TransactionResponse =
            TestClient::patch(format!("http://example.com/transactions/{uuid}/confirm"))
                .json(&json!({ "transaction_hash": "5def", "gas_fee": "0.000005" }))
                .send(&make_service(transactions))
                .await
                .take_json()
                .await?;

        assert_eq!(response.status, "confirmed");

        Ok(())
    }

    #[tokio::test]
    async fn test_confirm_settled_entry_returns_422() -> TestResult {
        let uuid = TransactionUuid::new();

        let mut transactions = MockTransactionsService::new();

        transactions
            .expect_confirm_transaction()
            .once()
            .return_once(move |_, _, _| {
                Err(TransactionsServiceError::InvalidStateTransition {
                    transaction: uuid,
                    current: TransactionStatus::Confirmed,
                    action: "confirm",
                })
            });

        let res = TestClient::patch(format!("http://example.com/transactions/{uuid}/confirm"))
            .json(&json!({}))
            .send(&make_service(transactions))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }
}
