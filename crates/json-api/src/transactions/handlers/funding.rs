//! Create Funding Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use bazaar_app::domain::transactions::models::NewFunding;

use crate::{
    extensions::*,
    state::State,
    transactions::{errors::into_status_error, models::TransactionResponse},
};

/// Create Funding Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateFundingRequest {
    /// Decimal amount, e.g. `"12.50"`
    pub amount: String,

    /// `SOL`, `USDC` or `TOKEN`
    pub currency: String,

    pub transaction_hash: String,
    pub from_wallet: String,
    pub to_wallet: String,

    #[serde(default)]
    pub blockchain_signature: Option<String>,

    #[serde(default)]
    pub description: Option<String>,
}

impl From<CreateFundingRequest> for NewFunding {
    fn from(request: CreateFundingRequest) -> Self {
        NewFunding {
            amount: request.amount,
            currency: request.currency,
            transaction_hash: request.transaction_hash,
            from_wallet: request.from_wallet,
            to_wallet: request.to_wallet,
            blockchain_signature: request.blockchain_signature,
            description: request.description,
        }
    }
}

/// Create Funding Handler
///
/// Records an incoming transfer. The chain service is consulted straight
/// away, so the entry may already be confirmed in the response.
#[endpoint(
    tags("transactions"),
    summary = "Record Funding",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Funding recorded"),
        (status_code = StatusCode::CONFLICT, description = "Transaction hash already recorded"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid amount, currency or wallet"),
        (status_code = StatusCode::BAD_GATEWAY, description = "Chain service unavailable"),
    ),
)]
#[tracing::instrument(
    name = "transactions.funding",
    skip(json, depot, res),
    fields(
        user_uuid = tracing::field::Empty,
        transaction_uuid = tracing::field::Empty,
        status = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateFundingRequest>,
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
        .create_funding(user, json.into_inner().into())
        .await
        .map_err(into_status_error)?;

    span.record("transaction_uuid", tracing::field::display(transaction.uuid));
    span.record("status", transaction.status.as_str());

    res.add_header(LOCATION, format!("/transactions/{}", transaction.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(transaction.into()))
}
