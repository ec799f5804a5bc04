//! Blockchain Settlement Webhook Handler

use std::sync::Arc;

use salvo::{oapi::ToSchema, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::transactions::models::WebhookPayload;

use crate::{
    extensions::*,
    observability::record_settlement,
    state::State,
    transactions::errors::into_status_error,
};

/// Settlement report pushed by the chain service. Missing fields arrive
/// empty and are rejected by validation.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BlockchainWebhookRequest {
    #[serde(default)]
    pub transaction_hash: String,

    /// `confirmed` or `failed`
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub gas_fee: Option<String>,

    #[serde(default)]
    pub block_number: Option<i64>,

    /// Hex HMAC-SHA256 over `transaction_hash:status:gas_fee:block_number`
    #[serde(default)]
    pub signature: String,
}

impl From<BlockchainWebhookRequest> for WebhookPayload {
    fn from(request: BlockchainWebhookRequest) -> Self {
        WebhookPayload {
            transaction_hash: request.transaction_hash,
            status: request.status,
            gas_fee: request.gas_fee,
            block_number: request.block_number,
            signature: request.signature,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct BlockchainWebhookResponse {
    pub transaction_uuid: Uuid,
    pub status: String,

    /// False when the entry was already settled and nothing changed
    pub applied: bool,
}

/// Blockchain Settlement Webhook Handler
#[endpoint(
    tags("webhooks"),
    summary = "Blockchain Settlement Webhook",
    request_body = BlockchainWebhookRequest,
    responses(
        (status_code = StatusCode::OK, description = "Report accepted"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Signature mismatch"),
        (status_code = StatusCode::NOT_FOUND, description = "No transaction with that hash"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Malformed report"),
    ),
)]
#[tracing::instrument(
    name = "webhooks.blockchain",
    skip(req, depot),
    fields(
        transaction_hash = tracing::field::Empty,
        reported_status = tracing::field::Empty,
        applied = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    req: &mut Request,
    depot: &mut Depot,
) -> Result<Json<BlockchainWebhookResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;

    let request = req
        .parse_json::<BlockchainWebhookRequest>()
        .await
        .map_err(|error| {
            StatusError::unprocessable_entity()
                .brief("Malformed report")
                .detail(error.to_string())
        })?;

    let span = tracing::Span::current();

    span.record("transaction_hash", request.transaction_hash.as_str());
    span.record("reported_status", request.status.as_str());

    let result = state.app.transactions.handle_webhook(request.into()).await;

    record_settlement("webhook", result.is_ok());

    let receipt = result.map_err(into_status_error)?;

    span.record("applied", receipt.applied);

    Ok(Json(BlockchainWebhookResponse {
        transaction_uuid: receipt.transaction.uuid.into(),
        status: receipt.transaction.status.as_str().to_string(),
        applied: receipt.applied,
    }))
}
