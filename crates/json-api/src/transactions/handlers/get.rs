//! Get Transaction Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    state::State,
    transactions::{errors::into_status_error, models::TransactionResponse},
};

/// Get Transaction Handler
#[endpoint(
    tags("transactions"),
    summary = "Get Transaction",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Ledger entry"),
        (status_code = StatusCode::FORBIDDEN, description = "Not the owner or the market owner"),
        (status_code = StatusCode::NOT_FOUND, description = "Transaction not found"),
    ),
)]
pub(crate) async fn handler(
    transaction: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<TransactionResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let transaction = state
        .app
        .transactions
        .get_transaction(user, transaction.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(transaction.into()))
}
