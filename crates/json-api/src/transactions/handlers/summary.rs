//! Transaction Summary Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    extensions::*,
    state::State,
    transactions::{errors::into_status_error, models::TransactionSummaryResponse},
};

/// Transaction Summary Handler
///
/// Pending entry count plus confirmed totals per currency.
#[endpoint(
    tags("transactions"),
    summary = "Transaction Summary",
    security(("bearer_auth" = [])),
)]
pub(crate) async fn handler(
    depot: &mut Depot,
) -> Result<Json<TransactionSummaryResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    let summary = state
        .app
        .transactions
        .summary(user)
        .await
        .map_err(into_status_error)?;

    Ok(Json(summary.into()))
}
