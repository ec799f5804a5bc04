//! Transaction Index Handler

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};

use bazaar_app::domain::transactions::models::TransactionListQuery;

use crate::{
    extensions::*,
    state::State,
    transactions::{errors::into_status_error, models::TransactionsPageResponse},
};

/// Transaction Index Handler
///
/// The caller's ledger entries, newest first. Filters are optional.
#[endpoint(
    tags("transactions"),
    summary = "List Transactions",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "One page of transactions"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Unknown filter value or bad paging"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "transactions.index",
    skip_all,
    fields(user_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    transaction_type: QueryParam<String, false>,
    status: QueryParam<String, false>,
    currency: QueryParam<String, false>,
    page: QueryParam<i64, false>,
    per_page: QueryParam<i64, false>,
    depot: &mut Depot,
) -> Result<Json<TransactionsPageResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let user = depot.user_uuid_or_401()?;

    tracing::Span::current().record("user_uuid", tracing::field::display(user));

    let query = TransactionListQuery {
        transaction_type: transaction_type.into_inner(),
        status: status.into_inner(),
        currency: currency.into_inner(),
        page: page.into_inner(),
        per_page: per_page.into_inner(),
    };

    let page = state
        .app
        .transactions
        .list_transactions(user, query)
        .await
        .map_err(into_status_error)?;

    Ok(Json(page.into()))
}
