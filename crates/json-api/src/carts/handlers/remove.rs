//! Remove Cart Item Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{carts::errors::into_status_error, extensions::*, state::State};

/// Remove Cart Item Handler
#[endpoint(
    tags("cart"),
    summary = "Remove Item from Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Cart item removed"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart item not found"),
        (status_code = StatusCode::FORBIDDEN, description = "Cart item belongs to another buyer"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.remove_item",
    skip(item, depot),
    fields(
        user_uuid = tracing::field::Empty,
        cart_item_uuid = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    item: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.user_uuid_or_401()?;
    let item = item.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(buyer));
    span.record("cart_item_uuid", tracing::field::display(item));

    state
        .app
        .carts
        .remove_item(buyer, item.into())
        .await
        .map_err(into_status_error)?;

    Ok(StatusCode::NO_CONTENT)
}
