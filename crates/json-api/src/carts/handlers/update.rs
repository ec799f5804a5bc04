//! Update Cart Item Handler

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

use crate::{
    carts::{errors::into_status_error, models::CartItemResponse},
    extensions::*,
    state::State,
};

/// Update Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct UpdateCartItemRequest {
    /// New quantity for the line, at least 1
    #[serde(default)]
    pub quantity: i64,
}

/// Update Cart Item Handler
///
/// Replaces the line's quantity; it is not added to the current one.
#[endpoint(
    tags("cart"),
    summary = "Update Cart Item Quantity",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart item updated"),
        (status_code = StatusCode::FORBIDDEN, description = "Cart item belongs to another buyer"),
        (status_code = StatusCode::NOT_FOUND, description = "Cart item not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid quantity, unavailable product or insufficient stock"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.update_item",
    skip(item, json, depot),
    fields(
        user_uuid = tracing::field::Empty,
        cart_item_uuid = tracing::field::Empty,
        quantity = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    item: PathParam<Uuid>,
    json: JsonBody<UpdateCartItemRequest>,
    depot: &mut Depot,
) -> Result<Json<CartItemResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.user_uuid_or_401()?;
    let item = item.into_inner();
    let quantity = json.into_inner().quantity;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(buyer));
    span.record("cart_item_uuid", tracing::field::display(item));
    span.record("quantity", quantity);

    let updated = state
        .app
        .carts
        .update_item(buyer, item.into(), quantity)
        .await
        .map_err(into_status_error)?;

    Ok(Json(updated.into()))
}
