//! Add Cart Item Handler

use std::sync::Arc;

use salvo::{
    http::header::LOCATION,
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::domain::carts::models::{CartItemUuid, NewCartItem};

use crate::{
    carts::{errors::into_status_error, models::CartItemResponse},
    extensions::*,
    state::State,
};

/// Add Cart Item Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct AddCartItemRequest {
    /// Client chosen line id; generated when absent
    #[serde(default)]
    pub uuid: Option<Uuid>,

    pub product_uuid: Uuid,

    pub quantity: i64,
}

impl From<AddCartItemRequest> for NewCartItem {
    fn from(request: AddCartItemRequest) -> Self {
        NewCartItem {
            uuid: request.uuid.map_or_else(CartItemUuid::new, Into::into),
            product_uuid: request.product_uuid.into(),
            quantity: request.quantity,
        }
    }
}

/// Add Cart Item Handler
///
/// Adding a product already in the cart increases that line's quantity.
#[endpoint(
    tags("cart"),
    summary = "Add Item to Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Cart item stored"),
        (status_code = StatusCode::NOT_FOUND, description = "Product not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid quantity, unavailable product or insufficient stock"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.add_item",
    skip(json, depot, res),
    fields(
        user_uuid = tracing::field::Empty,
        product_uuid = tracing::field::Empty,
        quantity = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<AddCartItemRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CartItemResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.user_uuid_or_401()?;
    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(buyer));
    span.record("product_uuid", tracing::field::display(request.product_uuid));
    span.record("quantity", request.quantity);

    let item = state
        .app
        .carts
        .add_item(buyer, request.into())
        .await
        .map_err(into_status_error)?;

    res.add_header(LOCATION, format!("/cart/items/{}", item.uuid), true)
        .or_500("failed to set location header")?
        .status_code(StatusCode::CREATED);

    Ok(Json(item.into()))
}
