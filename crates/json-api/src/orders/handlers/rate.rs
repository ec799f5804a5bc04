//! Rate Order Handler

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

use bazaar_app::domain::orders::{models::RateOrder, status::OrderAction};

use crate::{
    extensions::*,
    observability::record_order_action,
    orders::{errors::into_status_error, models::OrderResponse},
    state::State,
};

/// Rate Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct RateOrderRequest {
    /// Whole stars, 1 to 5
    pub rating: i64,

    #[serde(default)]
    pub review: Option<String>,
}

impl From<RateOrderRequest> for RateOrder {
    fn from(request: RateOrderRequest) -> Self {
        RateOrder {
            rating: request.rating,
            review: request.review,
        }
    }
}

/// Rate Order Handler
///
/// The buyer may rate a completed order once.
#[endpoint(
    tags("orders"),
    summary = "Rate Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Rating stored"),
        (status_code = StatusCode::FORBIDDEN, description = "Only the buyer may rate"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Not completed, already rated or rating out of range"),
    ),
)]
#[tracing::instrument(
    name = "orders.rate",
    skip(order, json, depot),
    fields(
        user_uuid = tracing::field::Empty,
        order_uuid = tracing::field::Empty,
        rating = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<RateOrderRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_uuid_or_401()?;
    let order = order.into_inner();
    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(actor));
    span.record("order_uuid", tracing::field::display(order));
    span.record("rating", request.rating);

    let result = state
        .app
        .orders
        .rate(actor, order.into(), request.into())
        .await;

    record_order_action(OrderAction::Rate.as_str(), result.is_ok());

    Ok(Json(result.map_err(into_status_error)?.into()))
}
