//! Order Action Handlers
//!
//! Body-less lifecycle transitions. Which party may run each one, and from
//! which status, is enforced by the orders service.

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use bazaar_app::domain::{
    orders::{
        OrdersServiceError,
        models::{Order, OrderUuid},
        status::OrderAction,
    },
    users::models::UserUuid,
};

use crate::{
    extensions::*,
    observability::record_order_action,
    orders::{errors::into_status_error, models::OrderResponse},
    state::State,
};

/// Transitions that carry no request body.
#[derive(Debug, Clone, Copy)]
enum Transition {
    Confirm,
    Process,
    Deliver,
    Complete,
    Cancel,
    Refund,
}

impl Transition {
    fn action(self) -> OrderAction {
        match self {
            Self::Confirm => OrderAction::Confirm,
            Self::Process => OrderAction::Process,
            Self::Deliver => OrderAction::Deliver,
            Self::Complete => OrderAction::Complete,
            Self::Cancel => OrderAction::Cancel,
            Self::Refund => OrderAction::Refund,
        }
    }
}

async fn run(
    depot: &Depot,
    order: Uuid,
    transition: Transition,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_uuid_or_401()?;
    let action = transition.action();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(actor));
    span.record("order_uuid", tracing::field::display(order));

    let result = apply(state, actor, order.into(), transition).await;

    record_order_action(action.as_str(), result.is_ok());

    let order = result.map_err(into_status_error)?;

    tracing::info!(
        order_uuid = %order.uuid,
        action = action.as_str(),
        status = order.status.as_str(),
        "order updated"
    );

    Ok(Json(order.into()))
}

async fn apply(
    state: &State,
    actor: UserUuid,
    order: OrderUuid,
    transition: Transition,
) -> Result<Order, OrdersServiceError> {
    let orders = &state.app.orders;

    match transition {
        Transition::Confirm => orders.confirm(actor, order).await,
        Transition::Process => orders.process(actor, order).await,
        Transition::Deliver => orders.deliver(actor, order).await,
        Transition::Complete => orders.complete(actor, order).await,
        Transition::Cancel => orders.cancel(actor, order).await,
        Transition::Refund => orders.refund(actor, order).await,
    }
}

/// Confirm Order Handler
///
/// Seller accepts a pending order.
#[endpoint(
    tags("orders"),
    summary = "Confirm Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order confirmed"),
        (status_code = StatusCode::FORBIDDEN, description = "Only the seller may confirm"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Order is not pending"),
    ),
)]
#[tracing::instrument(
    name = "orders.confirm",
    skip(order, depot),
    fields(user_uuid = tracing::field::Empty, order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn confirm(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    run(depot, order.into_inner(), Transition::Confirm).await
}

/// Process Order Handler
#[endpoint(
    tags("orders"),
    summary = "Start Processing Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order processing"),
        (status_code = StatusCode::FORBIDDEN, description = "Only the seller may process"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Order is not confirmed"),
    ),
)]
#[tracing::instrument(
    name = "orders.process",
    skip(order, depot),
    fields(user_uuid = tracing::field::Empty, order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn process(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    run(depot, order.into_inner(), Transition::Process).await
}

/// Deliver Order Handler
#[endpoint(
    tags("orders"),
    summary = "Mark Order Delivered",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order delivered"),
        (status_code = StatusCode::FORBIDDEN, description = "Not a participant"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Order is not shipped"),
    ),
)]
#[tracing::instrument(
    name = "orders.deliver",
    skip(order, depot),
    fields(user_uuid = tracing::field::Empty, order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn deliver(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    run(depot, order.into_inner(), Transition::Deliver).await
}

/// Complete Order Handler
///
/// Buyer closes a delivered order.
#[endpoint(
    tags("orders"),
    summary = "Complete Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order completed"),
        (status_code = StatusCode::FORBIDDEN, description = "Only the buyer may complete"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Order is not delivered"),
    ),
)]
#[tracing::instrument(
    name = "orders.complete",
    skip(order, depot),
    fields(user_uuid = tracing::field::Empty, order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn complete(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    run(depot, order.into_inner(), Transition::Complete).await
}

/// Cancel Order Handler
///
/// Returns every line's quantity to stock.
#[endpoint(
    tags("orders"),
    summary = "Cancel Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order cancelled"),
        (status_code = StatusCode::FORBIDDEN, description = "Not a participant"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Order can no longer be cancelled"),
    ),
)]
#[tracing::instrument(
    name = "orders.cancel",
    skip(order, depot),
    fields(user_uuid = tracing::field::Empty, order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn cancel(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    run(depot, order.into_inner(), Transition::Cancel).await
}

/// Refund Order Handler
///
/// Seller refunds a paid order; a pending refund entry is booked for the buyer.
#[endpoint(
    tags("orders"),
    summary = "Refund Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order refunded"),
        (status_code = StatusCode::FORBIDDEN, description = "Only the seller may refund"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Order is not paid or already closed"),
    ),
)]
#[tracing::instrument(
    name = "orders.refund",
    skip(order, depot),
    fields(user_uuid = tracing::field::Empty, order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn refund(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    run(depot, order.into_inner(), Transition::Refund).await
}
