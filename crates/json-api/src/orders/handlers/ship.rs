//! Ship Order Handler

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

use bazaar_app::domain::orders::{models::ShipOrder, status::OrderAction};

use crate::{
    extensions::*,
    observability::record_order_action,
    orders::{errors::into_status_error, models::OrderResponse},
    state::State,
};

/// Ship Order Request
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub(crate) struct ShipOrderRequest {
    /// Carrier reference, stored in the order metadata
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// Ship Order Handler
#[endpoint(
    tags("orders"),
    summary = "Ship Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order shipped"),
        (status_code = StatusCode::FORBIDDEN, description = "Only the seller may ship"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Order is not processing"),
    ),
)]
#[tracing::instrument(
    name = "orders.ship",
    skip(order, json, depot),
    fields(
        user_uuid = tracing::field::Empty,
        order_uuid = tracing::field::Empty,
        tracked = tracing::field::Empty
    ),
    err
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    json: JsonBody<ShipOrderRequest>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_uuid_or_401()?;
    let order = order.into_inner();
    let request = json.into_inner();

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(actor));
    span.record("order_uuid", tracing::field::display(order));
    span.record("tracked", request.tracking_number.is_some());

    let result = state
        .app
        .orders
        .ship(
            actor,
            order.into(),
            ShipOrder {
                tracking_number: request.tracking_number,
            },
        )
        .await;

    record_order_action(OrderAction::Ship.as_str(), result.is_ok());

    Ok(Json(result.map_err(into_status_error)?.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::json;
    use testresult::TestResult;

    use bazaar_app::domain::orders::{
        MockOrdersService, OrdersServiceError,
        models::OrderUuid,
        status::{OrderAction, OrderStatus},
    };

    use crate::test_helpers::{TEST_USER_UUID, make_order, orders_service};

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        orders_service(orders, Router::with_path("orders/{order}/ship").patch(handler))
    }

    #[tokio::test]
    async fn test_ship_records_tracking_number() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_ship()
            .once()
            .withf(move |actor, order, shipment| {
                *actor == TEST_USER_UUID
                    && *order == uuid
                    && shipment.tracking_number.as_deref() == Some("TRK-1")
            })
            .return_once(move |_, _, _| {
                let mut order = make_order(uuid, OrderStatus::Shipped);

                order
                    .metadata
                    .insert("tracking_number".to_string(), json!("TRK-1"));

                Ok(order)
            });

        let response: OrderResponse =
            TestClient::patch(format!("http://example.com/orders/{uuid}/ship"))
                .json(&json!({ "tracking_number": "TRK-1" }))
                .send(&make_service(orders))
                .await
                .take_json()
                .await?;

        assert_eq!(response.status, "shipped");
        assert_eq!(response.metadata["tracking_number"], "TRK-1");

        Ok(())
    }

    #[tokio::test]
    async fn test_ship_from_pending_returns_422() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders.expect_ship().once().return_once(move |_, _, _| {
            Err(OrdersServiceError::InvalidStateTransition {
                order: uuid,
                current: OrderStatus::Pending,
                action: OrderAction::Ship,
            })
        });

        let res = TestClient::patch(format!("http://example.com/orders/{uuid}/ship"))
            .json(&json!({}))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }
}
