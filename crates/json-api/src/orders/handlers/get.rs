//! Get Order Handler

use std::sync::Arc;

use salvo::{oapi::extract::PathParam, prelude::*};
use uuid::Uuid;

use crate::{
    extensions::*,
    orders::{errors::into_status_error, models::OrderResponse},
    state::State,
};

/// Get Order Handler
///
/// Visible to the buyer and to the owner of the selling market.
#[endpoint(
    tags("orders"),
    summary = "Get Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Order with items"),
        (status_code = StatusCode::FORBIDDEN, description = "Not a participant"),
        (status_code = StatusCode::NOT_FOUND, description = "Order not found"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
pub(crate) async fn handler(
    order: PathParam<Uuid>,
    depot: &mut Depot,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_uuid_or_401()?;

    let order = state
        .app
        .orders
        .get_order(actor, order.into_inner().into())
        .await
        .map_err(into_status_error)?;

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use bazaar_app::domain::orders::{
        MockOrdersService, OrdersServiceError, models::OrderUuid, status::OrderStatus,
    };

    use crate::test_helpers::{TEST_USER_UUID, make_order, orders_service};

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        orders_service(orders, Router::with_path("orders/{order}").get(handler))
    }

    #[tokio::test]
    async fn test_get_returns_order_with_items() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_get_order()
            .once()
            .withf(move |actor, order| *actor == TEST_USER_UUID && *order == uuid)
            .return_once(move |_, _| Ok(make_order(uuid, OrderStatus::Pending)));

        let response: OrderResponse = TestClient::get(format!("http://example.com/orders/{uuid}"))
            .send(&make_service(orders))
            .await
            .take_json()
            .await?;

        assert_eq!(response.uuid, uuid.into_uuid());
        assert_eq!(response.subtotal, "40.00");
        assert_eq!(response.tax_amount, "4.00");
        assert_eq!(response.shipping_amount, "10.00");
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].unit_price, "20.00");

        Ok(())
    }

    #[tokio::test]
    async fn test_get_non_participant_returns_403() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_get_order()
            .once()
            .return_once(|_, _| Err(OrdersServiceError::Unauthorized));

        let res = TestClient::get(format!("http://example.com/orders/{uuid}"))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::FORBIDDEN));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_missing_order_returns_404() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_get_order()
            .once()
            .return_once(|_, _| Err(OrdersServiceError::NotFound));

        let res = TestClient::get(format!("http://example.com/orders/{uuid}"))
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NOT_FOUND));

        Ok(())
    }
}
