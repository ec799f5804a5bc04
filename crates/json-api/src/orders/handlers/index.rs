//! Order Listing Handlers

use std::sync::Arc;

use salvo::{oapi::extract::QueryParam, prelude::*};

use bazaar_app::domain::orders::models::{OrderListQuery, OrderScope};

use crate::{
    extensions::*,
    orders::{errors::into_status_error, models::OrdersPageResponse},
    state::State,
};

async fn list(
    depot: &Depot,
    scope: OrderScope,
    query: OrderListQuery,
) -> Result<Json<OrdersPageResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let actor = depot.user_uuid_or_401()?;

    tracing::Span::current().record("user_uuid", tracing::field::display(actor));

    let page = state
        .app
        .orders
        .list_orders(actor, scope, query)
        .await
        .map_err(into_status_error)?;

    Ok(Json(page.into()))
}

/// My Orders Handler
///
/// Orders the caller placed, newest first.
#[endpoint(
    tags("orders"),
    summary = "List Orders Placed",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "One page of orders"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Unknown status filter or bad paging"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.buying",
    skip(status, page, per_page, depot),
    fields(user_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn buying(
    status: QueryParam<String, false>,
    page: QueryParam<i64, false>,
    per_page: QueryParam<i64, false>,
    depot: &mut Depot,
) -> Result<Json<OrdersPageResponse>, StatusError> {
    let query = OrderListQuery {
        status: status.into_inner(),
        page: page.into_inner(),
        per_page: per_page.into_inner(),
    };

    list(depot, OrderScope::Buying, query).await
}

/// Market Orders Handler
///
/// Orders placed with markets the caller owns, newest first.
#[endpoint(
    tags("orders"),
    summary = "List Orders Received",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "One page of orders"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Unknown status filter or bad paging"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.selling",
    skip(status, page, per_page, depot),
    fields(user_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn selling(
    status: QueryParam<String, false>,
    page: QueryParam<i64, false>,
    per_page: QueryParam<i64, false>,
    depot: &mut Depot,
) -> Result<Json<OrdersPageResponse>, StatusError> {
    let query = OrderListQuery {
        status: status.into_inner(),
        page: page.into_inner(),
        per_page: per_page.into_inner(),
    };

    list(depot, OrderScope::Selling, query).await
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use bazaar_app::{
        domain::{
            orders::{MockOrdersService, OrdersServiceError, models::OrderUuid, status::OrderStatus},
            pagination::Page,
        },
        validation::ValidationErrors,
    };

    use crate::test_helpers::{TEST_USER_UUID, make_order, orders_service};

    use super::*;

    fn make_service(orders: MockOrdersService) -> Service {
        orders_service(
            orders,
            Router::new()
                .push(Router::with_path("my-orders").get(buying))
                .push(Router::with_path("market-orders").get(selling)),
        )
    }

    #[tokio::test]
    async fn test_my_orders_forwards_filters() -> TestResult {
        let uuid = OrderUuid::new();

        let mut orders = MockOrdersService::new();

        orders
            .expect_list_orders()
            .once()
            .withf(|actor, scope, query| {
                *actor == TEST_USER_UUID
                    && *scope == OrderScope::Buying
                    && *query
                        == OrderListQuery {
                            status: Some("shipped".to_string()),
                            page: Some(2),
                            per_page: Some(5),
                        }
            })
            .return_once(move |_, _, _| {
                Ok(Page {
                    items: vec![make_order(uuid, OrderStatus::Shipped)],
                    total: 6,
                    page: 2,
                    per_page: 5,
                })
            });

        let response: OrdersPageResponse =
            TestClient::get("http://example.com/my-orders?status=shipped&page=2&per_page=5")
                .send(&make_service(orders))
                .await
                .take_json()
                .await?;

        assert_eq!(response.orders.len(), 1);
        assert_eq!(response.orders[0].status, "shipped");
        assert_eq!(response.meta.total, 6);
        assert_eq!(response.meta.last_page, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_market_orders_uses_selling_scope() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders
            .expect_list_orders()
            .once()
            .withf(|_, scope, query| *scope == OrderScope::Selling && query.status.is_none())
            .return_once(|_, _, _| {
                Ok(Page {
                    items: vec![],
                    total: 0,
                    page: 1,
                    per_page: 15,
                })
            });

        let response: OrdersPageResponse = TestClient::get("http://example.com/market-orders")
            .send(&make_service(orders))
            .await
            .take_json()
            .await?;

        assert!(response.orders.is_empty());
        assert_eq!(response.meta.last_page, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_status_filter_returns_422() -> TestResult {
        let mut orders = MockOrdersService::new();

        orders.expect_list_orders().once().return_once(|_, _, _| {
            Err(OrdersServiceError::Validation(ValidationErrors::single(
                "status",
                "unknown status",
            )))
        });

        let res = TestClient::get("http://example.com/my-orders?status=lost")
            .send(&make_service(orders))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }
}
