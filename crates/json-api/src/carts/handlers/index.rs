//! Cart Index Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{
    carts::{errors::into_status_error, models::CartResponse},
    extensions::*,
    state::State,
};

/// Cart Index Handler
///
/// Returns the caller's cart, oldest line first.
#[endpoint(
    tags("cart"),
    summary = "Get Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::OK, description = "Cart contents"),
        (status_code = StatusCode::UNAUTHORIZED, description = "Unauthorized"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.index",
    skip(depot),
    fields(user_uuid = tracing::field::Empty, items = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<Json<CartResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.user_uuid_or_401()?;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(buyer));

    let items = state
        .app
        .carts
        .list_items(buyer)
        .await
        .map_err(into_status_error)?;

    span.record("items", items.len());

    Ok(Json(items.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use testresult::TestResult;

    use bazaar_app::domain::carts::{MockCartsService, models::CartItemUuid};

    use crate::test_helpers::{TEST_USER_UUID, carts_service, make_cart_item};

    use super::*;

    fn make_service(carts: MockCartsService) -> Service {
        carts_service(carts, Router::with_path("cart").get(handler))
    }

    #[tokio::test]
    async fn test_index_returns_items_and_subtotal() -> TestResult {
        let first = CartItemUuid::new();
        let second = CartItemUuid::new();

        let mut carts = MockCartsService::new();

        carts
            .expect_list_items()
            .once()
            .withf(|buyer| *buyer == TEST_USER_UUID)
            .return_once(move |_| Ok(vec![make_cart_item(first, 2), make_cart_item(second, 1)]));
        carts.expect_add_item().never();
        carts.expect_remove_item().never();

        let response: CartResponse = TestClient::get("http://example.com/cart")
            .send(&make_service(carts))
            .await
            .take_json()
            .await?;

        assert_eq!(response.items.len(), 2);
        assert_eq!(response.items[0].uuid, first.into_uuid());
        assert_eq!(response.items[0].line_total, "40.00");
        assert_eq!(response.subtotal, "60.00");

        Ok(())
    }

    #[tokio::test]
    async fn test_index_empty_cart() -> TestResult {
        let mut carts = MockCartsService::new();

        carts
            .expect_list_items()
            .once()
            .return_once(|_| Ok(vec![]));
        carts.expect_add_item().never();
        carts.expect_remove_item().never();

        let response: CartResponse = TestClient::get("http://example.com/cart")
            .send(&make_service(carts))
            .await
            .take_json()
            .await?;

        assert!(response.items.is_empty());
        assert_eq!(response.subtotal, "0");

        Ok(())
    }
}
