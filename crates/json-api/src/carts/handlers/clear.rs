//! Clear Cart Handler

use std::sync::Arc;

use salvo::prelude::*;

use crate::{carts::errors::into_status_error, extensions::*, state::State};

/// Clear Cart Handler
///
/// Removes every line from the caller's cart. Clearing an empty cart
/// succeeds.
#[endpoint(
    tags("cart"),
    summary = "Clear Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::NO_CONTENT, description = "Cart emptied"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.clear",
    skip(depot),
    fields(user_uuid = tracing::field::Empty, removed = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(depot: &mut Depot) -> Result<StatusCode, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.user_uuid_or_401()?;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(buyer));

    let removed = state
        .app
        .carts
        .clear(buyer)
        .await
        .map_err(into_status_error)?;

    span.record("removed", removed);

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use salvo::test::TestClient;
    use testresult::TestResult;

    use bazaar_app::domain::carts::MockCartsService;

    use crate::test_helpers::{TEST_USER_UUID, carts_service};

    use super::*;

    fn make_service(carts: MockCartsService) -> Service {
        carts_service(carts, Router::with_path("cart/clear").delete(handler))
    }

    #[tokio::test]
    async fn test_clear_returns_204() -> TestResult {
        let mut carts = MockCartsService::new();

        carts
            .expect_clear()
            .once()
            .withf(|buyer| *buyer == TEST_USER_UUID)
            .return_once(|_| Ok(2));

        let res = TestClient::delete("http://example.com/cart/clear")
            .send(&make_service(carts))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::NO_CONTENT));

        Ok(())
    }
}
