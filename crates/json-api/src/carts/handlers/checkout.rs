//! Checkout Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};

use bazaar_app::domain::checkout::{
    CheckoutError,
    models::{CheckoutInput, ShippingAddressInput},
};

use crate::{
    carts::errors::checkout_status_error,
    extensions::*,
    observability::{CheckoutOutcome, record_checkout},
    orders::models::{OrderResponse, ShippingAddressBody},
    state::State,
};

/// Checkout Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutRequest {
    #[serde(default)]
    pub shipping_address: ShippingAddressBody,

    #[serde(default)]
    pub shipping_method: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl From<CheckoutRequest> for CheckoutInput {
    fn from(request: CheckoutRequest) -> Self {
        let address = request.shipping_address;

        CheckoutInput {
            shipping_address: ShippingAddressInput {
                street: address.street,
                city: address.city,
                postal_code: address.postal_code,
                country: address.country,
            },
            shipping_method: request.shipping_method,
            notes: request.notes,
        }
    }
}

/// Checkout Response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CheckoutResponse {
    /// One pending order per market in the cart
    pub orders: Vec<OrderResponse>,
}

/// Checkout Handler
///
/// Converts the caller's cart into one order per market. Either every order
/// is placed and the cart emptied, or nothing changes.
#[endpoint(
    tags("cart"),
    summary = "Checkout Cart",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Orders placed"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Empty cart, invalid address, unavailable product or insufficient stock"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "cart.checkout",
    skip(json, depot, res),
    fields(user_uuid = tracing::field::Empty, orders = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CheckoutRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<CheckoutResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.user_uuid_or_401()?;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(buyer));

    let result = state
        .app
        .checkout
        .checkout(buyer, json.into_inner().into())
        .await;

    let orders = match result {
        Ok(orders) => {
            record_checkout(CheckoutOutcome::Placed, orders.len());

            orders
        }
        Err(error) => {
            record_checkout(outcome_of(&error), 0);

            return Err(checkout_status_error(error));
        }
    };

    span.record("orders", orders.len());

    tracing::info!(orders = orders.len(), "checkout completed");

    res.status_code(StatusCode::CREATED);

    Ok(Json(CheckoutResponse {
        orders: orders.into_iter().map(Into::into).collect(),
    }))
}

fn outcome_of(error: &CheckoutError) -> CheckoutOutcome {
    match error {
        CheckoutError::EmptyCart
        | CheckoutError::InsufficientStock { .. }
        | CheckoutError::ProductUnavailable(_)
        | CheckoutError::ProductOutsideMarket { .. }
        | CheckoutError::Validation(_) => CheckoutOutcome::Rejected,
        CheckoutError::OrderNumberExhausted { .. }
        | CheckoutError::InvalidReference
        | CheckoutError::InvalidData
        | CheckoutError::Sql(_) => CheckoutOutcome::Failed,
    }
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use bazaar_app::domain::{
        checkout::MockCheckoutService,
        orders::{models::OrderUuid, status::OrderStatus},
        products::models::ProductUuid,
    };

    use crate::test_helpers::{TEST_USER_UUID, checkout_service, make_order};

    use super::*;

    fn make_service(checkout: MockCheckoutService) -> Service {
        checkout_service(checkout, Router::with_path("cart/checkout").post(handler))
    }

    fn body() -> Value {
        json!({
            "shipping_address": {
                "street": "1 Market St",
                "city": "Lisbon",
                "postal_code": "1000-001",
                "country": "PT"
            },
            "notes": "Ring twice"
        })
    }

    #[tokio::test]
    async fn test_checkout_returns_201_with_orders() -> TestResult {
        let first = OrderUuid::new();
        let second = OrderUuid::new();

        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_checkout()
            .once()
            .withf(|buyer, input| {
                *buyer == TEST_USER_UUID
                    && input.shipping_address.city == "Lisbon"
                    && input.shipping_method.is_none()
                    && input.notes.as_deref() == Some("Ring twice")
            })
            .return_once(move |_, _| {
                Ok(vec![
                    make_order(first, OrderStatus::Pending),
                    make_order(second, OrderStatus::Pending),
                ])
            });

        let mut res = TestClient::post("http://example.com/cart/checkout")
            .json(&body())
            .send(&make_service(checkout))
            .await;

        let response: CheckoutResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(response.orders.len(), 2);
        assert_eq!(response.orders[0].uuid, first.into_uuid());
        assert_eq!(response.orders[0].total_amount, "54.00");
        assert_eq!(response.orders[0].status, "pending");

        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_returns_422() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_checkout()
            .once()
            .return_once(|_, _| Err(CheckoutError::EmptyCart));

        let res = TestClient::post("http://example.com/cart/checkout")
            .json(&body())
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_insufficient_stock_returns_422() -> TestResult {
        let product = ProductUuid::new();

        let mut checkout = MockCheckoutService::new();

        checkout.expect_checkout().once().return_once(move |_, _| {
            Err(CheckoutError::InsufficientStock {
                product,
                requested: 2,
                available: 1,
            })
        });

        let res = TestClient::post("http://example.com/cart/checkout")
            .json(&body())
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_missing_address_fields_reach_validation() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_checkout()
            .once()
            .withf(|_, input| input.shipping_address.street.is_empty())
            .return_once(|_, input| input.validate().map(|_| vec![]).map_err(Into::into));

        let res = TestClient::post("http://example.com/cart/checkout")
            .json(&json!({ "shipping_address": { "city": "Lisbon" } }))
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn test_checkout_without_address_reaches_validation() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_checkout()
            .once()
            .withf(|_, input| input.shipping_address.country.is_empty())
            .return_once(|_, input| input.validate().map(|_| vec![]).map_err(Into::into));

        let res = TestClient::post("http://example.com/cart/checkout")
            .json(&json!({ "notes": "Ring twice" }))
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[test]
    fn storage_failures_are_not_rejections() {
        assert_eq!(outcome_of(&CheckoutError::EmptyCart), CheckoutOutcome::Rejected);
        assert_eq!(
            outcome_of(&CheckoutError::OrderNumberExhausted { attempts: 5 }),
            CheckoutOutcome::Failed
        );
    }
}
