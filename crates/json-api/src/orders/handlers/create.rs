//! Create Order Handler

use std::sync::Arc;

use salvo::{
    oapi::{ToSchema, extract::JsonBody},
    prelude::*,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use bazaar_app::{
    domain::{
        checkout::models::{CheckoutInput, NewOrderInput, NewOrderLine, ShippingAddressInput},
        markets::models::MarketUuid,
        products::models::ProductUuid,
    },
    validation::ValidationErrors,
};

use crate::{
    carts::errors::checkout_status_error,
    errors::validation_error,
    extensions::*,
    observability::record_direct_order,
    orders::models::{OrderResponse, ShippingAddressBody},
    state::State,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOrderItem {
    pub product_uuid: Uuid,

    /// At least 1
    pub quantity: i64,
}

/// Create Order Request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub(crate) struct CreateOrderRequest {
    /// Market selling every item
    #[serde(default)]
    pub market_uuid: Option<Uuid>,

    #[serde(default)]
    pub items: Vec<CreateOrderItem>,

    #[serde(default)]
    pub shipping_address: ShippingAddressBody,

    #[serde(default)]
    pub shipping_method: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl CreateOrderRequest {
    fn into_input(self) -> Result<NewOrderInput, ValidationErrors> {
        let market = self
            .market_uuid
            .ok_or_else(|| ValidationErrors::single("market_uuid", "is required"))?;

        let address = self.shipping_address;

        Ok(NewOrderInput {
            market_uuid: MarketUuid::from_uuid(market),
            items: self
                .items
                .into_iter()
                .map(|item| NewOrderLine {
                    product_uuid: ProductUuid::from_uuid(item.product_uuid),
                    quantity: item.quantity,
                })
                .collect(),
            delivery: CheckoutInput {
                shipping_address: ShippingAddressInput {
                    street: address.street,
                    city: address.city,
                    postal_code: address.postal_code,
                    country: address.country,
                },
                shipping_method: self.shipping_method,
                notes: self.notes,
            },
        })
    }
}

/// Create Order Handler
///
/// Places one pending order with a single market from explicit lines. The
/// caller's cart is left untouched.
#[endpoint(
    tags("orders"),
    summary = "Create Order",
    security(("bearer_auth" = [])),
    responses(
        (status_code = StatusCode::CREATED, description = "Order placed"),
        (status_code = StatusCode::UNPROCESSABLE_ENTITY, description = "Invalid lines or address, product outside the market, unavailable product or insufficient stock"),
        (status_code = StatusCode::INTERNAL_SERVER_ERROR, description = "Internal Server Error"),
    ),
)]
#[tracing::instrument(
    name = "orders.create",
    skip(json, depot, res),
    fields(user_uuid = tracing::field::Empty, order_uuid = tracing::field::Empty),
    err
)]
pub(crate) async fn handler(
    json: JsonBody<CreateOrderRequest>,
    depot: &mut Depot,
    res: &mut Response,
) -> Result<Json<OrderResponse>, StatusError> {
    let state = depot.obtain_or_500::<Arc<State>>()?;
    let buyer = depot.user_uuid_or_401()?;

    let span = tracing::Span::current();

    span.record("user_uuid", tracing::field::display(buyer));

    let input = json
        .into_inner()
        .into_input()
        .map_err(|errors| validation_error(&errors))?;

    let order = state
        .app
        .checkout
        .create_order(buyer, input)
        .await
        .map_err(checkout_status_error)?;

    record_direct_order();

    span.record("order_uuid", tracing::field::display(order.uuid));

    res.status_code(StatusCode::CREATED);

    Ok(Json(order.into()))
}

#[cfg(test)]
mod tests {
    use salvo::test::{ResponseExt, TestClient};
    use serde_json::{Value, json};
    use testresult::TestResult;

    use bazaar_app::domain::{
        checkout::{CheckoutError, MockCheckoutService},
        orders::{models::OrderUuid, status::OrderStatus},
    };

    use crate::test_helpers::{TEST_USER_UUID, checkout_service, make_order};

    use super::*;

    fn make_service(checkout: MockCheckoutService) -> Service {
        checkout_service(checkout, Router::with_path("orders").post(handler))
    }

    fn body(market: Uuid, product: Uuid) -> Value {
        json!({
            "market_uuid": market,
            "items": [{ "product_uuid": product, "quantity": 2 }],
            "shipping_address": {
                "street": "1 Market St",
                "city": "Lisbon",
                "postal_code": "1000-001",
                "country": "PT"
            }
        })
    }

    #[tokio::test]
    async fn test_create_order_returns_201() -> TestResult {
        let market = Uuid::now_v7();
        let product = Uuid::now_v7();
        let order = OrderUuid::new();

        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_create_order()
            .once()
            .withf(move |buyer, input| {
                *buyer == TEST_USER_UUID
                    && input.market_uuid == MarketUuid::from_uuid(market)
                    && input.items
                        == [NewOrderLine {
                            product_uuid: ProductUuid::from_uuid(product),
                            quantity: 2,
                        }]
                    && input.delivery.shipping_address.city == "Lisbon"
            })
            .return_once(move |_, _| Ok(make_order(order, OrderStatus::Pending)));

        let mut res = TestClient::post("http://example.com/orders")
            .json(&body(market, product))
            .send(&make_service(checkout))
            .await;

        let response: OrderResponse = res.take_json().await?;

        assert_eq!(res.status_code, Some(StatusCode::CREATED));
        assert_eq!(response.uuid, order.into_uuid());
        assert_eq!(response.status, "pending");
        assert_eq!(response.total_amount, "54.00");

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_without_market_returns_422() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout.expect_create_order().never();

        let res = TestClient::post("http://example.com/orders")
            .json(&json!({ "items": [{ "product_uuid": Uuid::now_v7(), "quantity": 1 }] }))
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_product_from_other_market_returns_422() -> TestResult {
        let market = Uuid::now_v7();
        let product = Uuid::now_v7();

        let mut checkout = MockCheckoutService::new();

        checkout.expect_create_order().once().return_once(move |_, _| {
            Err(CheckoutError::ProductOutsideMarket {
                product: ProductUuid::from_uuid(product),
                market: MarketUuid::from_uuid(market),
            })
        });

        let res = TestClient::post("http://example.com/orders")
            .json(&body(market, product))
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_order_zero_quantity_reaches_validation() -> TestResult {
        let mut checkout = MockCheckoutService::new();

        checkout
            .expect_create_order()
            .once()
            .withf(|_, input| input.items.first().is_some_and(|item| item.quantity == 0))
            .return_once(|_, input| {
                input
                    .validate()
                    .map(|_| make_order(OrderUuid::new(), OrderStatus::Pending))
                    .map_err(Into::into)
            });

        let res = TestClient::post("http://example.com/orders")
            .json(&json!({
                "market_uuid": Uuid::now_v7(),
                "items": [{ "product_uuid": Uuid::now_v7(), "quantity": 0 }],
                "shipping_address": {
                    "street": "1 Market St",
                    "city": "Lisbon",
                    "postal_code": "1000-001",
                    "country": "PT"
                }
            }))
            .send(&make_service(checkout))
            .await;

        assert_eq!(res.status_code, Some(StatusCode::UNPROCESSABLE_ENTITY));

        Ok(())
    }
}
